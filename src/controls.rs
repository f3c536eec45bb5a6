//! Operator key bindings.
//!
//! The torque keys follow the usual RCS layout: W/S pitch about X, A/D yaw
//! about Y, Q/E roll about Z. The first key of each pair is the positive,
//! counter-clockwise direction.

use attitude_link::TorqueDirection;
use bevy::prelude::*;

use crate::link::OperatorCommand;

const TORQUE_KEYS: [(KeyCode, TorqueDirection); 6] = [
    (KeyCode::KeyW, TorqueDirection::XCounterClockwise),
    (KeyCode::KeyS, TorqueDirection::XClockwise),
    (KeyCode::KeyA, TorqueDirection::YCounterClockwise),
    (KeyCode::KeyD, TorqueDirection::YClockwise),
    (KeyCode::KeyQ, TorqueDirection::ZCounterClockwise),
    (KeyCode::KeyE, TorqueDirection::ZClockwise),
];

#[derive(Default)]
pub struct ControlsPlugin;

impl Plugin for ControlsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, keys_to_commands);
    }
}

fn keys_to_commands(kb: Res<ButtonInput<KeyCode>>, mut commands: MessageWriter<OperatorCommand>) {
    if kb.just_pressed(KeyCode::Enter) {
        commands.write(OperatorCommand::StartDemo);
    }
    if kb.just_pressed(KeyCode::Space) {
        commands.write(OperatorCommand::StartStepping);
    }
    if kb.just_pressed(KeyCode::Backspace) {
        commands.write(OperatorCommand::StopStepping);
    }
    if kb.just_pressed(KeyCode::KeyN) {
        commands.write(OperatorCommand::ReadSensors);
    }

    // One impulse per press. Holding a key does not repeat.
    for (key, direction) in TORQUE_KEYS {
        if kb.just_pressed(key) {
            commands.write(OperatorCommand::IssueTorque(direction));
        }
    }
}
