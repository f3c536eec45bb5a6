//! The basic UI.
//!
//! The canvas is drawn with gizmos under a plain 2d camera. Status text sits
//! in the top left, telemetry in the bottom left.

use std::io::Write;

use attitude_link::{Canvas, PollerState, ScreenPoint, Session};
use bevy::prelude::*;

#[derive(Component)]
pub struct StatusText;

#[derive(Component)]
pub struct InfoText;

#[derive(Default)]
pub struct UIPlugin;

impl Plugin for UIPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::WHITE));
        app.add_systems(Startup, setup_ui);
        app.add_systems(Update, (draw_canvas, update_status, update_info));
    }
}

fn setup_ui(mut commands: Commands) {
    commands.spawn((Camera2d::default(), Name::new("Canvas Camera")));

    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(Color::BLACK),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(5.0),
            left: Val::Px(5.0),
            ..default()
        },
        Name::new("Status Text"),
        StatusText,
    ));

    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::BLACK),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(5.0),
            left: Val::Px(5.0),
            ..default()
        },
        Name::new("Info Text"),
        InfoText,
    ));
}

/// Canvas pixels have the origin top-left and Y down; the 2d camera has the
/// origin in the middle and Y up.
fn canvas_to_world(canvas: &Canvas, p: ScreenPoint) -> Vec2 {
    let (width, height) = attitude_link::Surface::size(canvas);
    Vec2::new((p.x - width / 2.0) as f32, (height / 2.0 - p.y) as f32)
}

fn draw_canvas(mut gizmos: Gizmos, canvas: Res<Canvas>) {
    let [r, g, b] = canvas.style().stroke;
    let color = Color::srgb(r, g, b);
    for segment in canvas.segments() {
        gizmos.line_2d(
            canvas_to_world(&canvas, segment.from),
            canvas_to_world(&canvas, segment.to),
            color,
        );
    }
}

fn update_status(
    canvas: Res<Canvas>,
    mut text: Query<(&mut Text, &mut TextFont), With<StatusText>>,
) {
    if !canvas.is_changed() {
        return;
    }
    if let Ok((mut text, mut font)) = text.single_mut() {
        **text = canvas.status().to_string();
        font.font_size = canvas.style().font_size;
    }
}

fn update_info(session: Res<Session>, mut text: Query<&mut Text, With<InfoText>>) {
    if !session.is_changed() {
        return;
    }
    let Ok(mut text) = text.single_mut() else {
        return;
    };

    let mut message = Vec::new();
    let state = match session.poller_state() {
        PollerState::Idle => "idle",
        PollerState::Running => "stepping",
    };
    writeln!(message, "Loop: {state} every {:?}", session.period()).unwrap();

    let omega = session.angular_velocity();
    writeln!(
        message,
        "Angular velocity: {omega}  |w| = {:.4}",
        omega.0.vector_norm()
    )
    .unwrap();
    writeln!(message, "Frames: {}", session.frames_rendered()).unwrap();
    if let Some(sensors) = session.sensors() {
        writeln!(
            message,
            "Sun sensor: {:.3}  IR sensor: {:.3}",
            sensors.sun, sensors.infrared
        )
        .unwrap();
    }
    write!(
        message,
        "[Enter] init  [Space] step  [Backspace] stop  [W/S A/D Q/E] torque  [N] sensors"
    )
    .unwrap();

    **text = String::from_utf8(message).unwrap();
}
