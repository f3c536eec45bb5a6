//! Spacecraft attitude display.
//!
//! Draws the wireframe the propagator service sends back and turns key
//! presses into torque impulses. All of the physics happens on the server.

use attitude_link::ClientConfig;
use bevy::prelude::*;

mod controls;
mod link;
mod ui;

fn main() -> anyhow::Result<()> {
    let config = ClientConfig::load()?;

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Spacecraft Attitude".to_string(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((
            link::LinkPlugin::new(config),
            controls::ControlsPlugin,
            ui::UIPlugin,
        ))
        .run();

    Ok(())
}
