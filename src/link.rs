//! Connects the session to the propagator service.
//!
//! Requests run on their own short-lived threads so the frame loop never
//! waits on the network. Finished exchanges come back over a channel and are
//! applied on the main schedule, in the order they arrive.

use std::sync::Arc;

use async_channel::{Receiver, Sender};
use attitude_link::{
    Canvas, ClientConfig, Completion, HttpTransport, Request, Session, Surface, TorqueDirection,
    Transport,
};
use bevy::prelude::*;

/// The operator's control surface.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum OperatorCommand {
    StartDemo,
    StartStepping,
    StopStepping,
    IssueTorque(TorqueDirection),
    ReadSensors,
}

#[derive(Resource, Clone)]
pub struct LinkTransport(pub Arc<dyn Transport>);

#[derive(Resource)]
pub struct CompletionChannel {
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl Default for CompletionChannel {
    fn default() -> Self {
        let (tx, rx) = async_channel::unbounded();
        Self { tx, rx }
    }
}

pub struct LinkPlugin {
    config: ClientConfig,
}

impl LinkPlugin {
    pub fn new(config: ClientConfig) -> Self {
        LinkPlugin { config }
    }
}

impl Plugin for LinkPlugin {
    fn build(&self, app: &mut App) {
        let transport = HttpTransport::from_config(&self.config);
        info!("propagator service at {}", transport.base_url());

        app.insert_resource(Session::new(&self.config));
        app.insert_resource(Canvas::new(
            self.config.canvas_width,
            self.config.canvas_height,
        ));
        app.insert_resource(LinkTransport(Arc::new(transport)));
        app.init_resource::<CompletionChannel>();
        app.add_message::<OperatorCommand>();
        // The clock goes first: a frame's delta was spent before any start
        // command read in that frame.
        app.add_systems(
            Update,
            (advance_stepping, handle_commands, apply_completions).chain(),
        );
    }
}

/// Run `request` in the background and post its completion.
fn dispatch(request: Request, transport: &LinkTransport, channel: &CompletionChannel) {
    let transport = Arc::clone(&transport.0);
    let tx = channel.tx.clone();
    let spawned = std::thread::Builder::new()
        .name("attitude-request".to_string())
        .spawn(move || {
            let completion = request.execute(transport.as_ref());
            // Only fails once the app is shutting down.
            let _ = tx.send_blocking(completion);
        });
    if let Err(err) = spawned {
        warn!("could not start request thread: {err}");
    }
}

fn handle_commands(
    mut commands: MessageReader<OperatorCommand>,
    mut session: ResMut<Session>,
    mut canvas: ResMut<Canvas>,
    transport: Res<LinkTransport>,
    channel: Res<CompletionChannel>,
) {
    for command in commands.read() {
        let request = match *command {
            OperatorCommand::StartDemo => Some(session.start_demo(&mut *canvas)),
            OperatorCommand::StartStepping => match session.start_stepping(&mut *canvas) {
                Ok(request) => Some(request),
                Err(err) => {
                    warn!("start stepping refused: {err}");
                    canvas.set_status("Already stepping.");
                    None
                }
            },
            OperatorCommand::StopStepping => {
                session.stop_stepping();
                None
            }
            OperatorCommand::IssueTorque(direction) => Some(session.issue_torque(direction)),
            OperatorCommand::ReadSensors => Some(session.read_sensors()),
        };
        if let Some(request) = request {
            dispatch(request, &transport, &channel);
        }
    }
}

fn advance_stepping(
    time: Res<Time>,
    mut session: ResMut<Session>,
    transport: Res<LinkTransport>,
    channel: Res<CompletionChannel>,
) {
    if let Some(request) = session.advance(time.delta()) {
        dispatch(request, &transport, &channel);
    }
}

fn apply_completions(
    mut session: ResMut<Session>,
    mut canvas: ResMut<Canvas>,
    channel: Res<CompletionChannel>,
) {
    while let Ok(completion) = channel.rx.try_recv() {
        session.complete(completion, &mut *canvas);
    }
}
