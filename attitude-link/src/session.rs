//! The operator session.
//!
//! A `Session` owns everything the reference client kept in globals: the step
//! poller, the last reported angular velocity and the encoder inputs. Actions
//! return a [`Request`] for the host to run however it likes; whatever comes
//! back is handed to [`Session::complete`]. The drawing surface is passed in
//! by the host on every call.

use std::time::Duration;

use bevy::{
    log::{debug, info, warn},
    prelude::Resource,
};

use crate::{
    command::{AngularVelocity, TorqueCommand, TorqueDirection, build_torque_command},
    config::ClientConfig,
    frame::Frame,
    poller::{AlreadyRunning, PollerState, StepPoller, StepTick},
    render::{DrawStyle, PolygonRenderer, Surface},
    transport::{InitPayload, Transport, TransportError},
};

/// Latest sensor values from the service. Both are cosines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReadings {
    /// Spacecraft -X axis against the sun vector.
    pub sun: f64,
    /// Spacecraft -Y axis against the earth IR vector.
    pub infrared: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("already stepping")]
    AlreadyStepping,
}

impl From<AlreadyRunning> for SessionError {
    fn from(_: AlreadyRunning) -> Self {
        SessionError::AlreadyStepping
    }
}

/// One exchange with the service, ready to be run.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Init(InitPayload),
    Step { tick: StepTick, seconds: f64 },
    Torque {
        direction: TorqueDirection,
        command: TorqueCommand,
    },
    Sensors,
}

/// The outcome of a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Init(Result<Frame, TransportError>),
    Step {
        tick: StepTick,
        result: Result<Frame, TransportError>,
    },
    Torque {
        direction: TorqueDirection,
        result: Result<AngularVelocity, TransportError>,
    },
    Sensors(Result<SensorReadings, TransportError>),
}

impl Request {
    /// Run the exchange. Blocks for as long as the transport does.
    pub fn execute(self, transport: &dyn Transport) -> Completion {
        match self {
            Request::Init(payload) => Completion::Init(transport.init(&payload)),
            Request::Step { tick, seconds } => Completion::Step {
                tick,
                result: transport.step(seconds),
            },
            Request::Torque { direction, command } => Completion::Torque {
                direction,
                result: transport.torque(&command),
            },
            Request::Sensors => Completion::Sensors(
                transport
                    .sun_sensor()
                    .and_then(|sun| Ok(SensorReadings { sun, infrared: transport.ir_sensor()? })),
            ),
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct Session {
    poller: StepPoller,
    period: Duration,
    step_seconds: f64,
    torque_newton_meters: f64,
    init: InitPayload,
    drawing_scale: Option<f64>,
    style: DrawStyle,
    angular_velocity: AngularVelocity,
    sensors: Option<SensorReadings>,
    frames_rendered: u64,
}

impl Session {
    pub fn new(config: &ClientConfig) -> Self {
        Session {
            poller: StepPoller::new(config.frame_period(), config.ordering),
            period: config.frame_period(),
            step_seconds: config.step_seconds,
            torque_newton_meters: config.torque_newton_meters,
            init: config.init,
            drawing_scale: config.drawing_scale,
            style: DrawStyle::default(),
            angular_velocity: AngularVelocity::default(),
            sensors: None,
            frames_rendered: 0,
        }
    }

    pub fn angular_velocity(&self) -> AngularVelocity {
        self.angular_velocity
    }

    pub fn sensors(&self) -> Option<SensorReadings> {
        self.sensors
    }

    pub fn poller_state(&self) -> PollerState {
        self.poller.state()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Clear the surface and ask the service for the initial frame.
    pub fn start_demo<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Request {
        surface.clear();
        surface.set_status("Initializing...");
        info!("initializing spacecraft with {:?}", self.init);
        Request::Init(self.init)
    }

    /// Clear the surface, set the drawing defaults and start the step loop.
    ///
    /// Starting a loop that is already running is refused and leaves the
    /// surface alone.
    pub fn start_stepping<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Result<Request, SessionError> {
        let tick = self.poller.start()?;
        surface.clear();
        surface.configure(self.style);
        info!("stepping every {:?}", self.period);
        Ok(self.step_request(tick))
    }

    /// Stop the step loop. Frames still in flight are dropped when they land.
    pub fn stop_stepping(&mut self) -> bool {
        let stopped = self.poller.stop();
        if stopped {
            info!("stepping stopped");
        }
        stopped
    }

    /// Encode a torque impulse lasting one loop period.
    pub fn issue_torque(&self, direction: TorqueDirection) -> Request {
        let command = build_torque_command(direction, self.torque_newton_meters, self.period);
        info!("torque {direction}: {}", command.quaternion);
        Request::Torque { direction, command }
    }

    pub fn read_sensors(&self) -> Request {
        Request::Sensors
    }

    /// Feed the host's frame time to the step loop.
    pub fn advance(&mut self, elapsed: Duration) -> Option<Request> {
        let tick = self.poller.advance(elapsed)?;
        debug!("step tick {}", tick.0);
        Some(self.step_request(tick))
    }

    /// Apply a finished exchange.
    pub fn complete<S: Surface + ?Sized>(&mut self, completion: Completion, surface: &mut S) {
        match completion {
            Completion::Init(Ok(frame)) => {
                self.render(surface, &frame);
                surface.set_status("Spacecraft is initialized.");
                info!("spacecraft initialized with {} faces", frame.faces().len());
            }
            Completion::Init(Err(err)) => {
                warn!("init failed: {err}");
                surface.set_status(&format!("Error while initializing... {err}"));
            }
            Completion::Step { tick, result: Ok(frame) } => {
                if self.poller.accept(tick) {
                    self.render(surface, &frame);
                    surface.set_status(&format!(
                        "Angular velocity quaternion: {}",
                        self.angular_velocity
                    ));
                } else {
                    debug!("dropping stale frame from tick {}", tick.0);
                }
            }
            Completion::Step { tick, result: Err(err) } => {
                // The last good frame stays up.
                warn!("step {} failed: {err}", tick.0);
                if self.poller.is_current(tick) {
                    surface.set_status(&format!("Error while stepping... {err}"));
                }
            }
            Completion::Torque { direction, result: Ok(velocity) } => {
                self.angular_velocity = velocity;
                surface.set_status(&format!("Torquing {direction}... {velocity}"));
            }
            Completion::Torque { direction, result: Err(err) } => {
                warn!("torque {direction} failed: {err}");
                surface.set_status(&format!("Error while torquing {direction}... {err}"));
            }
            Completion::Sensors(Ok(readings)) => {
                self.sensors = Some(readings);
            }
            Completion::Sensors(Err(err)) => {
                warn!("sensor read failed: {err}");
                surface.set_status(&format!("Error while reading sensors... {err}"));
            }
        }
    }

    fn step_request(&self, tick: StepTick) -> Request {
        Request::Step {
            tick,
            seconds: self.step_seconds,
        }
    }

    fn render<S: Surface + ?Sized>(&mut self, surface: &mut S, frame: &Frame) {
        PolygonRenderer::for_surface(&*surface, self.drawing_scale).render(surface, frame);
        self.frames_rendered += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex};

    use super::*;
    use crate::{
        command::WireQuaternion,
        frame::{Face, Point2D},
        mapper::ScreenPoint,
        poller::ResponseOrdering,
        render::{Canvas, Segment},
    };

    /// Hands out scripted responses and records what it was asked.
    #[derive(Default)]
    struct ScriptedTransport {
        frames: Mutex<VecDeque<Result<Frame, TransportError>>>,
        torques: Mutex<VecDeque<Result<AngularVelocity, TransportError>>>,
        sent: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn push_frame(&self, frame: Result<Frame, TransportError>) {
            self.frames.lock().unwrap().push_back(frame);
        }

        fn push_torque(&self, velocity: Result<AngularVelocity, TransportError>) {
            self.torques.lock().unwrap().push_back(velocity);
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        fn next_frame(&self, what: String) -> Result<Frame, TransportError> {
            self.sent.lock().unwrap().push(what);
            self.frames.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Frame::default()))
        }
    }

    impl Transport for ScriptedTransport {
        fn init(&self, payload: &InitPayload) -> Result<Frame, TransportError> {
            self.next_frame(format!("init {payload:?}"))
        }

        fn step(&self, seconds: f64) -> Result<Frame, TransportError> {
            self.next_frame(format!("step {seconds}"))
        }

        fn torque(&self, command: &TorqueCommand) -> Result<AngularVelocity, TransportError> {
            self.sent.lock().unwrap().push(format!("torque {}", command.quaternion));
            self.torques
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(AngularVelocity::default()))
        }

        fn sun_sensor(&self) -> Result<f64, TransportError> {
            Ok(0.5)
        }

        fn ir_sensor(&self) -> Result<f64, TransportError> {
            Err(TransportError::new("/getIRValue", "status 404: "))
        }
    }

    fn diamond() -> Frame {
        let points = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)]
            .into_iter()
            .map(|(x, y)| Point2D::new(x, y))
            .collect();
        Frame::new(vec![Face::new(points).unwrap()])
    }

    fn triangle() -> Frame {
        let points = [(0.0, 0.0), (2.0, 0.0), (0.0, 2.0)]
            .into_iter()
            .map(|(x, y)| Point2D::new(x, y))
            .collect();
        Frame::new(vec![Face::new(points).unwrap()])
    }

    fn session() -> Session {
        Session::new(&ClientConfig::default())
    }

    #[test]
    fn demo_renders_initial_diamond() {
        let transport = ScriptedTransport::default();
        transport.push_frame(Ok(diamond()));
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = session();

        let request = session.start_demo(&mut canvas);
        assert_eq!(request, Request::Init(InitPayload::Mass(10.0)));
        assert_eq!(canvas.status(), "Initializing...");

        session.complete(request.execute(&transport), &mut canvas);

        let seg = |x0, y0, x1, y1| Segment {
            from: ScreenPoint::new(x0, y0),
            to: ScreenPoint::new(x1, y1),
        };
        assert_eq!(
            canvas.segments(),
            &[
                seg(51.0, 50.0, 50.0, 49.0),
                seg(50.0, 49.0, 49.0, 50.0),
                seg(49.0, 50.0, 50.0, 51.0),
                seg(50.0, 51.0, 51.0, 50.0),
            ]
        );
        assert_eq!(canvas.status(), "Spacecraft is initialized.");
        assert_eq!(session.frames_rendered(), 1);
        assert_eq!(transport.sent(), vec!["init Mass(10.0)"]);
    }

    #[test]
    fn demo_clears_previous_drawing() {
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = session();
        let transport = ScriptedTransport::default();
        transport.push_frame(Ok(diamond()));
        let request = session.start_demo(&mut canvas);
        session.complete(request.execute(&transport), &mut canvas);
        assert!(!canvas.segments().is_empty());

        session.start_demo(&mut canvas);
        assert!(canvas.segments().is_empty());
    }

    #[test]
    fn ten_ticks_issue_ten_steps() {
        let transport = ScriptedTransport::default();
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = session();

        let mut requests = vec![session.start_stepping(&mut canvas).unwrap()];
        for _ in 0..9 {
            requests.extend(session.advance(Duration::from_millis(100)));
        }
        // Nothing is due until another full period passes.
        assert_eq!(session.advance(Duration::from_millis(99)), None);

        for request in requests {
            let completion = request.execute(&transport);
            session.complete(completion, &mut canvas);
        }
        assert_eq!(transport.sent(), vec!["step 1"; 10]);
        assert_eq!(session.frames_rendered(), 10);
    }

    #[test]
    fn stepping_sets_drawing_defaults() {
        let mut canvas = Canvas::new(100.0, 100.0);
        canvas.configure(DrawStyle {
            stroke: [1.0, 0.0, 0.0],
            font_size: 30.0,
        });
        let mut session = session();
        session.start_stepping(&mut canvas).unwrap();
        assert_eq!(canvas.style(), DrawStyle::default());
    }

    #[test]
    fn second_start_is_refused_without_clearing() {
        let transport = ScriptedTransport::default();
        transport.push_frame(Ok(diamond()));
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = session();

        let first = session.start_stepping(&mut canvas).unwrap();
        session.complete(first.execute(&transport), &mut canvas);
        assert_eq!(canvas.segments().len(), 4);

        assert_eq!(session.start_stepping(&mut canvas), Err(SessionError::AlreadyStepping));
        assert_eq!(canvas.segments().len(), 4);
        assert_eq!(session.poller_state(), PollerState::Running);
    }

    #[test]
    fn failed_step_keeps_last_frame_and_loop_goes_on() {
        let transport = ScriptedTransport::default();
        transport.push_frame(Ok(diamond()));
        transport.push_frame(Err(TransportError::new("/step", "status 500: oops")));
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = session();

        let first = session.start_stepping(&mut canvas).unwrap();
        session.complete(first.execute(&transport), &mut canvas);
        let drawn = canvas.segments().to_vec();

        let second = session.advance(Duration::from_millis(100)).unwrap();
        session.complete(second.execute(&transport), &mut canvas);
        assert_eq!(canvas.segments(), drawn.as_slice());
        assert_eq!(canvas.status(), "Error while stepping... /step: status 500: oops");

        let third = session.advance(Duration::from_millis(100));
        assert!(matches!(third, Some(Request::Step { tick: StepTick(3), .. })));
    }

    #[test]
    fn stale_frame_does_not_overwrite_newer_one() {
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = session();
        let first = session.start_stepping(&mut canvas).unwrap();
        let second = session.advance(Duration::from_millis(100)).unwrap();
        let (Request::Step { tick: t1, .. }, Request::Step { tick: t2, .. }) = (first, second) else {
            panic!("expected step requests");
        };

        session.complete(Completion::Step { tick: t2, result: Ok(triangle()) }, &mut canvas);
        let newest = canvas.segments().to_vec();
        session.complete(Completion::Step { tick: t1, result: Ok(diamond()) }, &mut canvas);

        assert_eq!(canvas.segments(), newest.as_slice());
        assert_eq!(session.frames_rendered(), 1);
    }

    #[test]
    fn last_arrival_mode_lets_stale_frame_win() {
        let config = ClientConfig {
            ordering: ResponseOrdering::LastArrival,
            ..ClientConfig::default()
        };
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = Session::new(&config);
        session.start_stepping(&mut canvas).unwrap();
        session.advance(Duration::from_millis(100)).unwrap();

        session.complete(Completion::Step { tick: StepTick(2), result: Ok(triangle()) }, &mut canvas);
        session.complete(Completion::Step { tick: StepTick(1), result: Ok(diamond()) }, &mut canvas);
        assert_eq!(canvas.segments().len(), 4);
        assert_eq!(session.frames_rendered(), 2);
    }

    #[test]
    fn frames_after_stop_are_dropped() {
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = session();
        session.start_stepping(&mut canvas).unwrap();
        assert!(session.stop_stepping());
        assert_eq!(session.advance(Duration::from_secs(1)), None);

        session.complete(Completion::Step { tick: StepTick(1), result: Ok(diamond()) }, &mut canvas);
        assert!(canvas.segments().is_empty());
        assert_eq!(session.poller_state(), PollerState::Idle);
    }

    #[test]
    fn late_step_failure_leaves_status_alone() {
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = session();
        let failure = || Err(TransportError::new("/step", "timed out"));

        session.start_stepping(&mut canvas).unwrap();
        session.advance(Duration::from_millis(100)).unwrap();
        session.complete(Completion::Step { tick: StepTick(2), result: Ok(diamond()) }, &mut canvas);
        let healthy = canvas.status().to_string();

        session.complete(Completion::Step { tick: StepTick(1), result: failure() }, &mut canvas);
        assert_eq!(canvas.status(), healthy);

        session.stop_stepping();
        canvas.set_status("Stopped.");
        session.complete(Completion::Step { tick: StepTick(3), result: failure() }, &mut canvas);
        assert_eq!(canvas.status(), "Stopped.");
    }

    #[test]
    fn torque_payload_uses_loop_period() {
        let session = session();
        assert_eq!(
            session.issue_torque(TorqueDirection::ZCounterClockwise),
            Request::Torque {
                direction: TorqueDirection::ZCounterClockwise,
                command: TorqueCommand {
                    quaternion: WireQuaternion::new(0.0, 0.0, 0.0, 1.0),
                    torque_newton_meters: 1.0,
                    seconds_to_apply_torque: 0.1,
                },
            }
        );
        let Request::Torque { command, .. } = session.issue_torque(TorqueDirection::XClockwise) else {
            panic!("expected torque request");
        };
        assert_eq!(command.quaternion, WireQuaternion::new(0.0, -1.0, 0.0, 0.0));
    }

    #[test]
    fn torque_response_overwrites_angular_velocity() {
        let transport = ScriptedTransport::default();
        let reported = AngularVelocity(WireQuaternion::new(0.0, 0.1, 0.0, 0.0));
        transport.push_torque(Ok(reported));
        transport.push_torque(Err(TransportError::new("/torque", "connection refused")));
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = session();
        assert_eq!(session.angular_velocity(), AngularVelocity::default());

        let ok = session.issue_torque(TorqueDirection::XCounterClockwise).execute(&transport);
        session.complete(ok, &mut canvas);
        assert_eq!(session.angular_velocity(), reported);
        assert_eq!(canvas.status(), "Torquing xCounterClockwise... (0, 0.1, 0, 0)");

        let failed = session.issue_torque(TorqueDirection::YClockwise).execute(&transport);
        session.complete(failed, &mut canvas);
        assert_eq!(session.angular_velocity(), reported);
        assert_eq!(
            canvas.status(),
            "Error while torquing yClockwise... /torque: connection refused"
        );
        assert_eq!(
            transport.sent(),
            vec!["torque (0, 1, 0, 0)", "torque (0, 0, -1, 0)"]
        );
    }

    #[test]
    fn torque_does_not_touch_the_drawing() {
        let transport = ScriptedTransport::default();
        transport.push_frame(Ok(diamond()));
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = session();
        let init = session.start_demo(&mut canvas);
        session.complete(init.execute(&transport), &mut canvas);

        let torque = session.issue_torque(TorqueDirection::ZClockwise).execute(&transport);
        session.complete(torque, &mut canvas);
        assert_eq!(canvas.segments().len(), 4);
    }

    #[test]
    fn sensor_failure_is_reported() {
        let transport = ScriptedTransport::default();
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = session();

        let completion = session.read_sensors().execute(&transport);
        session.complete(completion, &mut canvas);
        assert_eq!(session.sensors(), None);
        assert!(canvas.status().starts_with("Error while reading sensors..."));

        session.complete(
            Completion::Sensors(Ok(SensorReadings { sun: 0.5, infrared: -1.0 })),
            &mut canvas,
        );
        assert_eq!(session.sensors(), Some(SensorReadings { sun: 0.5, infrared: -1.0 }));
    }

    #[test]
    fn failed_init_reports_error() {
        let transport = ScriptedTransport::default();
        transport.push_frame(Err(TransportError::new("/init", "status 404: No attitude quarternion data returned")));
        let mut canvas = Canvas::new(100.0, 100.0);
        let mut session = session();
        let request = session.start_demo(&mut canvas);
        session.complete(request.execute(&transport), &mut canvas);
        assert!(canvas.segments().is_empty());
        assert_eq!(
            canvas.status(),
            "Error while initializing... /init: status 404: No attitude quarternion data returned"
        );
        assert_eq!(session.frames_rendered(), 0);
    }
}
