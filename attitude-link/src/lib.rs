//! Client side of the spacecraft attitude propagator.
//!
//! The simulation itself runs behind an HTTP service. This crate turns the
//! frames it returns into line drawings, paces the step requests, and encodes
//! operator torque commands. Nothing here integrates rotational dynamics.

extern crate nalgebra as na;

pub mod command;
pub mod config;
pub mod frame;
pub mod mapper;
pub mod poller;
pub mod render;
pub mod session;
pub mod transport;

pub use command::{AngularVelocity, TorqueCommand, TorqueDirection, WireQuaternion};
pub use config::ClientConfig;
pub use frame::{Face, Frame, FrameError, Point2D};
pub use mapper::{CoordinateMapper, ScreenPoint};
pub use poller::{PollerState, ResponseOrdering, StepPoller, StepTick};
pub use render::{Canvas, DrawStyle, PolygonRenderer, Segment, Surface};
pub use session::{Completion, Request, SensorReadings, Session, SessionError};
pub use transport::{HttpTransport, InitPayload, Transport, TransportError};
