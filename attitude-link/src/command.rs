//! Torque command encoding.
//!
//! Quaternions here are only an axis/sign encoding on the wire, plus an
//! opaque angular velocity readout coming back. No quaternion algebra is done
//! on the client.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

/// A quaternion in the `{r, x, y, z}` shape the propagator service speaks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireQuaternion {
    pub r: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WireQuaternion {
    pub const fn new(r: f64, x: f64, y: f64, z: f64) -> Self {
        WireQuaternion { r, x, y, z }
    }

    /// Magnitude of the vector part.
    pub fn vector_norm(&self) -> f64 {
        na::Quaternion::from(*self).imag().norm()
    }
}

impl From<WireQuaternion> for na::Quaternion<f64> {
    fn from(q: WireQuaternion) -> Self {
        na::Quaternion::new(q.r, q.x, q.y, q.z)
    }
}

impl From<na::Quaternion<f64>> for WireQuaternion {
    fn from(q: na::Quaternion<f64>) -> Self {
        WireQuaternion::new(q.w, q.i, q.j, q.k)
    }
}

impl fmt::Display for WireQuaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.r, self.x, self.y, self.z)
    }
}

/// One of the six canonical torque directions: plus or minus rotation about
/// each principal axis. Counter-clockwise is the positive axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TorqueDirection {
    XClockwise,
    XCounterClockwise,
    YClockwise,
    YCounterClockwise,
    ZClockwise,
    ZCounterClockwise,
}

impl TorqueDirection {
    pub const ALL: [TorqueDirection; 6] = [
        TorqueDirection::XClockwise,
        TorqueDirection::XCounterClockwise,
        TorqueDirection::YClockwise,
        TorqueDirection::YCounterClockwise,
        TorqueDirection::ZClockwise,
        TorqueDirection::ZCounterClockwise,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            TorqueDirection::XClockwise => "xClockwise",
            TorqueDirection::XCounterClockwise => "xCounterClockwise",
            TorqueDirection::YClockwise => "yClockwise",
            TorqueDirection::YCounterClockwise => "yCounterClockwise",
            TorqueDirection::ZClockwise => "zClockwise",
            TorqueDirection::ZCounterClockwise => "zCounterClockwise",
        }
    }

    /// The axis encoding sent as `torqueQuarternion`.
    pub const fn quaternion(self) -> WireQuaternion {
        match self {
            TorqueDirection::XClockwise => WireQuaternion::new(0.0, -1.0, 0.0, 0.0),
            TorqueDirection::XCounterClockwise => WireQuaternion::new(0.0, 1.0, 0.0, 0.0),
            TorqueDirection::YClockwise => WireQuaternion::new(0.0, 0.0, -1.0, 0.0),
            TorqueDirection::YCounterClockwise => WireQuaternion::new(0.0, 0.0, 1.0, 0.0),
            TorqueDirection::ZClockwise => WireQuaternion::new(0.0, 0.0, 0.0, -1.0),
            TorqueDirection::ZCounterClockwise => WireQuaternion::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

impl fmt::Display for TorqueDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown torque direction {0:?}")]
pub struct UnknownDirection(pub String);

impl FromStr for TorqueDirection {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TorqueDirection::ALL
            .into_iter()
            .find(|dir| dir.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDirection(s.to_string()))
    }
}

/// The `/torque` request body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorqueCommand {
    // The service spells it this way.
    #[serde(rename = "torqueQuarternion")]
    pub quaternion: WireQuaternion,
    pub torque_newton_meters: f64,
    pub seconds_to_apply_torque: f64,
}

/// Build the impulse request for `direction`.
///
/// `period` is the render loop period, so one command amounts to one
/// simulated step's worth of actuation.
pub fn build_torque_command(
    direction: TorqueDirection,
    magnitude: f64,
    period: Duration,
) -> TorqueCommand {
    TorqueCommand {
        quaternion: direction.quaternion(),
        torque_newton_meters: magnitude,
        seconds_to_apply_torque: period.as_secs_f64(),
    }
}

/// Angular velocity as last reported by a torque response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AngularVelocityWire")]
pub struct AngularVelocity(pub WireQuaternion);

impl Default for AngularVelocity {
    fn default() -> Self {
        AngularVelocity(WireQuaternion::new(0.0, 0.0, 0.0, 1.0))
    }
}

impl fmt::Display for AngularVelocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The service has answered with an object, a full `[r, x, y, z]` array, and
/// a bare `[x, y, z]` vector at various points.
#[derive(Deserialize)]
#[serde(untagged)]
enum AngularVelocityWire {
    Object(WireQuaternion),
    Array(Vec<f64>),
}

impl TryFrom<AngularVelocityWire> for AngularVelocity {
    type Error = String;

    fn try_from(wire: AngularVelocityWire) -> Result<Self, Self::Error> {
        match wire {
            AngularVelocityWire::Object(q) => Ok(AngularVelocity(q)),
            AngularVelocityWire::Array(v) => match v[..] {
                [r, x, y, z] => Ok(AngularVelocity(WireQuaternion::new(r, x, y, z))),
                [x, y, z] => Ok(AngularVelocity(WireQuaternion::new(0.0, x, y, z))),
                _ => Err(format!(
                    "angular velocity needs 3 or 4 components, got {}",
                    v.len()
                )),
            },
        }
    }
}
