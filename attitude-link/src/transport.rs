//! Talking to the propagator service.
//!
//! Calls here block. The display app runs them off the frame loop.

use std::time::Duration;

use backon::{BlockingRetryable, ExponentialBuilder};
use bevy::log::{debug, warn};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    command::{AngularVelocity, TorqueCommand},
    config::ClientConfig,
    frame::Frame,
};

pub const INIT_PATH: &str = "/init";
pub const STEP_PATH: &str = "/step";
pub const TORQUE_PATH: &str = "/torque";
pub const SUN_SENSOR_PATH: &str = "/getSunSensorValue";
pub const IR_SENSOR_PATH: &str = "/getIRValue";

/// Body of the `/init` request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitPayload {
    /// Body mass in kg.
    Mass(f64),
    /// Body dimensions in m.
    Dimensions([f64; 3]),
}

impl Default for InitPayload {
    fn default() -> Self {
        InitPayload::Mass(10.0)
    }
}

/// Any failed exchange with the service: connection trouble, a non-success
/// status, or a body that does not decode.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{endpoint}: {message}")]
pub struct TransportError {
    pub endpoint: &'static str,
    pub message: String,
}

impl TransportError {
    pub fn new(endpoint: &'static str, message: impl Into<String>) -> Self {
        TransportError {
            endpoint,
            message: message.into(),
        }
    }
}

/// The propagator service, one method per endpoint.
pub trait Transport: Send + Sync {
    fn init(&self, payload: &InitPayload) -> Result<Frame, TransportError>;

    fn step(&self, seconds: f64) -> Result<Frame, TransportError>;

    fn torque(&self, command: &TorqueCommand) -> Result<AngularVelocity, TransportError>;

    fn sun_sensor(&self) -> Result<f64, TransportError>;

    fn ir_sensor(&self) -> Result<f64, TransportError>;
}

/// JSON over HTTP with `ureq`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
    step_backoff: ExponentialBuilder,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        HttpTransport {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            step_backoff: ExponentialBuilder::default().with_max_times(0),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        HttpTransport::new(config.server_url.clone(), config.request_timeout()).with_step_retries(
            config.step_retries,
            Duration::from_millis(config.retry_min_delay_ms),
            Duration::from_millis(config.retry_max_delay_ms),
        )
    }

    /// Retry failed step requests up to `retries` times with exponential
    /// backoff. Other endpoints are never retried.
    pub fn with_step_retries(mut self, retries: usize, min_delay: Duration, max_delay: Duration) -> Self {
        self.step_backoff = ExponentialBuilder::default()
            .with_min_delay(min_delay)
            .with_max_delay(max_delay)
            .with_max_times(retries);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send<B: Serialize>(&self, method: &str, path: &'static str, body: &B) -> Result<String, TransportError> {
        let body = serde_json::to_string(body).map_err(|e| TransportError::new(path, e.to_string()))?;
        let response = self
            .agent
            .request(method, &self.url(path))
            .set("Content-Type", "application/json")
            .send_string(&body)
            .map_err(|e| request_error(path, e))?;
        response
            .into_string()
            .map_err(|e| TransportError::new(path, e.to_string()))
    }

    fn get<T: DeserializeOwned>(&self, path: &'static str) -> Result<T, TransportError> {
        let response = self
            .agent
            .get(&self.url(path))
            .call()
            .map_err(|e| request_error(path, e))?;
        let text = response
            .into_string()
            .map_err(|e| TransportError::new(path, e.to_string()))?;
        decode(path, &text)
    }

    fn step_once(&self, seconds: f64) -> Result<Frame, TransportError> {
        let text = self.send("POST", STEP_PATH, &seconds)?;
        Frame::from_json(&text).map_err(|e| TransportError::new(STEP_PATH, e.to_string()))
    }
}

fn request_error(path: &'static str, err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            TransportError::new(path, format!("status {code}: {body}"))
        }
        ureq::Error::Transport(transport) => TransportError::new(path, transport.to_string()),
    }
}

fn decode<T: DeserializeOwned>(path: &'static str, text: &str) -> Result<T, TransportError> {
    serde_json::from_str(text).map_err(|e| TransportError::new(path, e.to_string()))
}

impl Transport for HttpTransport {
    fn init(&self, payload: &InitPayload) -> Result<Frame, TransportError> {
        let text = self.send("PUT", INIT_PATH, payload)?;
        Frame::from_json(&text).map_err(|e| TransportError::new(INIT_PATH, e.to_string()))
    }

    fn step(&self, seconds: f64) -> Result<Frame, TransportError> {
        (|| self.step_once(seconds))
            .retry(&self.step_backoff)
            .notify(|err: &TransportError, wait: Duration| {
                warn!("step failed ({err}), retrying in {wait:?}");
            })
            .call()
    }

    fn torque(&self, command: &TorqueCommand) -> Result<AngularVelocity, TransportError> {
        debug!("torque {:?}", command);
        let text = self.send("POST", TORQUE_PATH, command)?;
        decode(TORQUE_PATH, &text)
    }

    fn sun_sensor(&self) -> Result<f64, TransportError> {
        self.get(SUN_SENSOR_PATH)
    }

    fn ir_sensor(&self) -> Result<f64, TransportError> {
        self.get(IR_SENSOR_PATH)
    }
}
