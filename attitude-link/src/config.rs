//! Client configuration.
//!
//! Defaults reproduce the reference client. A JSON file named by
//! `ATTITUDE_CONFIG` can replace any of them, and a couple of environment
//! variables override the file.

use std::{path::Path, time::Duration};

use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};

use crate::{poller::ResponseOrdering, transport::InitPayload};

pub const CONFIG_PATH_VAR: &str = "ATTITUDE_CONFIG";
pub const SERVER_URL_VAR: &str = "ATTITUDE_SERVER_URL";
pub const FRAME_PERIOD_VAR: &str = "ATTITUDE_FRAME_PERIOD_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the propagator service.
    pub server_url: String,
    /// Step loop period. Also the duration of every torque impulse.
    pub frame_period_ms: u64,
    /// Simulated seconds requested per step.
    pub step_seconds: f64,
    pub torque_newton_meters: f64,
    /// Body parameters sent to `/init`.
    pub init: InitPayload,
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Pixels per object unit. Defaults to `canvas_width / 100`.
    pub drawing_scale: Option<f64>,
    pub ordering: ResponseOrdering,
    pub request_timeout_ms: u64,
    pub step_retries: usize,
    pub retry_min_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: "http://localhost:8080".to_string(),
            frame_period_ms: 100,
            step_seconds: 1.0,
            torque_newton_meters: 1.0,
            init: InitPayload::default(),
            canvas_width: 600.0,
            canvas_height: 600.0,
            drawing_scale: None,
            ordering: ResponseOrdering::default(),
            request_timeout_ms: 2000,
            step_retries: 2,
            retry_min_delay_ms: 50,
            retry_max_delay_ms: 200,
        }
    }
}

impl ClientConfig {
    /// Load from `.env`, the optional config file, and the environment.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => ClientConfig::from_file(Path::new(&path))?,
            Err(_) => ClientConfig::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        ClientConfig::from_json_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let config: ClientConfig = serde_json::from_str(text)?;
        Ok(config)
    }

    /// Apply environment style overrides, looked up through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(url) = lookup(SERVER_URL_VAR) {
            self.server_url = url;
        }
        if let Some(period) = lookup(FRAME_PERIOD_VAR) {
            self.frame_period_ms = period
                .trim()
                .parse()
                .with_context(|| format!("{FRAME_PERIOD_VAR} must be whole milliseconds, got {period:?}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.frame_period_ms > 0, "frame_period_ms must be positive");
        ensure!(
            self.canvas_width > 0.0 && self.canvas_height > 0.0,
            "canvas size must be positive, got {}x{}",
            self.canvas_width,
            self.canvas_height
        );
        ensure!(self.request_timeout_ms > 0, "request_timeout_ms must be positive");
        ensure!(
            self.retry_min_delay_ms <= self.retry_max_delay_ms,
            "retry_min_delay_ms ({}) is above retry_max_delay_ms ({})",
            self.retry_min_delay_ms,
            self.retry_max_delay_ms
        );
        if let Some(scale) = self.drawing_scale {
            ensure!(scale > 0.0, "drawing_scale must be positive, got {scale}");
        }
        Ok(())
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_period_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
