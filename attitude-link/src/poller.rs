//! Step request pacing.
//!
//! The poller does not wait on its own requests. It hands out a tick every
//! period and later decides which responses are still worth drawing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollerState {
    #[default]
    Idle,
    Running,
}

/// What to do with step responses that arrive out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Drop any response older than the newest one already drawn.
    #[default]
    Sequenced,
    /// Draw whatever arrives last, stale or not.
    LastArrival,
}

/// Identifies one step request. Ids increase for the life of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepTick(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("step loop is already running")]
pub struct AlreadyRunning;

#[derive(Debug, Clone)]
pub struct StepPoller {
    state: PollerState,
    period: Duration,
    ordering: ResponseOrdering,
    since_tick: Duration,
    next_tick: u64,
    last_applied: Option<u64>,
}

impl StepPoller {
    pub fn new(period: Duration, ordering: ResponseOrdering) -> Self {
        StepPoller {
            state: PollerState::Idle,
            period,
            ordering,
            since_tick: Duration::ZERO,
            next_tick: 1,
            last_applied: None,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PollerState::Running
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn ordering(&self) -> ResponseOrdering {
        self.ordering
    }

    /// Go from idle to running and issue the first tick right away.
    pub fn start(&mut self) -> Result<StepTick, AlreadyRunning> {
        if self.is_running() {
            return Err(AlreadyRunning);
        }
        self.state = PollerState::Running;
        Ok(self.issue())
    }

    /// Back to idle. Returns false if it was not running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        self.state = PollerState::Idle;
        was_running
    }

    /// Let `elapsed` pass. Returns the tick to send if one is due.
    ///
    /// At most one tick per call, and the wait restarts from zero when a tick
    /// goes out, so ticks are never closer than one period.
    pub fn advance(&mut self, elapsed: Duration) -> Option<StepTick> {
        if !self.is_running() {
            return None;
        }
        self.since_tick += elapsed;
        if self.since_tick >= self.period {
            Some(self.issue())
        } else {
            None
        }
    }

    /// Whether anything about `tick` still belongs on screen. Never true
    /// while idle.
    pub fn is_current(&self, tick: StepTick) -> bool {
        if !self.is_running() {
            return false;
        }
        match self.ordering {
            ResponseOrdering::Sequenced => self.last_applied.is_none_or(|last| tick.0 > last),
            ResponseOrdering::LastArrival => true,
        }
    }

    /// Whether a response for `tick` should replace what is on screen.
    ///
    /// Responses arriving while idle are always dropped.
    pub fn accept(&mut self, tick: StepTick) -> bool {
        if !self.is_current(tick) {
            return false;
        }
        self.last_applied = Some(tick.0);
        true
    }

    fn issue(&mut self) -> StepTick {
        let tick = StepTick(self.next_tick);
        self.next_tick += 1;
        self.since_tick = Duration::ZERO;
        tick
    }
}
