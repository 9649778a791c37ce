//! Real-time sources.
//!
//! Timeouts in the planner and the greedy fallback are measured in wall-clock seconds, not in
//! ticks. The clock is handed to the nodes that need it so tests can drive time by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::CoreError;

pub trait Clock {
    /// Seconds since an arbitrary, fixed origin.
    fn now_seconds(&self) -> f64;
}

pub type SharedClock = Rc<dyn Clock>;

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn shared() -> SharedClock {
        Rc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_seconds(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }

    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }

    pub fn shared(&self) -> SharedClock {
        Rc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now_seconds(&self) -> f64 {
        self.now.get()
    }
}

/// One-shot real-time timer; starts on first poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    duration: f64,
    started_at: Option<f64>,
}

impl Timer {
    pub fn new(duration_seconds: f64) -> Result<Self, CoreError> {
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(CoreError::InvalidDuration(duration_seconds.to_string()));
        }
        Ok(Self {
            duration: duration_seconds,
            started_at: None,
        })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn restart(&mut self, clock: &dyn Clock) {
        self.started_at = Some(clock.now_seconds());
    }

    pub fn reset(&mut self) {
        self.started_at = None;
    }

    pub fn elapsed(&self, clock: &dyn Clock) -> f64 {
        self.started_at
            .map(|start| (clock.now_seconds() - start).max(0.0))
            .unwrap_or(0.0)
    }

    /// Start the timer if needed and report whether the duration has passed.
    pub fn poll_expired(&mut self, clock: &dyn Clock) -> bool {
        if self.started_at.is_none() {
            self.restart(clock);
        }
        self.elapsed(clock) >= self.duration
    }
}
