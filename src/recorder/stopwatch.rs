//! Elapsed recording time
//!
//! Accumulates active recording time across pause/resume cycles. Paused
//! intervals are never counted.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Measures cumulative running time
#[derive(Debug, Default)]
pub struct Stopwatch {
    /// Time accumulated by completed running intervals
    accumulated: Duration,

    /// Start of the current running interval, if running
    running_since: Option<Instant>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accumulating, keeping whatever was accumulated before.
    ///
    /// Does nothing if already running.
    pub fn start(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    /// Freeze the current total. Does nothing if not running.
    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    pub fn resume(&mut self) {
        self.start();
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Total running time so far, without altering state
    pub fn elapsed(&self) -> Duration {
        let current = self
            .running_since
            .map(|since| since.elapsed())
            .unwrap_or_default();
        self.accumulated + current
    }

    /// Halt, return the total running time and reset to zero.
    pub fn stop(&mut self) -> Duration {
        let total = self.elapsed();
        self.running_since = None;
        self.accumulated = Duration::ZERO;
        total
    }
}

/// Read-only view of a stopwatch owned elsewhere
#[derive(Debug, Clone)]
pub struct ElapsedHandle(Arc<Mutex<Stopwatch>>);

impl ElapsedHandle {
    pub(crate) fn new(stopwatch: Arc<Mutex<Stopwatch>>) -> Self {
        Self(stopwatch)
    }

    pub fn elapsed(&self) -> Duration {
        self.0.lock().elapsed()
    }
}
