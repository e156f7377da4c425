//! Run progress tracking and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::constants::CANCEL_POLL_INTERVAL;

/// Aggregate progress of the current run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Percentage in `0..=100`, non-decreasing within a run.
    pub percent: u8,
    /// Human-readable label of the latest step.
    pub current_step: String,
}

impl Progress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.percent = 0;
        self.current_step.clear();
    }

    /// Record that `settled` of `total` tasks have finished.
    ///
    /// The percentage is `round(100 * settled / total)`, held below 100
    /// until every task has settled and never lowered.
    pub fn advance(&mut self, settled: usize, total: usize, step: impl Into<String>) {
        let target = settled_percent(settled, total);
        self.percent = self.percent.max(target);
        self.current_step = step.into();
    }

    /// Mark the run complete.
    pub fn complete(&mut self, step: impl Into<String>) {
        self.percent = 100;
        self.current_step = step.into();
    }
}

/// `round(100 * settled / total)`, capped at 99 while any task is pending.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn settled_percent(settled: usize, total: usize) -> u8 {
    if total == 0 || settled >= total {
        return 100;
    }
    let rounded = (200 * settled + total) / (2 * total);
    rounded.min(99) as u8
}

/// Returned by [`CancellationToken::check_cancelled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("optimization cancelled")]
pub struct Cancelled;

/// Cooperative cancellation flag shared between the store and a task.
///
/// # Example
/// ```
/// use rosetta_core::progress::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// assert!(token.check_cancelled().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Checkpoint for agent loops.
    pub fn check_cancelled(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration`, waking early if the token is cancelled.
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let deadline = Instant::now() + duration;
        loop {
            self.check_cancelled()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep(CANCEL_POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
