//! Progress events and cooperative cancellation.
//!
//! Events are fire-and-forget: they go out over a crossbeam channel with
//! `try_send`, so a slow, full or dropped receiver never stalls the sort.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use serde::Serialize;

use crate::sort::error::{ErrorKind, SortError};
use crate::sort::sorter::SortResult;

/// Lifecycle signals surfaced to the caller.
///
/// Every run emits `Started` first and exactly one of `Completed`,
/// `Cancelled` or `Failed` last.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SortEvent {
    Started { input: PathBuf },
    Progress { percent: u8 },
    Completed(SortResult),
    /// The run stopped at a cancellation request
    Cancelled,
    Failed { kind: ErrorKind, message: String },
}

/// Caller-held handle to request that a running sort stop.
///
/// The sorter checks it between chunks and between merge steps.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// # Errors
    ///
    /// Returns `SortError::Cancelled` once cancellation was requested.
    pub fn check(&self) -> Result<(), SortError> {
        if self.is_cancelled() {
            return Err(SortError::Cancelled);
        }
        Ok(())
    }
}

/// Emits events, de-duplicating progress percentages.
#[derive(Debug, Default)]
pub struct ProgressReporter {
    sender: Option<Sender<SortEvent>>,
    last_percent: Option<u8>,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(sender: Option<Sender<SortEvent>>) -> Self {
        Self {
            sender,
            last_percent: None,
        }
    }

    pub fn emit(&self, event: SortEvent) {
        if let Some(sender) = &self.sender {
            // Dropped events are acceptable; progress must never block sorting
            let _ = sender.try_send(event);
        }
    }

    /// Report `done` out of `total`, mapped into the `[from, to]` percent band.
    pub fn report(&mut self, done: u64, total: u64, from: u8, to: u8) {
        let fraction = if total == 0 {
            1.0
        } else {
            (done as f64 / total as f64).min(1.0)
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // 0-100
        let percent = from + (fraction * f64::from(to - from)) as u8;

        if self.last_percent != Some(percent) {
            self.last_percent = Some(percent);
            self.emit(SortEvent::Progress { percent });
        }
    }

    /// Emit the terminal event for a run that ended in `error`.
    pub fn finish_with_error(&self, error: &SortError) {
        let event = match error {
            SortError::Cancelled => SortEvent::Cancelled,
            other => SortEvent::Failed {
                kind: other.kind(),
                message: other.to_string(),
            },
        };
        self.emit(event);
    }
}
