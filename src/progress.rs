//! Progress reporting shared by all builders.
//!
//! Builders emit `(percent, status)` pairs through a [`ProgressReporter`].
//! The [`ProgressTracker`] sitting in front of the reporter keeps the
//! sequence non-decreasing and reserves `100` for the final `"Done!"` event.
//!
//! # Example
//!
//! ```
//! use hanu::progress::{channel, ProgressEvent, ProgressReporter};
//!
//! let (reporter, events) = channel();
//! reporter.on_progress(40, "Building Excel spreadsheet…");
//! drop(reporter);
//!
//! let received: Vec<ProgressEvent> = events.iter().collect();
//! assert_eq!(received[0].percent, 40);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;

use crate::error::{Error, Result};

/// Status text of the final event of every successful job.
pub const DONE_STATUS: &str = "Done!";

/// A single progress update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// Completion in percent (0..=100)
    pub percent: u8,
    /// Human-readable status line
    pub status: String,
}

impl ProgressEvent {
    /// Create a new event.
    pub fn new(percent: u8, status: impl Into<String>) -> Self {
        Self {
            percent,
            status: status.into(),
        }
    }

    /// Whether this is the terminal success event.
    pub fn is_done(&self) -> bool {
        self.percent == 100 && self.status == DONE_STATUS
    }
}

/// Receives progress updates from a running job.
///
/// Implementations must not block: the job calls this from its worker and
/// keeps going as soon as the call returns.
pub trait ProgressReporter: Send + Sync {
    /// Called for every update, in emission order.
    fn on_progress(&self, percent: u8, status: &str);
}

impl<F> ProgressReporter for F
where
    F: Fn(u8, &str) + Send + Sync,
{
    fn on_progress(&self, percent: u8, status: &str) {
        self(percent, status)
    }
}

/// Reporter that drops every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_progress(&self, _percent: u8, _status: &str) {}
}

/// Reporter that forwards updates into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: Sender<ProgressEvent>,
}

impl ProgressReporter for ChannelReporter {
    fn on_progress(&self, percent: u8, status: &str) {
        // A consumer that went away is not the job's problem.
        let _ = self.tx.send(ProgressEvent::new(percent, status));
    }
}

/// Create a reporter/receiver pair. Events arrive in emission order.
pub fn channel() -> (ChannelReporter, Receiver<ProgressEvent>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ChannelReporter { tx }, rx)
}

/// Cooperative cancellation flag shared between a job and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Running progress state of one job.
pub struct ProgressTracker<'a> {
    reporter: &'a dyn ProgressReporter,
    cancel: Option<CancelToken>,
    percent: u8,
    status: String,
    finished: bool,
}

impl<'a> ProgressTracker<'a> {
    /// Start tracking at 0%.
    pub fn new(reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            reporter,
            cancel: None,
            percent: 0,
            status: String::new(),
            finished: false,
        }
    }

    /// Attach a cancellation token checked by [`checkpoint`](Self::checkpoint).
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Report progress. The percent never goes below the last reported value
    /// and stays below 100 until [`finish`](Self::finish).
    pub fn report(&mut self, percent: u8, status: impl Into<String>) {
        if self.finished {
            return;
        }
        self.percent = self.percent.max(percent.min(99));
        self.status = status.into();
        self.reporter.on_progress(self.percent, &self.status);
    }

    /// Report `base + span * done / total`, truncated like the status bars
    /// the percentages were tuned for.
    pub fn report_fraction(
        &mut self,
        base: u8,
        span: u8,
        done: usize,
        total: usize,
        status: impl Into<String>,
    ) {
        self.report(scaled(base, span, done, total), status);
    }

    /// Emit the terminal `(100, "Done!")` event.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.percent = 100;
        self.status = DONE_STATUS.to_string();
        self.reporter.on_progress(100, DONE_STATUS);
    }

    /// Fail with [`Error::Cancelled`] if cancellation was requested.
    pub fn checkpoint(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    /// Last reported percent.
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Last reported status.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Whether the terminal event was emitted.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// `base + span * done / total`, truncated toward zero.
pub fn scaled(base: u8, span: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return base.saturating_add(span);
    }
    let fraction = (done.min(total) as f32) / (total as f32);
    base.saturating_add((fraction * span as f32) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<(u8, String)>>);

    impl ProgressReporter for Recorder {
        fn on_progress(&self, percent: u8, status: &str) {
            self.0.lock().unwrap().push((percent, status.to_string()));
        }
    }

    #[test]
    fn test_scaled() {
        assert_eq!(scaled(5, 30, 1, 3), 15);
        assert_eq!(scaled(5, 30, 3, 3), 35);
        assert_eq!(scaled(40, 45, 0, 10), 40);
        assert_eq!(scaled(10, 82, 1, 3), 37);
        assert_eq!(scaled(50, 40, 0, 0), 90);
    }

    #[test]
    fn test_tracker_is_monotonic() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        let mut tracker = ProgressTracker::new(&recorder);
        tracker.report(15, "Found 10 pages…");
        tracker.report(8, "Extracting text from page 1/10…");
        tracker.report(100, "Saving…");
        tracker.finish();
        tracker.report(50, "late");

        let events = recorder.0.into_inner().unwrap();
        let percents: Vec<u8> = events.iter().map(|(p, _)| *p).collect();
        assert_eq!(percents, vec![15, 15, 99, 100]);
        assert_eq!(events.last().unwrap().1, "Done!");
    }

    #[test]
    fn test_checkpoint() {
        let token = CancelToken::new();
        let tracker = ProgressTracker::new(&NoopReporter).with_cancel(token.clone());
        assert!(tracker.checkpoint().is_ok());
        token.cancel();
        assert!(matches!(tracker.checkpoint(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_channel_preserves_order() {
        let (reporter, events) = channel();
        for p in [5u8, 10, 20] {
            reporter.on_progress(p, "step");
        }
        drop(reporter);
        let got: Vec<u8> = events.iter().map(|e| e.percent).collect();
        assert_eq!(got, vec![5, 10, 20]);
    }

    #[test]
    fn test_closure_reporter() {
        let seen = Mutex::new(0u8);
        let reporter = |p: u8, _: &str| *seen.lock().unwrap() = p;
        reporter.on_progress(42, "x");
        assert_eq!(*seen.lock().unwrap(), 42);
    }

    #[test]
    fn test_event_is_done() {
        assert!(ProgressEvent::new(100, "Done!").is_done());
        assert!(!ProgressEvent::new(99, "Done!").is_done());
    }

    #[test]
    fn test_event_json() {
        let json = serde_json::to_string(&ProgressEvent::new(40, "Building Excel spreadsheet…")).unwrap();
        assert_eq!(json, r#"{"percent":40,"status":"Building Excel spreadsheet…"}"#);
    }
}
