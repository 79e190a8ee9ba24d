//! Job runner.
//!
//! An [`Engine`] runs at most one conversion at a time. [`Engine::run`]
//! converts on the calling thread; [`Engine::spawn`] moves the job to a
//! worker thread and returns a [`JobHandle`] whose event channel the caller
//! drains from wherever it likes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;

use crate::convert::{ConversionJob, ConvertOptions, TargetFormat};
use crate::error::{Error, Result};
use crate::progress::{self, CancelToken, ProgressEvent, ProgressReporter};
use crate::sink::ByteSink;
use crate::source::PdfSource;

/// Holds the busy flag for the lifetime of one job.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::Busy)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Conversion engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: ConvertOptions,
    busy: Arc<AtomicBool>,
}

impl Engine {
    /// Engine with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with custom options.
    pub fn with_options(options: ConvertOptions) -> Self {
        Self {
            options,
            busy: Arc::default(),
        }
    }

    /// Options used for every job.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Whether a job is currently running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run one job on the calling thread.
    pub fn run<S: ByteSink + ?Sized>(
        &self,
        source: &PdfSource,
        format: TargetFormat,
        sink: &mut S,
        reporter: &dyn ProgressReporter,
    ) -> Result<()> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        ConversionJob::new(source, &self.options, reporter).run(format, sink)
    }

    /// Run one job on a worker thread.
    ///
    /// The source and sink move into the job; the sink comes back from
    /// [`JobHandle::join`]. Fails with [`Error::Busy`] right away if another
    /// job is still running.
    pub fn spawn<S>(&self, source: PdfSource, format: TargetFormat, sink: S) -> Result<JobHandle<S>>
    where
        S: ByteSink + Send + 'static,
    {
        let guard = BusyGuard::acquire(&self.busy)?;
        let (reporter, events) = progress::channel();
        let cancel = CancelToken::new();
        let options = self.options.clone();
        let token = cancel.clone();

        let thread = thread::Builder::new()
            .name("hanu-worker".to_string())
            .spawn(move || {
                let _guard = guard;
                let mut sink = sink;
                ConversionJob::new(&source, &options, &reporter)
                    .with_cancel(token)
                    .run(format, &mut sink)
                    .map(|()| sink)
            })?;

        Ok(JobHandle {
            events,
            cancel,
            thread,
        })
    }
}

/// A job running on a worker thread.
pub struct JobHandle<S> {
    events: Receiver<ProgressEvent>,
    cancel: CancelToken,
    thread: JoinHandle<Result<S>>,
}

impl<S> JobHandle<S> {
    /// Progress events in emission order. The channel disconnects when the
    /// job ends.
    pub fn events(&self) -> &Receiver<ProgressEvent> {
        &self.events
    }

    /// Ask the job to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the worker has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the job and get the sink back.
    pub fn join(self) -> Result<S> {
        self.thread
            .join()
            .map_err(|_| Error::Other("conversion worker panicked".to_string()))?
    }
}
