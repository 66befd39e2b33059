//! Background listener that cancels speech when the stop keyword is heard.
//!
//! The monitor runs a blocking capture loop on its own OS thread for the
//! lifetime of the process.  Its only effect on the rest of the assistant
//! is raising the [`CancellationFlag`]:
//!
//! ```text
//! loop {
//!     capture_utterance() ──▶ Ok(text) ── contains stop keyword? ──▶ flag.raise()
//!                        └──▶ Err(_)   ── ignored (service errors back off)
//! }
//! ```
//!
//! Shutdown is cooperative: [`InterruptHandle::shutdown`] (or dropping the
//! handle) sets a stop flag that the loop checks between captures.  A capture
//! already in progress runs to its own timeout first.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::interrupt::flag::CancellationFlag;
use crate::listen::{CaptureFailure, SpeechCaptureService};
use crate::router::contains_keyword;

// ---------------------------------------------------------------------------
// InterruptMonitor
// ---------------------------------------------------------------------------

pub struct InterruptMonitor {
    capture: Arc<dyn SpeechCaptureService>,
    flag: CancellationFlag,
    stop_keyword: String,
    error_backoff: Duration,
}

impl InterruptMonitor {
    pub fn new(
        capture: Arc<dyn SpeechCaptureService>,
        flag: CancellationFlag,
        stop_keyword: impl Into<String>,
        error_backoff: Duration,
    ) -> Self {
        Self {
            capture,
            flag,
            stop_keyword: stop_keyword.into(),
            error_backoff,
        }
    }

    /// Raise the flag if `text` contains the stop keyword.  Returns whether it did.
    pub fn inspect(&self, text: &str) -> bool {
        if contains_keyword(text, &self.stop_keyword) {
            self.flag.raise();
            true
        } else {
            false
        }
    }

    /// One capture attempt.
    fn poll_once(&self) {
        match self.capture.capture_utterance() {
            Ok(text) => {
                log::debug!("interrupt: heard {text:?}");
                if self.inspect(&text) {
                    log::info!("interrupt: stop keyword heard, cancelling speech");
                }
            }
            Err(CaptureFailure::NoSpeechUnderstood) => {}
            Err(CaptureFailure::ServiceUnavailable(e)) => {
                log::debug!("interrupt: capture failed: {e}");
                std::thread::sleep(self.error_backoff);
            }
        }
    }

    /// Move the monitor onto a dedicated OS thread named `interrupt-monitor`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be created.
    pub fn spawn(self) -> std::io::Result<InterruptHandle> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let thread = std::thread::Builder::new()
            .name("interrupt-monitor".into())
            .spawn(move || {
                log::info!("interrupt: listening for {:?}", self.stop_keyword);
                while !shutdown_clone.load(Ordering::Relaxed) {
                    self.poll_once();
                }
                log::debug!("interrupt: monitor stopped");
            })?;

        Ok(InterruptHandle {
            shutdown,
            thread: Some(thread),
        })
    }
}

// ---------------------------------------------------------------------------
// InterruptHandle
// ---------------------------------------------------------------------------

/// Handle to a running [`InterruptMonitor`] thread.
pub struct InterruptHandle {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl InterruptHandle {
    /// Ask the monitor to stop after its current capture.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Request shutdown and wait for the thread to exit.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("interrupt: monitor thread panicked");
            }
        }
    }
}

impl Drop for InterruptHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
