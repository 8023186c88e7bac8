//! Test sink abstraction
//!
//! The harness never talks to a test framework directly. Everything it needs
//! from the surrounding test — its name, whether it failed, a place to write
//! human-readable output, and a place to hang teardown work — goes through
//! the [`TestSink`] trait. Test runners embed the harness by implementing
//! this trait; [`RecordingSink`] is a ready-made in-memory implementation
//! used by the workspace's own tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Boxed future produced by a registered cleanup.
pub type CleanupFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A registered cleanup. The sink hands itself back when the cleanup runs so
/// the teardown can log through it and observe the final failed state.
pub type CleanupFn = Box<dyn FnOnce(Arc<dyn TestSink>) -> CleanupFuture + Send + 'static>;

/// Handle to the currently running test.
///
/// `name` is the test identity used to label every Docker resource the
/// harness creates, so it must be unique per concurrently running test
/// against a single Docker engine.
pub trait TestSink: Send + Sync {
    /// Name of the current test.
    fn name(&self) -> String;

    /// Whether the test has failed.
    fn failed(&self) -> bool;

    /// Write a formatted line of test output.
    fn log(&self, message: &str);

    /// Register teardown work to run when the test scope ends.
    fn register_cleanup(&self, cleanup: CleanupFn);
}

/// In-memory [`TestSink`] implementation.
///
/// Records every logged line, tracks the failed flag, and stores registered
/// cleanups until [`RecordingSink::run_cleanups`] drains them. Cleanups run
/// most-recently-registered first, matching the usual test-framework
/// cleanup order.
pub struct RecordingSink {
    name: String,
    failed: AtomicBool,
    lines: Mutex<Vec<String>>,
    cleanups: Mutex<Vec<CleanupFn>>,
}

impl RecordingSink {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            failed: AtomicBool::new(false),
            lines: Mutex::new(Vec::new()),
            cleanups: Mutex::new(Vec::new()),
        })
    }

    /// Mark the test as failed.
    pub fn fail(&self) {
        self.failed.store(true, Ordering::Relaxed);
    }

    /// All lines logged so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Whether any logged line contains `needle`.
    pub fn logged(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }

    /// Number of cleanups registered and not yet run.
    pub fn pending_cleanups(&self) -> usize {
        self.cleanups.lock().unwrap().len()
    }

    /// Drain and run all registered cleanups, most recent first.
    pub async fn run_cleanups(self: &Arc<Self>) {
        loop {
            let cleanup = self.cleanups.lock().unwrap().pop();
            match cleanup {
                Some(cleanup) => cleanup(self.clone() as Arc<dyn TestSink>).await,
                None => break,
            }
        }
    }
}

impl TestSink for RecordingSink {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }

    fn log(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }

    fn register_cleanup(&self, cleanup: CleanupFn) {
        self.cleanups.lock().unwrap().push(cleanup);
    }
}
