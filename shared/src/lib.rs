//! Shared seams for the ictest harness crates
//!
//! This crate provides the test sink abstraction through which the harness
//! reports to the surrounding test framework, plus the tracing bootstrap
//! used by every crate in the workspace.

pub mod logging;
pub mod sink;

// Re-export commonly used types
pub use sink::{CleanupFn, CleanupFuture, RecordingSink, TestSink};
