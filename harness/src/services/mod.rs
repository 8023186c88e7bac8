//! Service implementations
//!
//! Production implementations of the harness seams. Everything in here does
//! real I/O against the Docker Engine; the test suites run against the
//! generated mocks instead.

pub mod docker;

// Re-export the service implementation
pub use docker::DockerEngine;
