//! Test-scoped Docker lifecycle management
//!
//! This crate is the Docker core of the ictest integration-testing
//! framework. It provisions a per-test network, ties every downstream
//! container and volume to the test through a label scheme, and guarantees
//! deterministic, leak-free teardown of everything it labeled — including
//! when the test fails, times out, or a previous run was interrupted.
//!
//! # Lifecycle
//!
//! ```text
//! docker_setup ──► eager reap ──► create network ──► test runs
//!                                                       │
//!         logs ◄── coverage ◄── stop ◄── remove ◄── teardown
//!                                        (then prune volumes, networks)
//! ```
//!
//! Tests call [`docker_setup`] (or the fallible [`try_docker_setup`]) with a
//! [`shared::TestSink`]; teardown is registered on the sink and re-runs the
//! reaper with log capture and coverage export enabled.

pub mod cleanup;
pub mod config;
pub mod coverage;
pub mod error;
pub mod labels;
pub mod services;
pub mod setup;
pub mod traits;

// Re-export commonly used types
pub use cleanup::DockerCleanup;
pub use config::{keep_volumes_on_failure, LogMode, TeardownPolicy};
pub use coverage::CoverageExporter;
pub use error::{HarnessError, HarnessResult};
pub use services::DockerEngine;
pub use setup::{docker_setup, setup_with_engine, try_docker_setup};
pub use traits::{
    ContainerBrief, ContainerEngine, MockContainerEngine, NetworkPruneReport, VolumePruneReport,
};
