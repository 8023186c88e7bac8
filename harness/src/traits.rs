//! Container engine seam
//!
//! The reaper, the coverage exporter, and setup all talk to Docker through
//! this trait. The production implementation is
//! [`crate::services::DockerEngine`]; the generated [`MockContainerEngine`]
//! carries the test suites. Every listing and prune operation is scoped to
//! one test identity — implementations must apply the
//! [`crate::labels::CLEANUP_LABEL`] filter, never enumerate engine-wide.

use async_trait::async_trait;

use crate::error::HarnessResult;

/// Identity of a labeled container, as returned by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerBrief {
    pub id: String,
    /// Docker names, usually one entry with a leading slash.
    pub names: Vec<String>,
}

impl ContainerBrief {
    /// First name if present, otherwise the short (12 character) id.
    pub fn display_name(&self) -> String {
        match self.names.first() {
            Some(name) => name.trim_start_matches('/').to_string(),
            None => self.id.chars().take(12).collect(),
        }
    }
}

/// Outcome of a label-scoped volume prune.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumePruneReport {
    pub deleted: Vec<String>,
    pub space_reclaimed: u64,
}

/// Outcome of a label-scoped network prune.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkPruneReport {
    pub deleted: Vec<String>,
}

/// Narrow, test-scoped view of the Docker Engine.
#[mockall::automock]
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// List all containers (running or not) labeled with `test_name`.
    async fn list_test_containers(&self, test_name: &str) -> HarnessResult<Vec<ContainerBrief>>;

    /// Capture the tail of a container's stdout and stderr.
    async fn container_logs(&self, container_id: &str, tail: &str) -> HarnessResult<String>;

    /// Environment entries (`KEY=value`) of a container.
    async fn container_env(&self, container_id: &str) -> HarnessResult<Vec<String>>;

    /// Request a graceful stop with the given timeout.
    async fn stop_container(&self, container_id: &str, timeout_secs: i64) -> HarnessResult<()>;

    /// Wait for the container to leave the running state; returns its exit
    /// status code.
    async fn wait_not_running(&self, container_id: &str) -> HarnessResult<i64>;

    /// Force-remove a container without touching its volumes.
    async fn remove_container(&self, container_id: &str) -> HarnessResult<()>;

    /// Read a path out of the container's filesystem as a tar archive.
    async fn export_path(&self, container_id: &str, path: &str) -> HarnessResult<Vec<u8>>;

    /// Prune volumes labeled with `test_name`.
    async fn prune_volumes(&self, test_name: &str) -> HarnessResult<VolumePruneReport>;

    /// Prune networks labeled with `test_name`.
    async fn prune_networks(&self, test_name: &str) -> HarnessResult<NetworkPruneReport>;

    /// Create a network labeled with `test_name`; returns the network id.
    /// Duplicate names are rejected by the engine.
    async fn create_network(&self, name: &str, test_name: &str) -> HarnessResult<String>;
}
