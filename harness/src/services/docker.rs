//! Bollard-backed container engine
//!
//! Thin mapping from the [`ContainerEngine`] seam onto the Docker Engine
//! API. Connection comes from the ambient environment (`DOCKER_HOST` when
//! set, the local socket otherwise) and the API version is negotiated with
//! the daemon before the handle is handed out.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{
    DownloadFromContainerOptions, InspectContainerOptions, ListContainersOptions, LogsOptions,
    RemoveContainerOptions, StopContainerOptions, WaitContainerOptions,
};
use bollard::network::{CreateNetworkOptions, PruneNetworksOptions};
use bollard::volume::PruneVolumesOptions;
use bollard::Docker;
use futures_util::stream::StreamExt;

use crate::error::{HarnessError, HarnessResult};
use crate::labels::{cleanup_label_filter, CLEANUP_LABEL};
use crate::traits::{ContainerBrief, ContainerEngine, NetworkPruneReport, VolumePruneReport};

/// Production [`ContainerEngine`] backed by the Docker Engine API.
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect from the ambient environment and negotiate the API version.
    ///
    /// Failure here is fatal to the calling test: nothing in the harness can
    /// proceed without a working engine handle.
    pub async fn connect() -> HarnessResult<Self> {
        let docker = match std::env::var("DOCKER_HOST") {
            Ok(host) if host.starts_with("tcp://") || host.starts_with("http://") => {
                Docker::connect_with_http_defaults()
            }
            _ => Docker::connect_with_local_defaults(),
        }
        .map_err(HarnessError::Connect)?;

        let docker = docker
            .negotiate_version()
            .await
            .map_err(HarnessError::Connect)?;

        tracing::debug!("🐳 Connected to docker engine");
        Ok(Self { docker })
    }

    fn label_filters(test_name: &str) -> HashMap<String, Vec<String>> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![cleanup_label_filter(test_name)]);
        filters
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn list_test_containers(&self, test_name: &str) -> HarnessResult<Vec<ContainerBrief>> {
        let options = ListContainersOptions::<String> {
            all: true,
            filters: Self::label_filters(test_name),
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(containers
            .into_iter()
            .map(|c| ContainerBrief {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
            })
            .collect())
    }

    async fn container_logs(&self, container_id: &str, tail: &str) -> HarnessResult<String> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: tail.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.logs(container_id, Some(options));
        let mut output = String::new();
        while let Some(chunk) = stream.next().await {
            output.push_str(&String::from_utf8_lossy(&chunk?.into_bytes()));
        }
        Ok(output)
    }

    async fn container_env(&self, container_id: &str) -> HarnessResult<Vec<String>> {
        let inspect = self
            .docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await?;
        Ok(inspect.config.and_then(|c| c.env).unwrap_or_default())
    }

    async fn stop_container(&self, container_id: &str, timeout_secs: i64) -> HarnessResult<()> {
        self.docker
            .stop_container(container_id, Some(StopContainerOptions { t: timeout_secs }))
            .await?;
        Ok(())
    }

    async fn wait_not_running(&self, container_id: &str) -> HarnessResult<i64> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };
        let mut stream = self.docker.wait_container(container_id, Some(options));
        match stream.next().await {
            Some(response) => Ok(response?.status_code),
            // Stream ended without a response: the container is not running.
            None => Ok(0),
        }
    }

    async fn remove_container(&self, container_id: &str) -> HarnessResult<()> {
        // Volumes are deliberately not cascaded here; they are pruned
        // separately so the keep-volumes-on-failure policy can apply.
        let options = RemoveContainerOptions {
            force: true,
            v: false,
            ..Default::default()
        };
        self.docker
            .remove_container(container_id, Some(options))
            .await?;
        Ok(())
    }

    async fn export_path(&self, container_id: &str, path: &str) -> HarnessResult<Vec<u8>> {
        let options = DownloadFromContainerOptions {
            path: path.to_string(),
        };
        let mut stream = self.docker.download_from_container(container_id, Some(options));
        let mut bytes = Vec::new();
        while let Some(chunk) = stream.next().await {
            bytes.extend_from_slice(&chunk?);
        }
        Ok(bytes)
    }

    async fn prune_volumes(&self, test_name: &str) -> HarnessResult<VolumePruneReport> {
        let options = PruneVolumesOptions {
            filters: Self::label_filters(test_name),
        };
        let response = self.docker.prune_volumes(Some(options)).await?;
        Ok(VolumePruneReport {
            deleted: response.volumes_deleted.unwrap_or_default(),
            space_reclaimed: response.space_reclaimed.unwrap_or(0).max(0) as u64,
        })
    }

    async fn prune_networks(&self, test_name: &str) -> HarnessResult<NetworkPruneReport> {
        let options = PruneNetworksOptions {
            filters: Self::label_filters(test_name),
        };
        let response = self.docker.prune_networks(Some(options)).await?;
        Ok(NetworkPruneReport {
            deleted: response.networks_deleted.unwrap_or_default(),
        })
    }

    async fn create_network(&self, name: &str, test_name: &str) -> HarnessResult<String> {
        let options = CreateNetworkOptions {
            name: name.to_string(),
            check_duplicate: true,
            labels: HashMap::from([(CLEANUP_LABEL.to_string(), test_name.to_string())]),
            ..Default::default()
        };
        let response = self
            .docker
            .create_network(options)
            .await
            .map_err(HarnessError::NetworkCreate)?;
        Ok(response.id.unwrap_or_default())
    }
}
