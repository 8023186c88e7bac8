//! Label-scoped resource reaper
//!
//! [`DockerCleanup`] tears down everything a test labeled: it captures
//! container logs (for failed runs), exports coverage, stops and removes
//! containers, then prunes volumes and networks. The phase order is
//! load-bearing — coverage has to be copied while the container filesystem
//! still exists, volumes can only go after their containers, and networks
//! come last because containers detach on removal.
//!
//! Teardown never propagates errors. Per-resource failures are logged
//! through the test sink and the pipeline moves on, so a single stubborn
//! container cannot leak the rest of the environment.

use std::sync::Arc;
use std::time::Duration;

use shared::TestSink;
use tokio::time::timeout;

use crate::config::TeardownPolicy;
use crate::coverage::CoverageExporter;
use crate::error::HarnessResult;
use crate::traits::ContainerEngine;

/// Grace period granted to a container's graceful stop.
const CONTAINER_STOP_TIMEOUT_SECS: i64 = 10;

/// Extra margin on top of the stop timeout while waiting for not-running.
const WAIT_GRACE: Duration = Duration::from_millis(500);

/// Prune attempts before a persistent conflict is reported.
const PRUNE_RETRY_ATTEMPTS: u32 = 10;

/// Fixed delay between prune attempts.
const PRUNE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Teardown pipeline for one test's Docker resources.
pub struct DockerCleanup {
    engine: Arc<dyn ContainerEngine>,
    /// Pre-remove callback; when set, coverage is exported from each
    /// container before it is removed.
    exporter: Option<CoverageExporter>,
}

impl DockerCleanup {
    pub fn new(engine: Arc<dyn ContainerEngine>, exporter: Option<CoverageExporter>) -> Self {
        Self { engine, exporter }
    }

    /// Run the full teardown pipeline with flags from the environment.
    pub async fn run(&self, sink: &dyn TestSink) {
        self.run_with_policy(sink, &TeardownPolicy::from_env()).await;
    }

    /// Run the full teardown pipeline under an explicit policy.
    pub async fn run_with_policy(&self, sink: &dyn TestSink, policy: &TeardownPolicy) {
        let test_name = sink.name();
        tracing::debug!(test = %test_name, "🧹 Starting docker cleanup");

        let containers = match self.engine.list_test_containers(&test_name).await {
            Ok(containers) => containers,
            Err(e) => {
                sink.log(&format!("Failed to list containers during docker cleanup: {e}"));
                return;
            }
        };

        for container in &containers {
            if policy.should_capture_logs(sink.failed()) {
                match self
                    .engine
                    .container_logs(&container.id, &policy.log_tail)
                    .await
                {
                    Ok(logs) => sink.log(&format!(
                        "\n\nContainer logs - {{{}}}\n{}",
                        container.names.join(" "),
                        logs
                    )),
                    Err(e) => sink.log(&format!(
                        "Failed to read logs of container {} during docker cleanup: {e}",
                        container.id
                    )),
                }
            }

            if policy.keep_containers {
                continue;
            }

            if let Err(e) = self
                .engine
                .stop_container(&container.id, CONTAINER_STOP_TIMEOUT_SECS)
                .await
            {
                if !e.is_benign_stop_error() {
                    sink.log(&format!(
                        "Failed to stop container {} during docker cleanup: {e}",
                        container.id
                    ));
                }
            }

            let wait_budget = Duration::from_secs(CONTAINER_STOP_TIMEOUT_SECS as u64) + WAIT_GRACE;
            match timeout(wait_budget, self.engine.wait_not_running(&container.id)).await {
                Err(_) => sink.log(&format!("Timed out waiting for container {}", container.id)),
                Ok(Err(e)) => sink.log(&format!(
                    "Failed to wait for container {} during docker cleanup: {e}",
                    container.id
                )),
                // Exit status of a container being torn down is irrelevant.
                Ok(Ok(_status)) => {}
            }

            // Export coverage data from the container before removing it.
            if let Some(exporter) = &self.exporter {
                exporter.export(sink).await;
            }

            if let Err(e) = self.engine.remove_container(&container.id).await {
                sink.log(&format!(
                    "Failed to remove container {} during docker cleanup: {e}",
                    container.id
                ));
            }
        }

        if policy.keep_containers {
            sink.log("Keeping containers - Docker cleanup skipped");
            return;
        }

        self.prune_volumes_with_retry(sink, policy).await;
        self.prune_networks_with_retry(sink).await;
        tracing::debug!(test = %test_name, "✅ Docker cleanup finished");
    }

    async fn prune_volumes_with_retry(&self, sink: &dyn TestSink, policy: &TeardownPolicy) {
        if policy.keep_volumes_on_failure && sink.failed() {
            return;
        }

        let test_name = sink.name();
        match retry_on_conflict(|| self.engine.prune_volumes(&test_name)).await {
            Ok(report) => {
                if !report.deleted.is_empty() {
                    sink.log(&format!(
                        "Pruned {} volumes, reclaiming approximately {:.1} MB",
                        report.deleted.len(),
                        report.space_reclaimed as f64 / (1024.0 * 1024.0)
                    ));
                }
            }
            Err(e) => sink.log(&format!("Failed to prune volumes during docker cleanup: {e}")),
        }
    }

    async fn prune_networks_with_retry(&self, sink: &dyn TestSink) {
        let test_name = sink.name();
        match retry_on_conflict(|| self.engine.prune_networks(&test_name)).await {
            Ok(report) => {
                if !report.deleted.is_empty() {
                    sink.log(&format!("Pruned unused networks: {:?}", report.deleted));
                }
            }
            Err(e) => sink.log(&format!("Failed to prune networks during docker cleanup: {e}")),
        }
    }
}

/// Retry an engine operation while it reports a conflict.
///
/// Conflicts mean another prune is in progress on the engine — the one
/// cross-test interaction the label scheme cannot prevent. Any other error
/// is returned immediately.
pub(crate) async fn retry_on_conflict<T, F, Fut>(mut operation: F) -> HarnessResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = HarnessResult<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_conflict() && attempt < PRUNE_RETRY_ATTEMPTS => {
                attempt += 1;
                tokio::time::sleep(PRUNE_RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    }
}
