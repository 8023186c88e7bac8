//! Coverage artifact export
//!
//! Before containers are removed, any container that advertises a coverage
//! directory through its environment gets that directory copied out to the
//! host. The whole exporter is best-effort: it runs inside a panic boundary
//! and every per-container failure is logged and skipped, because losing
//! coverage data must never stop teardown from reclaiming resources.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::FutureExt;
use shared::TestSink;

use crate::config::{CONTAINER_COVERAGE_ENV, COVERAGE_OUTPUT_ENV};
use crate::error::HarnessResult;
use crate::traits::ContainerEngine;

/// Copies in-container coverage directories to the host.
pub struct CoverageExporter {
    engine: Arc<dyn ContainerEngine>,
    output_root: Option<PathBuf>,
}

impl CoverageExporter {
    /// Exporter writing under `ICTEST_GOCOVERDIR`, or `coverage/<test-name>`
    /// when the variable is unset.
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self {
            engine,
            output_root: None,
        }
    }

    /// Exporter writing under an explicit host directory.
    pub fn with_output_root(engine: Arc<dyn ContainerEngine>, output_root: PathBuf) -> Self {
        Self {
            engine,
            output_root: Some(output_root),
        }
    }

    fn resolve_output_root(&self, test_name: &str) -> PathBuf {
        if let Some(root) = &self.output_root {
            return root.clone();
        }
        match std::env::var(COVERAGE_OUTPUT_ENV) {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => PathBuf::from("coverage").join(test_name),
        }
    }

    /// Export coverage data from every labeled container.
    ///
    /// Never fails and never panics outward; repeat runs overwrite the same
    /// output files.
    pub async fn export(&self, sink: &dyn TestSink) {
        if let Err(panic) = AssertUnwindSafe(self.export_inner(sink)).catch_unwind().await {
            sink.log(&format!(
                "Failed to export coverage data: {}",
                panic_message(panic.as_ref())
            ));
        }
    }

    async fn export_inner(&self, sink: &dyn TestSink) {
        let test_name = sink.name();
        let output_root = self.resolve_output_root(&test_name);

        let containers = match self.engine.list_test_containers(&test_name).await {
            Ok(containers) => containers,
            Err(e) => {
                sink.log(&format!(
                    "Failed to list containers during coverage export: {e}"
                ));
                return;
            }
        };

        for container in &containers {
            let env = match self.engine.container_env(&container.id).await {
                Ok(env) => env,
                Err(e) => {
                    sink.log(&format!("Failed to inspect container {}: {e}", container.id));
                    continue;
                }
            };

            // Coverage not enabled for this container.
            let Some(coverage_dir) = coverage_dir_from_env(&env) else {
                continue;
            };

            let container_name = container.display_name();
            sink.log(&format!(
                "Exporting coverage data {} from container {}",
                coverage_dir, container_name
            ));

            let archive = match self.engine.export_path(&container.id, &coverage_dir).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    sink.log(&format!(
                        "Failed to copy coverage data from container {}: {e}",
                        container.id
                    ));
                    continue;
                }
            };

            let container_dir = output_root.join(&container_name);
            if let Err(e) = std::fs::create_dir_all(&container_dir) {
                sink.log(&format!(
                    "Failed to create coverage data directory for container {}: {e}",
                    container.id
                ));
                continue;
            }

            if let Err(e) = extract_file_entries(&archive, &container_dir) {
                sink.log(&format!(
                    "Failed to extract coverage data from container {}: {e}",
                    container.id
                ));
            }
        }
    }
}

/// Value of the in-container coverage directory variable, if set and
/// non-empty.
fn coverage_dir_from_env(env: &[String]) -> Option<String> {
    env.iter()
        .find_map(|entry| {
            entry
                .strip_prefix(CONTAINER_COVERAGE_ENV)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|dir| !dir.is_empty())
        .map(str::to_string)
}

/// Extract the file entries of a tar archive flat into `output_dir`.
///
/// Directory entries are skipped; each file lands at
/// `output_dir/<basename>` regardless of how deep it sat in the archive.
fn extract_file_entries(archive: &[u8], output_dir: &Path) -> HarnessResult<()> {
    let mut archive = tar::Archive::new(archive);
    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_dir() {
            continue;
        }
        let Some(file_name) = entry.path()?.file_name().map(|n| n.to_os_string()) else {
            continue;
        };
        let mut out_file = std::fs::File::create(output_dir.join(file_name))?;
        std::io::copy(&mut entry, &mut out_file)?;
    }
    Ok(())
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
