//! Coverage export integration harness
//!
//! Exercises the exporter end to end against a mocked engine: tar archives
//! flow out of the "container", file entries land flat under the per-test
//! output directory, and nothing the exporter does — error or panic — can
//! derail the teardown that invoked it.

mod common;
use common::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use harness::{
    ContainerBrief, ContainerEngine, CoverageExporter, DockerCleanup, HarnessError, HarnessResult,
    MockContainerEngine, NetworkPruneReport, TeardownPolicy, VolumePruneReport,
};
use shared::RecordingSink;

fn coverage_env() -> Vec<String> {
    vec![
        "PATH=/usr/local/sbin:/usr/local/bin".to_string(),
        "GOCOVERDIR=/coverage".to_string(),
    ]
}

/// The canonical archive: one file at the root, one directory, one file
/// nested inside it.
fn sample_archive() -> Vec<u8> {
    tar_archive(&[
        ("covmeta.1234", Some(b"meta".as_slice())),
        ("nested/", None),
        ("nested/covcounters.5678", Some(b"counters".as_slice())),
    ])
}

/// Files and directory entries in one archive produce exactly the file
/// entries on disk, flat under the container's output directory.
#[tokio::test]
async fn test_tar_archive_extracts_flat_file_entries() {
    common::init();
    let output = tempfile::tempdir().unwrap();

    let mut engine = MockContainerEngine::new();
    engine
        .expect_list_test_containers()
        .times(1)
        .returning(|_| Ok(vec![brief("c-1", "validator-0")]));
    engine
        .expect_container_env()
        .times(1)
        .returning(|_| Ok(coverage_env()));
    engine
        .expect_export_path()
        .times(1)
        .withf(|id, path| id == "c-1" && path == "/coverage")
        .returning(|_, _| Ok(sample_archive()));

    let sink = RecordingSink::new("TestCoverage");
    let exporter =
        CoverageExporter::with_output_root(Arc::new(engine), output.path().to_path_buf());
    exporter.export(sink.as_ref()).await;

    let container_dir = output.path().join("validator-0");
    assert_eq!(std::fs::read(container_dir.join("covmeta.1234")).unwrap(), b"meta");
    assert_eq!(
        std::fs::read(container_dir.join("covcounters.5678")).unwrap(),
        b"counters"
    );
    assert!(
        !container_dir.join("nested").exists(),
        "directory entries must be skipped"
    );
    assert!(sink.logged("Exporting coverage data /coverage from container validator-0"));
}

/// Containers without the coverage variable are skipped entirely; the
/// filesystem copy is never requested.
#[tokio::test]
async fn test_container_without_coverage_env_is_skipped() {
    let mut engine = MockContainerEngine::new();
    engine
        .expect_list_test_containers()
        .times(1)
        .returning(|_| Ok(vec![brief("c-1", "validator-0")]));
    engine
        .expect_container_env()
        .times(1)
        .returning(|_| Ok(vec!["PATH=/usr/bin".to_string()]));
    // No export_path expectation: the mock panics if it is reached.

    let output = tempfile::tempdir().unwrap();
    let sink = RecordingSink::new("TestNoCoverage");
    let exporter =
        CoverageExporter::with_output_root(Arc::new(engine), output.path().to_path_buf());
    exporter.export(sink.as_ref()).await;

    assert!(!sink.logged("Exporting coverage data"));
}

/// One container failing to copy must not cost the others their coverage.
#[tokio::test]
async fn test_copy_failure_skips_container_but_continues() {
    let output = tempfile::tempdir().unwrap();

    let mut engine = MockContainerEngine::new();
    engine
        .expect_list_test_containers()
        .times(1)
        .returning(|_| Ok(vec![brief("c-1", "validator-0"), brief("c-2", "validator-1")]));
    engine
        .expect_container_env()
        .times(2)
        .returning(|_| Ok(coverage_env()));
    engine
        .expect_export_path()
        .times(1)
        .withf(|id, _| id == "c-1")
        .returning(|_, _| Err(HarnessError::server_error(500, "filesystem gone")));
    engine
        .expect_export_path()
        .times(1)
        .withf(|id, _| id == "c-2")
        .returning(|_, _| Ok(sample_archive()));

    let sink = RecordingSink::new("TestPartial");
    let exporter =
        CoverageExporter::with_output_root(Arc::new(engine), output.path().to_path_buf());
    exporter.export(sink.as_ref()).await;

    assert!(sink.logged("Failed to copy coverage data from container c-1"));
    assert!(output.path().join("validator-1").join("covmeta.1234").exists());
}

/// An inspect failure on one container is logged and the rest proceed.
#[tokio::test]
async fn test_inspect_failure_is_logged_and_skipped() {
    let output = tempfile::tempdir().unwrap();

    let mut engine = MockContainerEngine::new();
    engine
        .expect_list_test_containers()
        .times(1)
        .returning(|_| Ok(vec![brief("c-1", "validator-0"), brief("c-2", "validator-1")]));
    engine
        .expect_container_env()
        .times(1)
        .withf(|id| id == "c-1")
        .returning(|_| Err(HarnessError::server_error(404, "no such container")));
    engine
        .expect_container_env()
        .times(1)
        .withf(|id| id == "c-2")
        .returning(|_| Ok(coverage_env()));
    engine
        .expect_export_path()
        .times(1)
        .returning(|_, _| Ok(sample_archive()));

    let sink = RecordingSink::new("TestInspectFail");
    let exporter =
        CoverageExporter::with_output_root(Arc::new(engine), output.path().to_path_buf());
    exporter.export(sink.as_ref()).await;

    assert!(sink.logged("Failed to inspect container c-1"));
    assert!(output.path().join("validator-1").join("covmeta.1234").exists());
}

/// A container with no names falls back to its short id for the output
/// directory.
#[tokio::test]
async fn test_nameless_container_uses_short_id_directory() {
    let output = tempfile::tempdir().unwrap();

    let mut engine = MockContainerEngine::new();
    engine
        .expect_list_test_containers()
        .times(1)
        .returning(|_| Ok(vec![nameless_brief("0123456789abcdef0123")]));
    engine.expect_container_env().times(1).returning(|_| Ok(coverage_env()));
    engine
        .expect_export_path()
        .times(1)
        .returning(|_, _| Ok(sample_archive()));

    let sink = RecordingSink::new("TestShortId");
    let exporter =
        CoverageExporter::with_output_root(Arc::new(engine), output.path().to_path_buf());
    exporter.export(sink.as_ref()).await;

    assert!(output.path().join("0123456789ab").join("covmeta.1234").exists());
}

/// Running the exporter twice overwrites the same files and changes nothing
/// else.
#[tokio::test]
async fn test_export_is_idempotent_across_runs() {
    let output = tempfile::tempdir().unwrap();

    let mut engine = MockContainerEngine::new();
    engine
        .expect_list_test_containers()
        .times(2)
        .returning(|_| Ok(vec![brief("c-1", "validator-0")]));
    engine.expect_container_env().times(2).returning(|_| Ok(coverage_env()));
    engine
        .expect_export_path()
        .times(2)
        .returning(|_, _| Ok(sample_archive()));

    let sink = RecordingSink::new("TestIdempotent");
    let exporter =
        CoverageExporter::with_output_root(Arc::new(engine), output.path().to_path_buf());
    exporter.export(sink.as_ref()).await;
    exporter.export(sink.as_ref()).await;

    let container_dir = output.path().join("validator-0");
    assert_eq!(std::fs::read(container_dir.join("covmeta.1234")).unwrap(), b"meta");
    assert_eq!(
        std::fs::read_dir(&container_dir).unwrap().count(),
        2,
        "repeat export must not grow the output directory"
    );
}

// ---------------------------------------------------------------------------
// Panic boundary
// ---------------------------------------------------------------------------

/// Engine whose filesystem copy panics, with just enough of the rest
/// implemented to drive a one-container teardown.
struct PanickingCopyEngine {
    removed: AtomicBool,
}

#[async_trait]
impl ContainerEngine for PanickingCopyEngine {
    async fn list_test_containers(&self, _test: &str) -> HarnessResult<Vec<ContainerBrief>> {
        Ok(vec![brief("c-1", "validator-0")])
    }

    async fn container_logs(&self, _id: &str, _tail: &str) -> HarnessResult<String> {
        Ok(String::new())
    }

    async fn container_env(&self, _id: &str) -> HarnessResult<Vec<String>> {
        Ok(coverage_env())
    }

    async fn stop_container(&self, _id: &str, _timeout_secs: i64) -> HarnessResult<()> {
        Ok(())
    }

    async fn wait_not_running(&self, _id: &str) -> HarnessResult<i64> {
        Ok(0)
    }

    async fn remove_container(&self, _id: &str) -> HarnessResult<()> {
        self.removed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn export_path(&self, _id: &str, _path: &str) -> HarnessResult<Vec<u8>> {
        panic!("tar stream corrupted")
    }

    async fn prune_volumes(&self, _test: &str) -> HarnessResult<VolumePruneReport> {
        Ok(VolumePruneReport::default())
    }

    async fn prune_networks(&self, _test: &str) -> HarnessResult<NetworkPruneReport> {
        Ok(NetworkPruneReport::default())
    }

    async fn create_network(&self, _name: &str, _test: &str) -> HarnessResult<String> {
        unreachable!("teardown never creates networks")
    }
}

/// A panic inside the exporter is absorbed, reported, and the container is
/// still removed afterwards.
#[tokio::test]
async fn test_coverage_panic_is_absorbed_and_teardown_continues() {
    let engine = Arc::new(PanickingCopyEngine {
        removed: AtomicBool::new(false),
    });
    let exporter = CoverageExporter::with_output_root(
        engine.clone(),
        tempfile::tempdir().unwrap().path().to_path_buf(),
    );
    let cleanup = DockerCleanup::new(engine.clone(), Some(exporter));

    let sink = RecordingSink::new("TestPanic");
    cleanup
        .run_with_policy(sink.as_ref(), &TeardownPolicy::default())
        .await;

    assert!(
        sink.logged("Failed to export coverage data: tar stream corrupted"),
        "panic must surface in the test log: {:?}",
        sink.lines()
    );
    assert!(
        engine.removed.load(Ordering::SeqCst),
        "container removal must survive a coverage panic"
    );
}
