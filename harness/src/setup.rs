//! Per-test setup orchestration
//!
//! [`docker_setup`] is the single entry point a test calls before standing
//! up chain nodes. It connects to the engine, registers the scoped teardown
//! on the test sink, eagerly reaps leftovers from a previously interrupted
//! run of the same test, and creates the fresh per-test network.

use std::sync::Arc;

use shared::TestSink;

use crate::cleanup::DockerCleanup;
use crate::coverage::CoverageExporter;
use crate::error::HarnessResult;
use crate::labels::random_network_name;
use crate::services::DockerEngine;
use crate::traits::ContainerEngine;

/// Set up the Docker environment for a test.
///
/// Panics when any part of the setup fails, because the test cannot
/// continue without Docker. Use [`try_docker_setup`] to handle the error
/// yourself.
pub async fn docker_setup(sink: Arc<dyn TestSink>) -> (Arc<dyn ContainerEngine>, String) {
    match try_docker_setup(sink).await {
        Ok(setup) => setup,
        Err(e) => panic!("{e}"),
    }
}

/// Fallible variant of [`docker_setup`].
pub async fn try_docker_setup(
    sink: Arc<dyn TestSink>,
) -> HarnessResult<(Arc<dyn ContainerEngine>, String)> {
    let engine: Arc<dyn ContainerEngine> = Arc::new(DockerEngine::connect().await?);
    setup_with_engine(sink, engine).await
}

/// Run the setup sequence against an already-open engine handle.
pub async fn setup_with_engine(
    sink: Arc<dyn TestSink>,
    engine: Arc<dyn ContainerEngine>,
) -> HarnessResult<(Arc<dyn ContainerEngine>, String)> {
    let test_name = sink.name();

    // Clean up docker resources at the end of the test; that run also
    // exports coverage data before containers go away.
    let teardown_engine = engine.clone();
    sink.register_cleanup(Box::new(move |sink| {
        Box::pin(async move {
            let exporter = CoverageExporter::new(teardown_engine.clone());
            DockerCleanup::new(teardown_engine, Some(exporter))
                .run(sink.as_ref())
                .await;
        })
    }));

    // Also eagerly clean up any leftover resources from a previous run of
    // the same test, e.g. if it was interrupted. Without this, the duplicate
    // check below would reject the network name of a half-torn-down run. No
    // coverage data is exported here.
    DockerCleanup::new(engine.clone(), None).run(sink.as_ref()).await;

    let network_name = random_network_name();
    let network_id = engine.create_network(&network_name, &test_name).await?;
    tracing::info!(network = %network_name, test = %test_name, "🌐 Created docker network");

    Ok((engine, network_id))
}
