use std::sync::Arc;
use std::time::Duration;

use adder_bacalhau::api::BacalhauApi;
use adder_bacalhau::ipfs::IpfsGateway;
use adder_pipeline::orchestrator::{ComputePipeline, PipelineSettings};
use adder_pipeline::wait::{CompletionWaiter, FixedDelayWaiter, PollConfig, PollingWaiter};
use adder_pipeline::workspace::WorkspaceManager;

use crate::config::{CompletionStrategy, ServerConfig};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Job dispatch pipeline shared by all requests.
    pub pipeline: Arc<ComputePipeline>,
}

/// Select the completion waiter named by the configuration.
pub fn build_waiter(strategy: &CompletionStrategy) -> Arc<dyn CompletionWaiter> {
    match strategy {
        CompletionStrategy::Fixed { wait_secs } => {
            Arc::new(FixedDelayWaiter::new(Duration::from_secs(*wait_secs)))
        }
        CompletionStrategy::Poll { timeout_secs } => Arc::new(PollingWaiter::new(PollConfig {
            timeout: Duration::from_secs(*timeout_secs),
            ..Default::default()
        })),
    }
}

/// Wire the production pipeline: Bacalhau requester API, IPFS gateway,
/// configured waiter, workspace root.
pub fn build_pipeline(config: &ServerConfig) -> ComputePipeline {
    let client = Arc::new(BacalhauApi::new(config.bacalhau_api_url()));
    let store = Arc::new(IpfsGateway::new(config.ipfs_gateway_url.clone()));

    ComputePipeline::new(
        client,
        store,
        build_waiter(&config.completion),
        WorkspaceManager::new(&config.workspace_root),
        PipelineSettings {
            image: config.job_image.clone(),
            download_timeout: Duration::from_secs(config.ipfs_timeout_secs),
        },
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
