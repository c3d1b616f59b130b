#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use adder_bacalhau::ipfs::DownloadSettings;
use adder_core::job::{ArtifactRef, JobSpec, JobStatus, ResultManifest, SubmittedJob};
use adder_pipeline::collaborators::{
    ArtifactStore, ComputeClient, ComputeClientError, RetrievalError,
};
use adder_pipeline::orchestrator::{ComputePipeline, PipelineSettings};
use adder_pipeline::wait::{CompletionWaiter, WaitReport};
use adder_pipeline::workspace::WorkspaceManager;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use adder_api::config::{CompletionStrategy, ServerConfig};
use adder_api::router::build_app_router;
use adder_api::state::AppState;

/// Build a test `ServerConfig` rooted in the given directories.
pub fn test_config(static_dir: &Path, workspace_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:8080".to_string()],
        request_timeout_secs: 30,
        static_dir: static_dir.to_path_buf(),
        workspace_root: workspace_root.to_path_buf(),
        bacalhau_api_host: "requester.test".to_string(),
        bacalhau_api_port: "1234".to_string(),
        job_image: "ubuntu".to_string(),
        ipfs_gateway_url: "http://gateway.test".to_string(),
        ipfs_timeout_secs: 5,
        completion: CompletionStrategy::Poll { timeout_secs: 5 },
    }
}

// ---------------------------------------------------------------------------
// Fake compute network
// ---------------------------------------------------------------------------

/// Compute client that sums the job's operands locally.
#[derive(Default)]
pub struct FakeNetwork {
    pub reject_submit: bool,
    pub fail_results: bool,
    pub(crate) submits: AtomicUsize,
}

impl FakeNetwork {
    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ComputeClient for FakeNetwork {
    async fn submit(&self, job: &JobSpec) -> Result<SubmittedJob, ComputeClientError> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst);
        if self.reject_submit {
            return Err(ComputeClientError::Rejected {
                status: 500,
                body: "requester unavailable".into(),
            });
        }
        let sum: i64 = job
            .entrypoint()
            .iter()
            .rev()
            .take(2)
            .filter_map(|arg| arg.parse::<i64>().ok())
            .sum();
        Ok(SubmittedJob::new(format!("job{n}_{sum}")))
    }

    async fn status(&self, _job: &SubmittedJob) -> Result<JobStatus, ComputeClientError> {
        Ok(JobStatus::Completed)
    }

    async fn results(&self, job: &SubmittedJob) -> Result<ResultManifest, ComputeClientError> {
        if self.fail_results {
            return Err(ComputeClientError::Network("connection refused".into()));
        }
        Ok(ResultManifest {
            artifacts: vec![ArtifactRef {
                storage_source: "IPFS".into(),
                name: job.id().to_string(),
                cid: format!("cid-{}", job.id()),
            }],
        })
    }
}

/// Artifact store writing `stdout` with the sum encoded in the job id.
#[derive(Default)]
pub struct FakeGateway {
    pub write_stdout: bool,
}

impl FakeGateway {
    pub fn working() -> Self {
        Self { write_stdout: true }
    }
}

#[async_trait]
impl ArtifactStore for FakeGateway {
    async fn download(
        &self,
        job: &SubmittedJob,
        _manifest: &ResultManifest,
        settings: &DownloadSettings,
    ) -> Result<(), RetrievalError> {
        if !self.write_stdout {
            return Err(RetrievalError::Transfer("gateway unreachable".into()));
        }
        let sum = job.id().rsplit('_').next().unwrap_or_default();
        tokio::fs::write(settings.output_dir.join("stdout"), format!("{sum}\n"))
            .await
            .map_err(|e| RetrievalError::Transfer(e.to_string()))
    }
}

/// Waiter returning a fixed report without delay.
pub struct ImmediateWaiter(pub WaitReport);

impl Default for ImmediateWaiter {
    fn default() -> Self {
        Self(WaitReport::Finished(JobStatus::Completed))
    }
}

#[async_trait]
impl CompletionWaiter for ImmediateWaiter {
    async fn wait(&self, _client: &dyn ComputeClient, _job: &SubmittedJob) -> WaitReport {
        self.0.clone()
    }
}

// ---------------------------------------------------------------------------
// App builder
// ---------------------------------------------------------------------------

/// A router wired to fakes, plus the temp directories it serves from.
pub struct TestApp {
    pub router: Router,
    pub network: Arc<FakeNetwork>,
    pub dir: TempDir,
}

impl TestApp {
    pub fn workspace_root(&self) -> std::path::PathBuf {
        self.dir.path().join("tmp")
    }
}

/// Build the full application router with the production middleware stack,
/// backed by the given fakes.
pub async fn build_test_app_with(
    network: FakeNetwork,
    gateway: FakeGateway,
    waiter: ImmediateWaiter,
) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let static_dir = dir.path().join("static");
    std::fs::create_dir_all(&static_dir).unwrap();
    std::fs::write(static_dir.join("index.html"), "<h1>adder</h1>").unwrap();

    let config = test_config(&static_dir, &dir.path().join("tmp"));
    let network = Arc::new(network);

    let pipeline = ComputePipeline::new(
        network.clone(),
        Arc::new(gateway),
        Arc::new(waiter),
        WorkspaceManager::new(&config.workspace_root),
        PipelineSettings::default(),
    );
    pipeline.workspaces().reset().await.unwrap();

    let state = AppState {
        config: Arc::new(config.clone()),
        pipeline: Arc::new(pipeline),
    };

    TestApp {
        router: build_app_router(state, &config),
        network,
        dir,
    }
}

/// Build a test app whose fakes all succeed.
pub async fn build_test_app() -> TestApp {
    build_test_app_with(
        FakeNetwork::default(),
        FakeGateway::working(),
        ImmediateWaiter::default(),
    )
    .await
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(app: Router, uri: &str, form: &str) -> Response<Body> {
    app.oneshot(
        Request::post(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
