//! Interfaces to the compute network and the artifact store.
//!
//! The orchestrator only talks to [`ComputeClient`] and [`ArtifactStore`].
//! Production wiring uses the Bacalhau requester API and an IPFS gateway;
//! tests substitute in-memory fakes.

use adder_bacalhau::api::{BacalhauApi, BacalhauApiError};
use adder_bacalhau::ipfs::{DownloadSettings, IpfsError, IpfsGateway};
use adder_core::job::{JobSpec, JobStatus, ResultManifest, SubmittedJob};
use async_trait::async_trait;

/// Errors talking to the compute network.
#[derive(Debug, thiserror::Error)]
pub enum ComputeClientError {
    /// The request never got a response (connection, DNS, bad URL).
    #[error("Compute network unreachable: {0}")]
    Network(String),

    /// The network answered with a non-success status.
    #[error("Compute network rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl From<BacalhauApiError> for ComputeClientError {
    fn from(err: BacalhauApiError) -> Self {
        match err {
            BacalhauApiError::Request(e) => Self::Network(e.to_string()),
            BacalhauApiError::ApiError { status, body } => Self::Rejected { status, body },
        }
    }
}

/// Errors fetching a completed job's artifacts.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Could not get results: {0}")]
    Manifest(#[source] ComputeClientError),

    #[error("Job published no downloadable results")]
    NoResults,

    #[error("Could not download job: {0}")]
    Transfer(String),

    #[error("Download timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl From<IpfsError> for RetrievalError {
    fn from(err: IpfsError) -> Self {
        match err {
            IpfsError::NoResults => Self::NoResults,
            IpfsError::Timeout { secs } => Self::Timeout { secs },
            other => Self::Transfer(other.to_string()),
        }
    }
}

/// Job submission and lookup against the compute network.
#[async_trait]
pub trait ComputeClient: Send + Sync {
    /// Submit a job and return its handle.
    async fn submit(&self, job: &JobSpec) -> Result<SubmittedJob, ComputeClientError>;

    /// Current lifecycle state of a submitted job.
    async fn status(&self, job: &SubmittedJob) -> Result<JobStatus, ComputeClientError>;

    /// Where the job's published results live.
    async fn results(&self, job: &SubmittedJob) -> Result<ResultManifest, ComputeClientError>;
}

/// Download of a job's published artifacts into a local directory.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn download(
        &self,
        job: &SubmittedJob,
        manifest: &ResultManifest,
        settings: &DownloadSettings,
    ) -> Result<(), RetrievalError>;
}

#[async_trait]
impl ComputeClient for BacalhauApi {
    async fn submit(&self, job: &JobSpec) -> Result<SubmittedJob, ComputeClientError> {
        Ok(BacalhauApi::submit(self, job).await?)
    }

    async fn status(&self, job: &SubmittedJob) -> Result<JobStatus, ComputeClientError> {
        Ok(self.job_status(job).await?)
    }

    async fn results(&self, job: &SubmittedJob) -> Result<ResultManifest, ComputeClientError> {
        Ok(BacalhauApi::results(self, job).await?)
    }
}

#[async_trait]
impl ArtifactStore for IpfsGateway {
    async fn download(
        &self,
        job: &SubmittedJob,
        manifest: &ResultManifest,
        settings: &DownloadSettings,
    ) -> Result<(), RetrievalError> {
        tracing::debug!(
            job_id = %job,
            results = manifest.artifacts.len(),
            output_dir = %settings.output_dir.display(),
            "Downloading job results",
        );
        Ok(IpfsGateway::download(self, manifest, settings).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
