//! The dispatch sequence for one addition request.
//!
//! Job construction and submission failures abort the run with a
//! [`PipelineError`]. Once the network has accepted a job, everything
//! downstream is best-effort: wait, retrieval and read problems are
//! collected as [`PipelineWarning`]s and the run finishes with whatever
//! output is available.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use adder_bacalhau::ipfs::{DownloadSettings, DEFAULT_IPFS_TIMEOUT};
use adder_core::error::CoreError;
use adder_core::job::{addition_job, SubmittedJob, DEFAULT_IMAGE, STDOUT_ARTIFACT};
use adder_core::operands::Operands;

use crate::collaborators::{ArtifactStore, ComputeClient, ComputeClientError, RetrievalError};
use crate::wait::CompletionWaiter;
use crate::workspace::{Workspace, WorkspaceManager};

/// Fatal failures: no job ran, so there is nothing to return.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Unable to create job: {0}")]
    JobConstruction(#[source] CoreError),

    #[error("Error on submission: {0}")]
    Submission(#[source] ComputeClientError),
}

/// A recoverable problem encountered after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    /// The job did not cleanly complete within the wait.
    Incomplete(String),
    /// Result manifest or artifact download failed.
    Retrieval(String),
    /// The output artifact could not be read locally.
    Read(String),
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete(msg) => write!(f, "incomplete: {msg}"),
            Self::Retrieval(msg) => write!(f, "retrieval: {msg}"),
            Self::Read(msg) => write!(f, "read: {msg}"),
        }
    }
}

/// Result of a run whose job was accepted by the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeOutcome {
    /// Every step succeeded.
    Complete { job_id: String, content: Vec<u8> },
    /// Some step after submission failed; `content` may be empty.
    Partial {
        job_id: String,
        content: Vec<u8>,
        warnings: Vec<PipelineWarning>,
    },
}

impl ComputeOutcome {
    fn from_parts(job_id: String, content: Vec<u8>, warnings: Vec<PipelineWarning>) -> Self {
        if warnings.is_empty() {
            Self::Complete { job_id, content }
        } else {
            Self::Partial {
                job_id,
                content,
                warnings,
            }
        }
    }

    pub fn job_id(&self) -> &str {
        match self {
            Self::Complete { job_id, .. } | Self::Partial { job_id, .. } => job_id,
        }
    }

    pub fn content(&self) -> &[u8] {
        match self {
            Self::Complete { content, .. } | Self::Partial { content, .. } => content,
        }
    }

    pub fn warnings(&self) -> &[PipelineWarning] {
        match self {
            Self::Complete { .. } => &[],
            Self::Partial { warnings, .. } => warnings,
        }
    }
}

/// Static settings for [`ComputePipeline`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Container image the addition job runs in.
    pub image: String,
    /// Bound on the artifact download.
    pub download_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            download_timeout: DEFAULT_IPFS_TIMEOUT,
        }
    }
}

/// Runs addition requests against the compute network.
///
/// Cheap to share: collaborators are behind `Arc`.
pub struct ComputePipeline {
    client: Arc<dyn ComputeClient>,
    store: Arc<dyn ArtifactStore>,
    waiter: Arc<dyn CompletionWaiter>,
    workspaces: WorkspaceManager,
    settings: PipelineSettings,
}

impl ComputePipeline {
    pub fn new(
        client: Arc<dyn ComputeClient>,
        store: Arc<dyn ArtifactStore>,
        waiter: Arc<dyn CompletionWaiter>,
        workspaces: WorkspaceManager,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            client,
            store,
            waiter,
            workspaces,
            settings,
        }
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    /// Build, submit and wait for the addition job, then collect its
    /// `stdout`.
    ///
    /// The request's workspace is released before returning on every path.
    pub async fn run(
        &self,
        request_id: &str,
        operands: Operands,
    ) -> Result<ComputeOutcome, PipelineError> {
        tracing::info!(request_id, x = operands.x, y = operands.y, "Dispatching addition job");

        let job = addition_job(&self.settings.image, operands).map_err(|e| {
            tracing::error!(request_id, error = %e, "Unable to create job");
            PipelineError::JobConstruction(e)
        })?;

        let submitted = self.client.submit(&job).await.map_err(|e| {
            tracing::error!(request_id, error = %e, "Error on submission");
            PipelineError::Submission(e)
        })?;
        tracing::info!(request_id, job_id = %submitted, "Job submitted");

        let mut warnings = Vec::new();

        let report = self.waiter.wait(self.client.as_ref(), &submitted).await;
        if let Some(note) = report.warning() {
            tracing::warn!(request_id, job_id = %submitted, note = %note, "Job did not complete cleanly");
            warnings.push(PipelineWarning::Incomplete(note));
        }

        let content = match self.workspaces.acquire(request_id).await {
            Ok(workspace) => {
                let content = self.collect(&submitted, &workspace, &mut warnings).await;
                if let Err(e) = workspace.release() {
                    tracing::warn!(request_id, error = %e, "Failed to release workspace");
                }
                content
            }
            Err(e) => {
                tracing::error!(request_id, error = %e, "Could not create workspace");
                warnings.push(PipelineWarning::Read(e.to_string()));
                Vec::new()
            }
        };

        tracing::info!(
            request_id,
            job_id = %submitted,
            bytes = content.len(),
            warnings = warnings.len(),
            "Results: {}",
            String::from_utf8_lossy(&content).trim_end(),
        );

        Ok(ComputeOutcome::from_parts(
            submitted.id().to_string(),
            content,
            warnings,
        ))
    }

    // ---- private helpers ----

    /// Download into `workspace` and read `stdout`, recording failures.
    async fn collect(
        &self,
        job: &SubmittedJob,
        workspace: &Workspace,
        warnings: &mut Vec<PipelineWarning>,
    ) -> Vec<u8> {
        if let Err(e) = self.fetch(job, workspace).await {
            tracing::warn!(job_id = %job, error = %e, "Result retrieval failed");
            warnings.push(PipelineWarning::Retrieval(e.to_string()));
        }

        match workspace.read_artifact(STDOUT_ARTIFACT).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(job_id = %job, error = %e, "Could not read file");
                warnings.push(PipelineWarning::Read(e.to_string()));
                Vec::new()
            }
        }
    }

    async fn fetch(&self, job: &SubmittedJob, workspace: &Workspace) -> Result<(), RetrievalError> {
        let manifest = self
            .client
            .results(job)
            .await
            .map_err(RetrievalError::Manifest)?;

        let settings =
            DownloadSettings::new(workspace.path()).with_timeout(self.settings.download_timeout);
        self.store.download(job, &manifest, &settings).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
