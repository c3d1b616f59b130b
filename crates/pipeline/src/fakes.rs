//! In-memory collaborators for unit tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use adder_bacalhau::ipfs::DownloadSettings;
use adder_core::job::{ArtifactRef, JobSpec, JobStatus, ResultManifest, SubmittedJob};
use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::collaborators::{ArtifactStore, ComputeClient, ComputeClientError, RetrievalError};
use crate::wait::{CompletionWaiter, WaitReport};

/// Compute client whose answers are scripted up front.
///
/// Submitted jobs get the id `sum-<x+y>`, derived from the last two
/// entrypoint arguments, so a [`FakeStore`] can produce matching output.
#[derive(Default)]
pub struct FakeClient {
    reject_submit: bool,
    fail_results: bool,
    hang_status: bool,
    failing_status_queries: AtomicUsize,
    statuses: Mutex<VecDeque<JobStatus>>,
    submits: AtomicUsize,
    status_calls: AtomicUsize,
    results_calls: AtomicUsize,
}

impl FakeClient {
    pub fn rejecting_submissions() -> Self {
        Self {
            reject_submit: true,
            ..Default::default()
        }
    }

    pub fn failing_results() -> Self {
        Self {
            fail_results: true,
            ..Default::default()
        }
    }

    /// Statuses returned in order; the last one repeats.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into_iter().collect();
        self
    }

    /// Fail the first `n` status queries.
    pub fn with_failing_status_queries(self, n: usize) -> Self {
        self.failing_status_queries.store(n, Ordering::SeqCst);
        self
    }

    /// Status queries never answer.
    pub fn with_hanging_status_queries(mut self) -> Self {
        self.hang_status = true;
        self
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn results_calls(&self) -> usize {
        self.results_calls.load(Ordering::SeqCst)
    }
}

fn sum_from_entrypoint(job: &JobSpec) -> i64 {
    job.entrypoint()
        .iter()
        .rev()
        .take(2)
        .filter_map(|arg| arg.parse::<i64>().ok())
        .sum()
}

#[async_trait]
impl ComputeClient for FakeClient {
    async fn submit(&self, job: &JobSpec) -> Result<SubmittedJob, ComputeClientError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if self.reject_submit {
            return Err(ComputeClientError::Rejected {
                status: 400,
                body: "rejected".into(),
            });
        }
        Ok(SubmittedJob::new(format!("sum-{}", sum_from_entrypoint(job))))
    }

    async fn status(&self, _job: &SubmittedJob) -> Result<JobStatus, ComputeClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_status {
            std::future::pending::<()>().await;
        }

        let failing = self.failing_status_queries.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_status_queries.store(failing - 1, Ordering::SeqCst);
            return Err(ComputeClientError::Network("connection reset".into()));
        }

        let mut statuses = self.statuses.lock().unwrap();
        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        Ok(status.unwrap_or(JobStatus::Completed))
    }

    async fn results(&self, job: &SubmittedJob) -> Result<ResultManifest, ComputeClientError> {
        self.results_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_results {
            return Err(ComputeClientError::Network("results unavailable".into()));
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

/// What [`FakeStore`] writes for a download.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum StoreBehaviour {
    /// Write `stdout` holding the job's sum.
    WriteStdout,
    /// Write only `stderr`.
    WriteStderrOnly,
    /// Write nothing and fail.
    Fail,
}

/// Artifact store writing job output straight into the target directory.
pub struct FakeStore {
    behaviour: StoreBehaviour,
    /// Rendezvous after writing, so concurrent downloads overlap.
    barrier: Option<Arc<Barrier>>,
    downloads: AtomicUsize,
    dirs: Mutex<Vec<PathBuf>>,
}

impl FakeStore {
    pub fn new(behaviour: StoreBehaviour) -> Self {
        Self {
            behaviour,
            barrier: None,
            downloads: AtomicUsize::new(0),
            dirs: Mutex::new(Vec::new()),
        }
    }

    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStore for FakeStore {
    async fn download(
        &self,
        job: &SubmittedJob,
        _manifest: &ResultManifest,
        settings: &DownloadSettings,
    ) -> Result<(), RetrievalError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.dirs.lock().unwrap().push(settings.output_dir.clone());

        let sum = job.id().trim_start_matches("sum-");
        let result = match self.behaviour {
            StoreBehaviour::WriteStdout => {
                std::fs::write(settings.output_dir.join("stdout"), format!("{sum}\n"))
                    .map_err(|e| RetrievalError::Transfer(e.to_string()))
            }
            StoreBehaviour::WriteStderrOnly => {
                std::fs::write(settings.output_dir.join("stderr"), "sh: not found\n")
                    .map_err(|e| RetrievalError::Transfer(e.to_string()))
            }
            StoreBehaviour::Fail => Err(RetrievalError::Transfer("gateway unreachable".into())),
        };

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        result
    }
}

/// Waiter that returns immediately with a fixed report.
pub struct InstantWaiter(pub WaitReport);

impl Default for InstantWaiter {
    fn default() -> Self {
        Self(WaitReport::Finished(JobStatus::Completed))
    }
}

#[async_trait]
impl CompletionWaiter for InstantWaiter {
    async fn wait(&self, _client: &dyn ComputeClient, _job: &SubmittedJob) -> WaitReport {
        self.0.clone()
    }
}
