//! Waiting for a submitted job to finish.
//!
//! Two strategies implement [`CompletionWaiter`]:
//!
//! - [`FixedDelayWaiter`] sleeps for a fixed interval and never looks at
//!   the job.
//! - [`PollingWaiter`] queries the job state with exponential backoff until
//!   the job reaches a terminal state or an overall timeout expires.
//!
//! Neither strategy fails: the caller always proceeds to result retrieval,
//! using the returned [`WaitReport`] to note anything unexpected.

use std::time::Duration;

use adder_core::job::{JobStatus, SubmittedJob};
use async_trait::async_trait;
use tokio::time::Instant;

use crate::collaborators::ComputeClient;

/// Interval slept by [`FixedDelayWaiter`] unless configured otherwise.
pub const DEFAULT_FIXED_WAIT: Duration = Duration::from_secs(15);

/// How a wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitReport {
    /// A fixed interval elapsed; the job state is unknown.
    Elapsed(Duration),
    /// The job reached a terminal state.
    Finished(JobStatus),
    /// The timeout expired before a terminal state was observed.
    TimedOut { last_status: Option<JobStatus> },
}

impl WaitReport {
    /// A human-readable note when the wait did not end in a clean
    /// completion, `None` otherwise.
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Elapsed(_) | Self::Finished(JobStatus::Completed) => None,
            Self::Finished(status) => Some(format!("Job finished in state {status}")),
            Self::TimedOut {
                last_status: Some(status),
            } => Some(format!("Job still {status} when the wait timed out")),
            Self::TimedOut { last_status: None } => {
                Some("Job state unknown when the wait timed out".to_string())
            }
        }
    }
}

/// Blocks the current request until its job is presumed finished.
#[async_trait]
pub trait CompletionWaiter: Send + Sync {
    async fn wait(&self, client: &dyn ComputeClient, job: &SubmittedJob) -> WaitReport;
}

// ---------------------------------------------------------------------------
// Fixed delay
// ---------------------------------------------------------------------------

/// Sleeps for a fixed interval regardless of job state.
#[derive(Debug, Clone)]
pub struct FixedDelayWaiter {
    delay: Duration,
}

impl FixedDelayWaiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedDelayWaiter {
    fn default() -> Self {
        Self::new(DEFAULT_FIXED_WAIT)
    }
}

#[async_trait]
impl CompletionWaiter for FixedDelayWaiter {
    async fn wait(&self, _client: &dyn ComputeClient, job: &SubmittedJob) -> WaitReport {
        tracing::debug!(
            job_id = %job,
            delay_ms = self.delay.as_millis() as u64,
            "Waiting fixed interval for job",
        );
        tokio::time::sleep(self.delay).await;
        WaitReport::Elapsed(self.delay)
    }
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

/// Tunable parameters for the polling strategy.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay after the first status query.
    pub initial_delay: Duration,
    /// Upper bound on the delay between queries.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each query.
    pub multiplier: f64,
    /// Overall bound on the wait.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Calculate the next backoff delay, clamped to [`PollConfig::max_delay`].
pub fn next_delay(current: Duration, config: &PollConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Polls job state with exponential backoff.
#[derive(Debug, Clone, Default)]
pub struct PollingWaiter {
    config: PollConfig,
}

impl PollingWaiter {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CompletionWaiter for PollingWaiter {
    async fn wait(&self, client: &dyn ComputeClient, job: &SubmittedJob) -> WaitReport {
        let deadline = Instant::now() + self.config.timeout;
        let mut delay = self.config.initial_delay;
        let mut last_status = None;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let remaining = deadline.saturating_duration_since(Instant::now());
            let query = match tokio::time::timeout(remaining, client.status(job)).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!("no answer within {}ms", remaining.as_millis())),
            };

            match query {
                Ok(status) if status.is_terminal() => {
                    tracing::info!(job_id = %job, attempt, %status, "Job reached terminal state");
                    return WaitReport::Finished(status);
                }
                Ok(status) => {
                    tracing::debug!(job_id = %job, attempt, %status, "Job not finished yet");
                    last_status = Some(status);
                }
                Err(e) => {
                    tracing::warn!(
                        job_id = %job,
                        error = %e,
                        "Job status query {attempt} failed",
                    );
                }
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(
                    job_id = %job,
                    attempt,
                    timeout_secs = self.config.timeout.as_secs(),
                    "Gave up waiting for job",
                );
                return WaitReport::TimedOut { last_status };
            }

            tokio::time::sleep(delay.min(deadline - now)).await;
            delay = next_delay(delay, &self.config);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
