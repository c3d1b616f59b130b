//! REST client for the Bacalhau requester API.
//!
//! Wraps job submission, state lookup and result listing using
//! [`reqwest`]. Requests are not signed; the requester node is expected to
//! accept unsigned submissions from this client.

use adder_core::job::{JobSpec, JobStatus, ResultManifest, SubmittedJob};

use crate::model::{
    JobCreatePayload, JobQuery, ResultsResponse, Spec, StateResponse, SubmitRequest,
    SubmitResponse, API_VERSION,
};

/// HTTP client for a single requester node.
pub struct BacalhauApi {
    client: reqwest::Client,
    api_url: String,
    client_id: String,
}

/// Errors from the requester API layer.
#[derive(Debug, thiserror::Error)]
pub enum BacalhauApiError {
    /// The HTTP request itself failed (network, DNS, malformed URL, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The requester returned a non-2xx status code.
    #[error("Bacalhau API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Compose the requester base URL from host and port.
///
/// No defaults are applied: empty parts produce a URL that fails at
/// request time.
pub fn api_url(host: &str, port: &str) -> String {
    format!("http://{host}:{port}")
}

impl BacalhauApi {
    /// Create a new API client for a requester node.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:1234`.
    pub fn new(api_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Identifier this client submits jobs under.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Submit a job for execution.
    ///
    /// Sends `POST /requester/submit` and returns the network-assigned
    /// job id.
    pub async fn submit(&self, job: &JobSpec) -> Result<SubmittedJob, BacalhauApiError> {
        let body = SubmitRequest {
            job_create_payload: JobCreatePayload {
                client_id: self.client_id.clone(),
                api_version: API_VERSION.to_string(),
                spec: Spec::from(job),
            },
        };

        let response = self
            .client
            .post(format!("{}/requester/submit", self.api_url))
            .json(&body)
            .send()
            .await?;

        let parsed: SubmitResponse = Self::parse_response(response).await?;
        Ok(SubmittedJob::new(parsed.job.metadata.id))
    }

    /// Look up the current state of a job via `POST /requester/states`.
    pub async fn job_status(&self, job: &SubmittedJob) -> Result<JobStatus, BacalhauApiError> {
        let response = self
            .client
            .post(format!("{}/requester/states", self.api_url))
            .json(&self.query(job))
            .send()
            .await?;

        let parsed: StateResponse = Self::parse_response(response).await?;
        Ok(JobStatus::from_state_name(&parsed.state.state))
    }

    /// List the published results of a job via `POST /requester/results`.
    pub async fn results(&self, job: &SubmittedJob) -> Result<ResultManifest, BacalhauApiError> {
        let response = self
            .client
            .post(format!("{}/requester/results", self.api_url))
            .json(&self.query(job))
            .send()
            .await?;

        let parsed: ResultsResponse = Self::parse_response(response).await?;
        Ok(ResultManifest {
            artifacts: parsed.results.into_iter().map(Into::into).collect(),
        })
    }

    // ---- private helpers ----

    fn query<'a>(&'a self, job: &'a SubmittedJob) -> JobQuery<'a> {
        JobQuery {
            client_id: &self.client_id,
            job_id: job.id(),
        }
    }

    /// Ensure the response has a success status code, otherwise return a
    /// [`BacalhauApiError::ApiError`] with the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, BacalhauApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BacalhauApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BacalhauApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
