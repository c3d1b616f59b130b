//! Wire types for the Bacalhau requester API.
//!
//! Field names follow the network's Go JSON encoding (PascalCase, with
//! `ID`/`CID` acronyms), so most structs carry explicit renames.

use adder_core::job::{ArtifactRef, JobSpec};
use serde::{Deserialize, Serialize};

/// API version stamped on every job payload.
pub const API_VERSION: &str = "V1beta1";

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SubmitRequest {
    pub job_create_payload: JobCreatePayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobCreatePayload {
    #[serde(rename = "ClientID")]
    pub client_id: String,
    #[serde(rename = "APIVersion")]
    pub api_version: String,
    pub spec: Spec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Spec {
    pub engine: String,
    pub verifier: String,
    pub publisher: String,
    pub docker: DockerSpec,
    pub deal: Deal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DockerSpec {
    pub image: String,
    pub entrypoint: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Deal {
    pub concurrency: u32,
}

impl From<&JobSpec> for Spec {
    fn from(job: &JobSpec) -> Self {
        Self {
            engine: job.engine().to_string(),
            verifier: job.verifier().to_string(),
            publisher: job.publisher().to_string(),
            docker: DockerSpec {
                image: job.image().to_string(),
                entrypoint: job.entrypoint().to_vec(),
            },
            deal: Deal {
                concurrency: job.concurrency(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub job: Job,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Job {
    pub metadata: JobMetadata,
}

#[derive(Debug, Deserialize)]
pub struct JobMetadata {
    #[serde(rename = "ID")]
    pub id: String,
}

// ---------------------------------------------------------------------------
// State and results
// ---------------------------------------------------------------------------

/// Body shared by the `/requester/states` and `/requester/results` calls.
#[derive(Debug, Serialize)]
pub struct JobQuery<'a> {
    pub client_id: &'a str,
    pub job_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct StateResponse {
    pub state: JobState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobState {
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct ResultsResponse {
    #[serde(default)]
    pub results: Vec<StorageSpec>,
}

/// A published result location.
#[derive(Debug, Deserialize)]
pub struct StorageSpec {
    #[serde(rename = "StorageSource", default)]
    pub storage_source: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "CID", default)]
    pub cid: String,
}

impl From<StorageSpec> for ArtifactRef {
    fn from(spec: StorageSpec) -> Self {
        Self {
            storage_source: spec.storage_source,
            name: spec.name,
            cid: spec.cid,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
