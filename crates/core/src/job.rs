//! Compute job descriptions and the handles returned for them.
//!
//! [`JobBuilder`] assembles a [`JobSpec`] starting from the defaults the
//! compute network expects for production submissions. [`addition_job`]
//! is the only job this service ever submits.

use std::fmt;

use crate::error::CoreError;
use crate::operands::Operands;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Container image used when none is configured.
pub const DEFAULT_IMAGE: &str = "ubuntu";

/// Execution engine name.
pub const ENGINE_DOCKER: &str = "Docker";
/// Verifier that accepts every result.
pub const VERIFIER_NOOP: &str = "Noop";
/// Publisher that pins results to IPFS via Estuary.
pub const PUBLISHER_ESTUARY: &str = "Estuary";
/// Number of nodes asked to run each job.
pub const DEFAULT_CONCURRENCY: u32 = 1;

/// Fixed script run by the addition job. Operands arrive as `$1`/`$2`
/// and are never spliced into the script text.
const SUM_SCRIPT: &str = "echo $(($1 + $2))";

/// Name of the artifact holding a job's captured standard output.
pub const STDOUT_ARTIFACT: &str = "stdout";

// ---------------------------------------------------------------------------
// JobSpec
// ---------------------------------------------------------------------------

/// A fully specified containerized job. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    engine: String,
    verifier: String,
    publisher: String,
    image: String,
    entrypoint: Vec<String>,
    concurrency: u32,
}

impl JobSpec {
    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn entrypoint(&self) -> &[String] {
        &self.entrypoint
    }

    pub fn concurrency(&self) -> u32 {
        self.concurrency
    }
}

/// Builder for [`JobSpec`].
#[derive(Debug, Clone)]
pub struct JobBuilder {
    engine: String,
    verifier: String,
    publisher: String,
    image: String,
    entrypoint: Vec<String>,
    concurrency: u32,
}

impl JobBuilder {
    /// Start from the network's production defaults: Docker engine, no-op
    /// verifier, Estuary publisher, concurrency 1. Image and entrypoint
    /// must still be supplied.
    pub fn with_production_defaults() -> Self {
        Self {
            engine: ENGINE_DOCKER.to_string(),
            verifier: VERIFIER_NOOP.to_string(),
            publisher: PUBLISHER_ESTUARY.to_string(),
            image: String::new(),
            entrypoint: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn entrypoint<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entrypoint = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn concurrency(mut self, concurrency: u32) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Validate and produce the final [`JobSpec`].
    pub fn build(self) -> Result<JobSpec, CoreError> {
        if self.image.trim().is_empty() {
            return Err(CoreError::Validation(
                "Job image must not be empty".to_string(),
            ));
        }
        if self.entrypoint.is_empty() {
            return Err(CoreError::Validation(
                "Job entrypoint must not be empty".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(CoreError::Validation(
                "Job concurrency must be at least 1".to_string(),
            ));
        }

        Ok(JobSpec {
            engine: self.engine,
            verifier: self.verifier,
            publisher: self.publisher,
            image: self.image,
            entrypoint: self.entrypoint,
            concurrency: self.concurrency,
        })
    }
}

/// Entrypoint printing `x + y` through shell arithmetic.
///
/// The script is constant; the operands are passed as positional
/// arguments after `$0`.
pub fn addition_entrypoint(operands: Operands) -> Vec<String> {
    vec![
        "sh".to_string(),
        "-c".to_string(),
        SUM_SCRIPT.to_string(),
        "sh".to_string(),
        operands.x.to_string(),
        operands.y.to_string(),
    ]
}

/// Build the addition job for `operands` on `image`.
pub fn addition_job(image: &str, operands: Operands) -> Result<JobSpec, CoreError> {
    JobBuilder::with_production_defaults()
        .image(image)
        .entrypoint(addition_entrypoint(operands))
        .build()
}

// ---------------------------------------------------------------------------
// Submission handles and results
// ---------------------------------------------------------------------------

/// Opaque handle for a job accepted by the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    id: String,
}

impl SubmittedJob {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for SubmittedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Lifecycle state of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    New,
    InProgress,
    Completed,
    Error,
    Cancelled,
    /// A state name this service does not model.
    Unknown(String),
}

impl JobStatus {
    /// Map a network state name (e.g. `"Completed"`) to a status.
    pub fn from_state_name(name: &str) -> Self {
        match name {
            "New" => Self::New,
            "InProgress" => Self::InProgress,
            "Completed" => Self::Completed,
            "Error" => Self::Error,
            "Cancelled" => Self::Cancelled,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether the job will not change state any more.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str("New"),
            Self::InProgress => f.write_str("InProgress"),
            Self::Completed => f.write_str("Completed"),
            Self::Error => f.write_str("Error"),
            Self::Cancelled => f.write_str("Cancelled"),
            Self::Unknown(name) => write!(f, "Unknown({name})"),
        }
    }
}

/// Where one published output of a job is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Storage backend the result was published to (e.g. `IPFS`).
    pub storage_source: String,
    /// Publisher-assigned name of the result set.
    pub name: String,
    /// Content identifier of the result directory.
    pub cid: String,
}

/// Metadata describing where a completed job's artifacts live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultManifest {
    pub artifacts: Vec<ArtifactRef>,
}

impl ResultManifest {
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
