use std::path::PathBuf;
use std::str::FromStr;

/// How the server waits for a submitted job before fetching results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionStrategy {
    /// Sleep a fixed number of seconds without checking job state.
    Fixed { wait_secs: u64 },
    /// Poll job state with backoff, giving up after `timeout_secs`.
    Poll { timeout_secs: u64 },
}

impl CompletionStrategy {
    /// The `COMPLETION_STRATEGY` value selecting this strategy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Poll { .. } => "poll",
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// Defaults suit local development. The compute-network host and port have
/// no defaults: when unset the requester URL is malformed and every
/// submission fails.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `600`).
    pub request_timeout_secs: u64,
    /// Directory served for every path other than the API routes.
    pub static_dir: PathBuf,
    /// Parent directory of the per-request workspaces.
    pub workspace_root: PathBuf,
    /// Requester node host (`BACALHAU_API_HOST`).
    pub bacalhau_api_host: String,
    /// Requester node port (`BACALHAU_API_PORT`).
    pub bacalhau_api_port: String,
    /// Container image the addition job runs in.
    pub job_image: String,
    /// IPFS gateway used to download job results.
    pub ipfs_gateway_url: String,
    /// Bound on a single result download, in seconds.
    pub ipfs_timeout_secs: u64,
    /// Completion wait strategy.
    pub completion: CompletionStrategy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                  |
    /// |--------------------------------|--------------------------|
    /// | `HOST`                         | `0.0.0.0`                |
    /// | `PORT`                         | `8080`                   |
    /// | `CORS_ORIGINS`                 | `http://localhost:8080`  |
    /// | `REQUEST_TIMEOUT_SECS`         | `600`                    |
    /// | `STATIC_DIR`                   | `./static`               |
    /// | `WORKSPACE_ROOT`               | `./tmp`                  |
    /// | `BACALHAU_API_HOST`            | (none)                   |
    /// | `BACALHAU_API_PORT`            | (none)                   |
    /// | `JOB_IMAGE`                    | `ubuntu`                 |
    /// | `IPFS_GATEWAY_URL`             | `https://ipfs.io`        |
    /// | `IPFS_TIMEOUT_SECS`            | `300`                    |
    /// | `COMPLETION_STRATEGY`          | `poll` (`poll`/`fixed`)  |
    /// | `COMPLETION_FIXED_WAIT_SECS`   | `15`                     |
    /// | `COMPLETION_POLL_TIMEOUT_SECS` | `120`                    |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Panics on unparsable values so misconfiguration fails at startup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let cors_origins: Vec<String> = var("CORS_ORIGINS", "http://localhost:8080")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let completion = match var("COMPLETION_STRATEGY", "poll").trim() {
            "fixed" => CompletionStrategy::Fixed {
                wait_secs: parse_var(&lookup, "COMPLETION_FIXED_WAIT_SECS", 15),
            },
            "poll" => CompletionStrategy::Poll {
                timeout_secs: parse_var(&lookup, "COMPLETION_POLL_TIMEOUT_SECS", 120),
            },
            other => panic!("COMPLETION_STRATEGY must be 'poll' or 'fixed', got '{other}'"),
        };

        Self {
            host: var("HOST", "0.0.0.0"),
            port: parse_var(&lookup, "PORT", 8080),
            cors_origins,
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 600),
            static_dir: var("STATIC_DIR", "./static").into(),
            workspace_root: var("WORKSPACE_ROOT", "./tmp").into(),
            bacalhau_api_host: var("BACALHAU_API_HOST", ""),
            bacalhau_api_port: var("BACALHAU_API_PORT", ""),
            job_image: var("JOB_IMAGE", adder_core::job::DEFAULT_IMAGE),
            ipfs_gateway_url: var("IPFS_GATEWAY_URL", "https://ipfs.io"),
            ipfs_timeout_secs: parse_var(&lookup, "IPFS_TIMEOUT_SECS", 300),
            completion,
        }
    }

    /// Requester base URL, `http://<host>:<port>`.
    pub fn bacalhau_api_url(&self) -> String {
        adder_bacalhau::api::api_url(&self.bacalhau_api_host, &self.bacalhau_api_port)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid {}: {e}", std::any::type_name::<T>())),
        None => default,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
