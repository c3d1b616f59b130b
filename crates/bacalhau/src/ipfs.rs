//! Result download through an IPFS HTTP gateway.
//!
//! Each published result is a directory CID containing the job's captured
//! `stdout`, `stderr` and `exitCode`. [`IpfsGateway::download`] fetches
//! those files into a local directory within a bounded time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use adder_core::job::{ResultManifest, STDOUT_ARTIFACT};
use reqwest::StatusCode;

/// Default bound on a whole result download.
pub const DEFAULT_IPFS_TIMEOUT: Duration = Duration::from_secs(300);

/// Files fetched from every result directory.
pub const RESULT_FILES: &[&str] = &[STDOUT_ARTIFACT, "stderr", "exitCode"];

/// Storage source name of results the gateway can serve.
pub const IPFS_STORAGE_SOURCE: &str = "IPFS";

/// Whether a result's storage source is IPFS. An unset source is taken as
/// IPFS.
fn is_ipfs_source(source: &str) -> bool {
    source.is_empty() || source.eq_ignore_ascii_case(IPFS_STORAGE_SOURCE)
}

/// Where and how long to download.
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Directory the result files are written into. Created if missing.
    pub output_dir: PathBuf,
    /// Upper bound for the whole download.
    pub timeout: Duration,
}

impl DownloadSettings {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            timeout: DEFAULT_IPFS_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Errors from the gateway download layer.
#[derive(Debug, thiserror::Error)]
pub enum IpfsError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gateway error ({status}) fetching {cid}/{file}")]
    Gateway {
        status: u16,
        cid: String,
        file: String,
    },

    #[error("Result manifest lists no downloadable results")]
    NoResults,

    #[error("Download timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP client for an IPFS gateway.
pub struct IpfsGateway {
    client: reqwest::Client,
    gateway_url: String,
}

impl IpfsGateway {
    /// * `gateway_url` - Gateway base URL, e.g. `https://ipfs.io`.
    pub fn new(gateway_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), gateway_url)
    }

    pub fn with_client(client: reqwest::Client, gateway_url: String) -> Self {
        Self {
            client,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        }
    }

    /// Download every result listed in `manifest` into
    /// `settings.output_dir`.
    ///
    /// Entries without a CID, or stored somewhere other than IPFS, are
    /// skipped. A file missing from a result directory (gateway 404) is
    /// skipped; any other gateway failure aborts
    /// the download. When several results are listed, later ones overwrite
    /// earlier files of the same name.
    pub async fn download(
        &self,
        manifest: &ResultManifest,
        settings: &DownloadSettings,
    ) -> Result<(), IpfsError> {
        let cids: Vec<&str> = manifest
            .artifacts
            .iter()
            .filter(|a| {
                let fetchable = is_ipfs_source(&a.storage_source) && !a.cid.is_empty();
                if !fetchable {
                    tracing::warn!(
                        name = %a.name,
                        storage_source = %a.storage_source,
                        cid = %a.cid,
                        "Skipping result not reachable through the IPFS gateway",
                    );
                }
                fetchable
            })
            .map(|a| a.cid.as_str())
            .collect();

        if cids.is_empty() {
            return Err(IpfsError::NoResults);
        }

        tokio::fs::create_dir_all(&settings.output_dir).await?;

        tokio::time::timeout(
            settings.timeout,
            self.download_all(&cids, &settings.output_dir),
        )
        .await
        .map_err(|_| IpfsError::Timeout {
            secs: settings.timeout.as_secs(),
        })?
    }

    // ---- private helpers ----

    async fn download_all(&self, cids: &[&str], output_dir: &Path) -> Result<(), IpfsError> {
        for cid in cids {
            let fetches = RESULT_FILES
                .iter()
                .map(|file| self.fetch_file(cid, file, output_dir));
            let fetched = futures::future::try_join_all(fetches).await?;

            tracing::debug!(
                cid,
                files = fetched.iter().filter(|ok| **ok).count(),
                "Downloaded result directory",
            );
        }
        Ok(())
    }

    /// Fetch one file of a result directory. Returns `false` when the
    /// gateway reports the file as missing.
    async fn fetch_file(&self, cid: &str, file: &str, output_dir: &Path) -> Result<bool, IpfsError> {
        let url = format!("{}/ipfs/{}/{}", self.gateway_url, cid, file);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(cid, file, "Result file not present");
            return Ok(false);
        }
        if !status.is_success() {
            return Err(IpfsError::Gateway {
                status: status.as_u16(),
                cid: cid.to_string(),
                file: file.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(output_dir.join(file), &bytes).await?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
