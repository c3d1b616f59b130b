//! Scratch directories for downloaded job output.
//!
//! Every request gets its own [`Workspace`] under a shared root, so
//! concurrent requests never see each other's files. A workspace is deleted
//! by [`Workspace::release`] or, failing that, when it is dropped.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Longest request-id fragment used in a workspace directory name.
const MAX_NAME_PREFIX_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Workspace I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Owns the workspace root directory.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Recursively delete the root and recreate it empty.
    ///
    /// Only safe while no request holds a workspace; called at startup.
    pub async fn reset(&self) -> Result<(), WorkspaceError> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(WorkspaceError::io(&self.root, e)),
        }
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| WorkspaceError::io(&self.root, e))
    }

    /// Create a fresh, uniquely named workspace for one request.
    pub async fn acquire(&self, request_id: &str) -> Result<Workspace, WorkspaceError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| WorkspaceError::io(&self.root, e))?;

        let prefix = format!("{}-", name_prefix(request_id));
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(&self.root)
            .map_err(|e| WorkspaceError::io(&self.root, e))?;

        tracing::debug!(request_id, path = %dir.path().display(), "Workspace acquired");
        Ok(Workspace { dir })
    }
}

/// Keep only characters that are safe in a single path component.
fn name_prefix(request_id: &str) -> String {
    let cleaned: String = request_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_NAME_PREFIX_LEN)
        .collect();

    if cleaned.is_empty() {
        "request".to_string()
    } else {
        cleaned
    }
}

/// A per-request scratch directory.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Read a downloaded artifact by file name.
    pub async fn read_artifact(&self, name: &str) -> Result<Vec<u8>, WorkspaceError> {
        let path = self.dir.path().join(name);
        tokio::fs::read(&path)
            .await
            .map_err(|e| WorkspaceError::io(&path, e))
    }

    /// Delete the workspace and everything in it.
    pub fn release(self) -> Result<(), WorkspaceError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| WorkspaceError::io(&path, e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn reset_clears_and_recreates_root() {
        let base = tempfile::tempdir().expect("create temp dir");
        let root = base.path().join("tmp");
        std::fs::create_dir_all(root.join("stale/nested")).unwrap();
        std::fs::write(root.join("stdout"), "old").unwrap();

        let manager = WorkspaceManager::new(&root);
        manager.reset().await.unwrap();

        assert!(root.is_dir());
        assert_eq!(entries(&root), 0);
    }

    #[tokio::test]
    async fn reset_creates_missing_root() {
        let base = tempfile::tempdir().expect("create temp dir");
        let root = base.path().join("does/not/exist");

        WorkspaceManager::new(&root).reset().await.unwrap();

        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn acquire_gives_distinct_directories() {
        let base = tempfile::tempdir().expect("create temp dir");
        let manager = WorkspaceManager::new(base.path());

        let a = manager.acquire("req-1").await.unwrap();
        let b = manager.acquire("req-1").await.unwrap();

        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(base.path()));
        assert_eq!(entries(base.path()), 2);
    }

    #[tokio::test]
    async fn release_deletes_contents() {
        let base = tempfile::tempdir().expect("create temp dir");
        let manager = WorkspaceManager::new(base.path());

        let ws = manager.acquire("req-2").await.unwrap();
        std::fs::write(ws.path().join("stdout"), "3\n").unwrap();
        assert_eq!(ws.read_artifact("stdout").await.unwrap(), b"3\n");

        ws.release().unwrap();
        assert_eq!(entries(base.path()), 0);
    }

    #[tokio::test]
    async fn drop_deletes_unreleased_workspace() {
        let base = tempfile::tempdir().expect("create temp dir");
        let manager = WorkspaceManager::new(base.path());

        {
            let ws = manager.acquire("req-3").await.unwrap();
            std::fs::write(ws.path().join("stdout"), "x").unwrap();
        }

        assert_eq!(entries(base.path()), 0);
    }

    #[tokio::test]
    async fn missing_artifact_is_an_error() {
        let base = tempfile::tempdir().expect("create temp dir");
        let ws = WorkspaceManager::new(base.path())
            .acquire("req-4")
            .await
            .unwrap();

        let err = ws.read_artifact("stdout").await.unwrap_err();
        assert_matches!(err, WorkspaceError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound);
    }

    #[test]
    fn request_id_is_sanitized() {
        assert_eq!(name_prefix("../../etc/passwd"), "etcpasswd");
        assert_eq!(name_prefix("0192-abc_DEF"), "0192-abc_DEF");
        assert_eq!(name_prefix("///"), "request");
        assert_eq!(name_prefix(&"a".repeat(200)).len(), MAX_NAME_PREFIX_LEN);
    }
}
