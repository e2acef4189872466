//! Request-scoped compilation workspace.
//!
//! Every request gets a fresh, uniquely named directory holding its source
//! file, optional bibliography, generated LaTeX, and compiler artifacts.
//! The directory name embeds the request id (sanitized) plus a random
//! suffix, so concurrent requests — even ones reusing a request id — can
//! never collide on the filesystem. No locking is involved; naming alone
//! partitions the namespace.
//!
//! Cleanup is drop-based: the wrapped [`TempDir`] removes the tree on every
//! exit path, including panics unwinding through the pipeline. No workspace
//! outlives its request.

use crate::error::EngineError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

const SOURCE_FILE: &str = "input.md";
const BIB_FILE: &str = "references.bib";
const TEX_FILE: &str = "output.tex";
const PDF_FILE: &str = "output.pdf";

/// A scoped, exclusively owned filesystem area for one request.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create the workspace under `root` (or the system temp dir).
    pub fn create(request_id: &str, root: Option<&Path>) -> Result<Self, EngineError> {
        let root = root
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);
        let prefix = format!("mdlatex-{}-", sanitize_id(request_id));
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(&root)
            .map_err(|source| EngineError::WorkspaceCreate { root, source })?;
        debug!("Workspace created: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn source_path(&self) -> PathBuf {
        self.dir.path().join(SOURCE_FILE)
    }

    pub fn bib_path(&self) -> PathBuf {
        self.dir.path().join(BIB_FILE)
    }

    pub fn tex_path(&self) -> PathBuf {
        self.dir.path().join(TEX_FILE)
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.dir.path().join(PDF_FILE)
    }

    pub async fn write_source(&self, source: &str) -> Result<(), EngineError> {
        self.write(self.source_path(), source).await
    }

    pub async fn write_bibliography(&self, bibliography: &str) -> Result<(), EngineError> {
        self.write(self.bib_path(), bibliography).await
    }

    pub async fn write_latex(&self, latex: &str) -> Result<(), EngineError> {
        self.write(self.tex_path(), latex).await
    }

    pub async fn read_latex(&self) -> Result<String, EngineError> {
        let path = self.tex_path();
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| EngineError::WorkspaceIo { path, source })
    }

    async fn write(&self, path: PathBuf, contents: &str) -> Result<(), EngineError> {
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| EngineError::WorkspaceIo { path, source })
    }
}

/// Keep the request id filesystem-safe: alphanumerics, `-` and `_` pass
/// through, everything else becomes `_`. Truncated so the directory name
/// stays well under platform limits.
fn sanitize_id(request_id: &str) -> String {
    let cleaned: String = request_id
        .chars()
        .take(48)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}
