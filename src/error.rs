//! Error types for the mdlatex engine.
//!
//! Two layers reflect two distinct audiences:
//!
//! * [`EngineError`] — **Fatal**: the request could not produce any usable
//!   output at all (malformed envelope, unwritable temp area). This is the
//!   only class that surfaces as the `{error: ...}` response shape.
//!
//! * Degraded outcomes — a missing toolchain, a non-zero compiler exit, or a
//!   pass timeout are *not* errors here. They are recorded as warnings and
//!   classified by the compilation driver, and the caller still receives the
//!   generated LaTeX source as a partial result.
//!
//! The separation means nothing escapes the pipeline boundary as an unhandled
//! fault: [`crate::compile`] folds every `EngineError` into a well-formed
//! error response rather than returning `Err` to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Machine-readable codes surfaced in the `error.code` field of the JSON
/// boundary, and in strict (`require_pdf`) escalations of degraded outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The request envelope was not valid JSON.
    JsonParseFailed,
    /// The compiler ran but no artifact was produced, or an internal step failed.
    CompilationFailed,
    /// The pdflatex binary could not be located.
    PdflatexNotFound,
    /// A compilation pass exceeded its wall-clock bound.
    CompilationTimeout,
}

impl ErrorCode {
    /// The wire spelling. Mixed casing is historical and load-bearing:
    /// existing callers match on these exact strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::JsonParseFailed => "json-parse-failed",
            ErrorCode::CompilationFailed => "COMPILATION_FAILED",
            ErrorCode::PdflatexNotFound => "PDFLATEX_NOT_FOUND",
            ErrorCode::CompilationTimeout => "COMPILATION_TIMEOUT",
        }
    }
}

/// All fatal errors raised inside the compilation pipeline.
///
/// Degraded-but-usable conditions (tool missing, pass timeout, no artifact)
/// never appear here; they classify the result instead.
#[derive(Debug, Error)]
pub enum EngineError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The request envelope was not valid JSON.
    #[error("Invalid JSON input: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ── Workspace errors ──────────────────────────────────────────────────
    /// The request-scoped temp directory could not be created.
    #[error("Failed to create workspace under '{root}': {source}")]
    WorkspaceCreate {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file inside the workspace could not be written or read.
    #[error("Workspace I/O failed for '{path}': {source}")]
    WorkspaceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Strict-mode escalations ───────────────────────────────────────────
    /// A degraded outcome escalated to a hard error because the caller set
    /// `require_pdf`. Carries the exact boundary code for the condition.
    #[error("{message}")]
    ArtifactRequired { code: ErrorCode, message: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Map this error to its boundary code.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::JsonParse(_) => ErrorCode::JsonParseFailed,
            EngineError::ArtifactRequired { code, .. } => *code,
            EngineError::WorkspaceCreate { .. }
            | EngineError::WorkspaceIo { .. }
            | EngineError::InvalidConfig(_)
            | EngineError::Internal(_) => ErrorCode::CompilationFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_spelling_is_stable() {
        assert_eq!(ErrorCode::JsonParseFailed.as_str(), "json-parse-failed");
        assert_eq!(ErrorCode::CompilationFailed.as_str(), "COMPILATION_FAILED");
        assert_eq!(ErrorCode::PdflatexNotFound.as_str(), "PDFLATEX_NOT_FOUND");
        assert_eq!(
            ErrorCode::CompilationTimeout.as_str(),
            "COMPILATION_TIMEOUT"
        );
    }

    #[test]
    fn json_parse_maps_to_its_code() {
        let bad: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err = EngineError::from(bad.unwrap_err());
        assert_eq!(err.code(), ErrorCode::JsonParseFailed);
    }

    #[test]
    fn workspace_errors_map_to_compilation_failed() {
        let err = EngineError::WorkspaceCreate {
            root: PathBuf::from("/nope"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.code(), ErrorCode::CompilationFailed);
        assert!(err.to_string().contains("/nope"));
    }

    #[test]
    fn escalation_keeps_its_code() {
        let err = EngineError::ArtifactRequired {
            code: ErrorCode::CompilationTimeout,
            message: "pdflatex compilation timed out (60s)".into(),
        };
        assert_eq!(err.code(), ErrorCode::CompilationTimeout);
    }
}
