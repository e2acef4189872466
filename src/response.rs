//! The response envelope and the Result Assembler.
//!
//! One request produces exactly one of three wire shapes:
//!
//! ```text
//! { pdf_base64, latex_source, page_count, warnings, citations }   success
//! { latex_source, warnings, citations }                           partial
//! { error: { code, message, details? } }                          error
//! ```
//!
//! A degraded compilation (tool missing, timeout, no artifact) is
//! deliberately **partial**, not an error: the generated LaTeX source is
//! still useful to the caller, and the warning list explains which condition
//! occurred. The error shape is reserved for requests that produced no
//! usable markup at all. A response is never silently empty — either it
//! carries an artifact, or its warnings/error say why not.

use crate::error::{EngineError, ErrorCode};
use crate::pipeline::encode;
use crate::pipeline::latex::CompileOutcome;
use crate::request::RequestOptions;
use serde::{Deserialize, Serialize};

/// Summary of citation resolution carried into the response.
///
/// Supplied to the assembler by whoever resolved the bibliography;
/// defaulted to zero/empty when nothing was resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationSummary {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: Vec<String>,
}

/// The single JSON document written back to the caller.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineResponse {
    /// The artifact was produced.
    Success {
        pdf_base64: String,
        latex_source: String,
        page_count: usize,
        warnings: Vec<String>,
        citations: CitationSummary,
    },
    /// No artifact, but the markup document is usable.
    Partial {
        latex_source: String,
        warnings: Vec<String>,
        citations: CitationSummary,
    },
    /// No usable output at all.
    Error { error: ErrorBody },
}

/// Body of the error shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl EngineResponse {
    /// Fold a fatal pipeline error into the error shape.
    pub fn from_error(err: EngineError) -> Self {
        EngineResponse::Error {
            error: ErrorBody {
                code: err.code().as_str().to_string(),
                message: err.to_string(),
                details: None,
            },
        }
    }

    /// True for the `{error: ...}` shape.
    pub fn is_error(&self) -> bool {
        matches!(self, EngineResponse::Error { .. })
    }

    /// The generated LaTeX source, when the response carries one.
    pub fn latex_source(&self) -> Option<&str> {
        match self {
            EngineResponse::Success { latex_source, .. }
            | EngineResponse::Partial { latex_source, .. } => Some(latex_source),
            EngineResponse::Error { .. } => None,
        }
    }

    /// The warning list, when the response carries one.
    pub fn warnings(&self) -> &[String] {
        match self {
            EngineResponse::Success { warnings, .. }
            | EngineResponse::Partial { warnings, .. } => warnings,
            EngineResponse::Error { .. } => &[],
        }
    }
}

/// Assemble the response from the pipeline's parts.
///
/// `warnings` already carries everything the selector and driver observed.
/// With `require_pdf` set, the degraded outcomes escalate to the error shape
/// using the matching boundary code; otherwise they map to partial results.
pub fn assemble(
    latex_source: String,
    warnings: Vec<String>,
    outcome: CompileOutcome,
    citations: CitationSummary,
    options: &RequestOptions,
) -> EngineResponse {
    let (code, message) = match outcome {
        CompileOutcome::Artifact(bytes) => {
            return EngineResponse::Success {
                pdf_base64: encode::encode_pdf(&bytes),
                page_count: encode::estimate_page_count(&bytes),
                latex_source,
                warnings,
                citations,
            };
        }
        CompileOutcome::ToolMissing => (
            ErrorCode::PdflatexNotFound,
            "pdflatex not found; no PDF was produced".to_string(),
        ),
        CompileOutcome::TimedOut { pass } => (
            ErrorCode::CompilationTimeout,
            format!("pdflatex compilation timed out during pass {pass}"),
        ),
        CompileOutcome::NoArtifact => (
            ErrorCode::CompilationFailed,
            "pdflatex ran but produced no PDF artifact".to_string(),
        ),
    };

    if options.require_pdf {
        EngineResponse::from_error(EngineError::ArtifactRequired { code, message })
    } else {
        EngineResponse::Partial {
            latex_source,
            warnings,
            citations,
        }
    }
}
