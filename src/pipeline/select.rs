//! Conversion Strategy Selector.
//!
//! Tries the rich pandoc path first, falls back to the Markup Normalizer on
//! any rich failure, and records a warning describing the degraded path.
//! The two failure reasons get distinct warning texts: "not installed" is an
//! operational signal, while "conversion failed" may indicate malformed
//! source. The selector itself never fails — a [`ConversionOutcome`] always
//! comes back.

use crate::config::CompileConfig;
use crate::pipeline::workspace::Workspace;
use crate::pipeline::{fallback, pandoc};
use crate::request::CompileRequest;
use tracing::{debug, info};

/// The intermediate document plus any non-fatal conversion warnings.
/// Produced exactly once per request.
#[derive(Debug)]
pub struct ConversionOutcome {
    pub latex: String,
    pub warnings: Vec<String>,
}

/// Produce the LaTeX document for this request, rich path first.
pub async fn convert(
    req: &CompileRequest,
    ws: &Workspace,
    config: &CompileConfig,
) -> ConversionOutcome {
    let mut warnings = Vec::new();

    if config.capabilities.pandoc {
        match pandoc::convert(ws, config, req.bibliography.is_some()).await {
            Ok(latex) => {
                debug!("Rich conversion succeeded ({} bytes)", latex.len());
                return ConversionOutcome { latex, warnings };
            }
            Err(pandoc::RichConvertError::NotInstalled) => {
                // Probe said yes but the spawn said no: the binary vanished
                // between config build and now. Same degraded path.
                warnings.push("pandoc not installed; using basic conversion".to_string());
            }
            Err(pandoc::RichConvertError::Failed(detail)) => {
                warnings.push(format!(
                    "pandoc conversion failed: {detail}; using basic conversion"
                ));
            }
        }
    } else {
        warnings.push("pandoc not installed; using basic conversion".to_string());
    }

    info!("Using fallback markdown conversion");
    let latex = fallback::render(&req.source, &req.frontmatter, req.latex_preamble.as_deref());
    ConversionOutcome { latex, warnings }
}
