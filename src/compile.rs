//! Top-level compilation entry points.
//!
//! [`compile`] drives one request through the full pipeline and always
//! returns a well-formed [`EngineResponse`] — internal failures become the
//! error shape rather than propagating as `Err`. The caller therefore never
//! needs its own catch-all around the engine.
//!
//! The workspace lives on the stack of this function: created before the
//! first stage, dropped (and deleted) when the function returns, whichever
//! way it returns.

use crate::citations;
use crate::config::CompileConfig;
use crate::error::EngineError;
use crate::pipeline::workspace::Workspace;
use crate::pipeline::{inject, latex, select};
use crate::request::CompileRequest;
use crate::response::{assemble, CitationSummary, EngineResponse};
use std::time::Instant;
use tracing::{debug, info};

/// Compile one request end-to-end.
///
/// This is the primary entry point for the library. It does not return
/// `Err`: degraded toolchains yield partial responses, and fatal conditions
/// (unwritable temp area) yield the error shape.
pub async fn compile(req: &CompileRequest, config: &CompileConfig) -> EngineResponse {
    let start = Instant::now();
    info!("Compiling request '{}'", req.request_id);

    let response = match run_pipeline(req, config).await {
        Ok(response) => response,
        Err(e) => EngineResponse::from_error(e),
    };

    info!(
        "Request '{}' done in {}ms (error: {})",
        req.request_id,
        start.elapsed().as_millis(),
        response.is_error()
    );
    response
}

/// Synchronous wrapper around [`compile`].
///
/// Creates a temporary tokio runtime internally.
pub fn compile_sync(req: &CompileRequest, config: &CompileConfig) -> EngineResponse {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(compile(req, config)),
        Err(e) => EngineResponse::from_error(EngineError::Internal(format!(
            "Failed to create tokio runtime: {e}"
        ))),
    }
}

async fn run_pipeline(
    req: &CompileRequest,
    config: &CompileConfig,
) -> Result<EngineResponse, EngineError> {
    // ── Step 1: Workspace ────────────────────────────────────────────────
    let ws = Workspace::create(&req.request_id, config.workspace_root.as_deref())?;
    ws.write_source(&req.source).await?;
    if let Some(ref bibliography) = req.bibliography {
        ws.write_bibliography(bibliography).await?;
    }

    // ── Step 2: Conversion (rich or fallback) ────────────────────────────
    let outcome = select::convert(req, &ws, config).await;
    let mut warnings = outcome.warnings;

    // ── Step 3: Metadata injection ───────────────────────────────────────
    let latex_source = inject::inject_metadata(
        outcome.latex,
        &req.frontmatter,
        req.latex_preamble.as_deref(),
    );
    ws.write_latex(&latex_source).await?;
    debug!("LaTeX document ready ({} bytes)", latex_source.len());

    // ── Step 4: Citation summary ─────────────────────────────────────────
    let citations = summarize_citations(req);

    // ── Step 5: Compilation passes ───────────────────────────────────────
    let compile_outcome = latex::run(&ws, config, &mut warnings).await;

    // ── Step 6: Assembly ─────────────────────────────────────────────────
    Ok(assemble(
        latex_source,
        warnings,
        compile_outcome,
        citations,
        &req.options,
    ))
}

/// Build the citation summary for the response.
///
/// Resolution happens only when the request carries a bibliography; without
/// one the summary stays zero/empty even if the source contains citation
/// markers, since there is nothing to resolve them against.
fn summarize_citations(req: &CompileRequest) -> CitationSummary {
    let Some(ref bibliography) = req.bibliography else {
        return CitationSummary::default();
    };

    let keys = citations::extract_keys(&req.source);
    let report = citations::resolve(bibliography, &keys);
    debug!(
        "Citations: {} cited, {} resolved",
        keys.len(),
        report.resolved.len()
    );
    CitationSummary {
        total: keys.len(),
        resolved: report.resolved.len(),
        unresolved: report.unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Capabilities;

    fn degraded_config() -> CompileConfig {
        CompileConfig::builder()
            .capabilities(Capabilities::none())
            .build()
            .unwrap()
    }

    fn request(json: serde_json::Value) -> CompileRequest {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn no_toolchain_yields_partial_with_section_and_body() {
        let req = request(serde_json::json!({
            "request_id": "r1",
            "source": "# Title\n\nBody text.",
            "frontmatter": {"title": "T"}
        }));
        let resp = compile(&req, &degraded_config()).await;

        let latex = resp.latex_source().expect("partial carries latex");
        assert!(latex.contains("\\section{Title}"));
        assert!(latex.contains("Body text."));
        assert!(resp
            .warnings()
            .iter()
            .any(|w| w.contains("pdflatex not found")));

        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("pdf_base64").is_none());
    }

    #[tokio::test]
    async fn citations_resolve_against_the_request_bibliography() {
        let req = request(serde_json::json!({
            "request_id": "r-cite",
            "source": "Prior work [@smith2020] and [@ghost].",
            "bibliography": "@article{smith2020, title = {T}}"
        }));
        let resp = compile(&req, &degraded_config()).await;

        match resp {
            EngineResponse::Partial { citations, .. } => {
                assert_eq!(citations.total, 2);
                assert_eq!(citations.resolved, 1);
                assert_eq!(citations.unresolved, vec!["ghost"]);
            }
            other => panic!("expected Partial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_bibliography_means_zero_citation_summary() {
        let req = request(serde_json::json!({
            "request_id": "r-nobib",
            "source": "Cites [@smith2020] with no bibliography."
        }));
        let resp = compile(&req, &degraded_config()).await;
        match resp {
            EngineResponse::Partial { citations, .. } => {
                assert_eq!(citations, CitationSummary::default());
            }
            other => panic!("expected Partial, got {other:?}"),
        }
    }

    #[test]
    fn compile_sync_mirrors_compile() {
        let req = request(serde_json::json!({
            "request_id": "r-sync",
            "source": "# S"
        }));
        let resp = compile_sync(&req, &degraded_config());
        assert!(resp.latex_source().unwrap().contains("\\section{S}"));
    }
}
