//! Rich conversion: drive pandoc to turn the markdown source into LaTeX.
//!
//! pandoc writes `output.tex` into the workspace; we read it back rather
//! than capturing stdout so the invocation matches how the compiler pass
//! later finds its input. Failure is a tagged reason, not an exception:
//! the selector matches on [`RichConvertError`] to decide the fallback and
//! phrase its warning.

use crate::config::CompileConfig;
use crate::pipeline::workspace::Workspace;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Why the rich path produced nothing.
#[derive(Debug)]
pub enum RichConvertError {
    /// The converter binary does not exist on this host.
    NotInstalled,
    /// The converter ran and failed; may indicate malformed source.
    Failed(String),
}

/// Convert `input.md` in the workspace to LaTeX via pandoc.
///
/// Citation options (`--bibliography` + `--citeproc`) are enabled together,
/// and only when the request carried a bibliography (`with_bibliography`).
pub async fn convert(
    ws: &Workspace,
    config: &CompileConfig,
    with_bibliography: bool,
) -> Result<String, RichConvertError> {
    let mut cmd = Command::new(&config.pandoc_program);
    cmd.arg(ws.source_path())
        .arg("--standalone")
        .arg("--to")
        .arg("latex")
        .arg("--output")
        .arg(ws.tex_path());

    if with_bibliography {
        cmd.arg("--bibliography").arg(ws.bib_path()).arg("--citeproc");
    }

    cmd.current_dir(ws.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Invoking pandoc (bibliography: {})", with_bibliography);

    let output = match cmd.output().await {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RichConvertError::NotInstalled);
        }
        Err(e) => return Err(RichConvertError::Failed(e.to_string())),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.trim();
        warn!("pandoc exited with {}: {}", output.status, detail);
        return Err(RichConvertError::Failed(if detail.is_empty() {
            format!("exit status {}", output.status)
        } else {
            detail.to_string()
        }));
    }

    ws.read_latex()
        .await
        .map_err(|e| RichConvertError::Failed(e.to_string()))
}
