//! Compilation Driver: run pdflatex over the workspace, bounded and classified.
//!
//! Per request the driver walks a fixed state machine:
//! `Preparing → Compiling(pass 1) → Compiling(pass 2) → Done`, with exit
//! edges to tool-missing, timeout, and failed. Exactly two passes run —
//! cross-reference resolution is approximated by a constant pass count, not
//! by detecting convergence. A non-zero exit code is a warning, not an
//! abort: TeX compilers routinely exit non-zero on resolvable warnings, and
//! the only verdict that matters is whether `output.pdf` exists afterwards.
//!
//! Each pass is bounded by a wall-clock timeout. Exceeding it kills the
//! child (`kill_on_drop`) and aborts the whole compilation — timeout is
//! reported distinctly from failure so callers can tell "try again" from
//! "fix your input".

use crate::config::CompileConfig;
use crate::pipeline::workspace::Workspace;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Fixed pass count for cross-reference resolution.
const LATEX_PASSES: u32 = 2;

/// Longest stdout tail carried into a warning.
const WARNING_TAIL_CHARS: usize = 500;

/// How a compilation attempt ended.
#[derive(Debug)]
pub enum CompileOutcome {
    /// `output.pdf` exists; bytes read fully into memory.
    Artifact(Vec<u8>),
    /// The compiler ran its passes but produced no artifact.
    NoArtifact,
    /// The compiler binary could not be located; no pass was attempted.
    ToolMissing,
    /// A pass exceeded the wall-clock bound; remaining passes were aborted.
    TimedOut { pass: u32 },
}

/// Run the fixed number of compilation passes over `output.tex`.
///
/// Non-fatal observations (non-zero exits, missing artifact, tool absence)
/// are appended to `warnings`; the returned outcome classifies the result.
pub async fn run(
    ws: &Workspace,
    config: &CompileConfig,
    warnings: &mut Vec<String>,
) -> CompileOutcome {
    if !config.capabilities.pdflatex {
        info!("pdflatex unavailable; skipping compilation");
        warnings.push("pdflatex not found; returning LaTeX source only".to_string());
        return CompileOutcome::ToolMissing;
    }

    for pass in 1..=LATEX_PASSES {
        debug!("pdflatex pass {}/{}", pass, LATEX_PASSES);
        match run_pass(ws, config).await {
            PassResult::Completed { status_ok, stdout } => {
                if !status_ok {
                    warnings.push(format!("pdflatex warning: {}", tail(&stdout)));
                }
            }
            PassResult::NotFound => {
                warnings.push("pdflatex not found; returning LaTeX source only".to_string());
                return CompileOutcome::ToolMissing;
            }
            PassResult::TimedOut => {
                warn!("pdflatex pass {} exceeded {}s", pass, config.pass_timeout_secs);
                warnings.push(format!(
                    "pdflatex compilation timed out ({}s)",
                    config.pass_timeout_secs
                ));
                return CompileOutcome::TimedOut { pass };
            }
            PassResult::SpawnFailed(detail) => {
                warnings.push(format!("pdflatex invocation failed: {detail}"));
                return CompileOutcome::NoArtifact;
            }
        }
    }

    match tokio::fs::read(ws.pdf_path()).await {
        Ok(bytes) => {
            info!("Compilation produced {} bytes", bytes.len());
            CompileOutcome::Artifact(bytes)
        }
        Err(_) => {
            warnings.push("PDF file was not produced".to_string());
            CompileOutcome::NoArtifact
        }
    }
}

enum PassResult {
    Completed { status_ok: bool, stdout: String },
    NotFound,
    TimedOut,
    SpawnFailed(String),
}

/// One bounded compiler invocation.
async fn run_pass(ws: &Workspace, config: &CompileConfig) -> PassResult {
    let mut cmd = Command::new(&config.pdflatex_program);
    cmd.arg("-interaction=nonstopmode")
        .arg("-output-directory")
        .arg(ws.path())
        .arg(ws.tex_path())
        .current_dir(ws.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return PassResult::NotFound,
        Err(e) => return PassResult::SpawnFailed(e.to_string()),
    };

    let bound = Duration::from_secs(config.pass_timeout_secs);
    match tokio::time::timeout(bound, child.wait_with_output()).await {
        Ok(Ok(output)) => PassResult::Completed {
            status_ok: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        },
        Ok(Err(e)) => PassResult::SpawnFailed(e.to_string()),
        // Dropping the future drops the child; kill_on_drop reaps it.
        Err(_elapsed) => PassResult::TimedOut,
    }
}

/// Last `WARNING_TAIL_CHARS` characters of the compiler transcript.
fn tail(stdout: &str) -> &str {
    if stdout.is_empty() {
        return "no output";
    }
    let start = stdout
        .char_indices()
        .rev()
        .nth(WARNING_TAIL_CHARS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &stdout[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Capabilities;

    #[test]
    fn tail_handles_short_and_empty_transcripts() {
        assert_eq!(tail(""), "no output");
        assert_eq!(tail("short"), "short");
    }

    #[test]
    fn tail_takes_at_most_the_cap() {
        let long = "x".repeat(2000);
        assert_eq!(tail(&long).len(), WARNING_TAIL_CHARS);
    }

    #[tokio::test]
    async fn missing_tool_short_circuits_without_a_pass() {
        let ws = Workspace::create("latex-missing", None).unwrap();
        let config = CompileConfig::builder()
            .capabilities(Capabilities::none())
            .build()
            .unwrap();

        let mut warnings = Vec::new();
        match run(&ws, &config, &mut warnings).await {
            CompileOutcome::ToolMissing => {}
            other => panic!("expected ToolMissing, got {other:?}"),
        }
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("pdflatex not found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_warns_but_both_passes_still_run() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("passes.log");
        let stub = dir.path().join("pdflatex-stub");
        // -output-directory value is $3; grumble on stdout, still produce the
        // artifact, and exit non-zero like a TeX run with resolvable issues.
        std::fs::write(
            &stub,
            format!(
                "#!/bin/sh\necho pass >> \"{}\"\necho 'Overfull hbox'\nprintf '%%PDF-1.4' > \"$3/output.pdf\"\nexit 1\n",
                log.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ws = Workspace::create("latex-nonzero", None).unwrap();
        ws.write_latex("\\relax").await.unwrap();
        let config = CompileConfig::builder()
            .pdflatex_program(&stub)
            .capabilities(Capabilities::all())
            .build()
            .unwrap();

        let mut warnings = Vec::new();
        match run(&ws, &config, &mut warnings).await {
            CompileOutcome::Artifact(bytes) => assert!(bytes.starts_with(b"%PDF")),
            other => panic!("expected Artifact, got {other:?}"),
        }
        let passes = std::fs::read_to_string(&log).unwrap().lines().count();
        assert_eq!(passes, 2, "exactly two passes must run");
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Overfull hbox"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_compiler_is_classified_as_timeout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let stub = dir.path().join("pdflatex-stub");
        std::fs::write(&stub, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ws = Workspace::create("latex-slow", None).unwrap();
        ws.write_latex("\\relax").await.unwrap();
        let config = CompileConfig::builder()
            .pdflatex_program(&stub)
            .pass_timeout_secs(1)
            .capabilities(Capabilities::all())
            .build()
            .unwrap();

        let mut warnings = Vec::new();
        match run(&ws, &config, &mut warnings).await {
            CompileOutcome::TimedOut { pass: 1 } => {}
            other => panic!("expected TimedOut on pass 1, got {other:?}"),
        }
        assert!(warnings[0].contains("timed out (1s)"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn artifactless_run_is_classified_as_no_artifact() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let stub = dir.path().join("pdflatex-stub");
        std::fs::write(&stub, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ws = Workspace::create("latex-noartifact", None).unwrap();
        ws.write_latex("\\relax").await.unwrap();
        let config = CompileConfig::builder()
            .pdflatex_program(&stub)
            .capabilities(Capabilities::all())
            .build()
            .unwrap();

        let mut warnings = Vec::new();
        match run(&ws, &config, &mut warnings).await {
            CompileOutcome::NoArtifact => {}
            other => panic!("expected NoArtifact, got {other:?}"),
        }
        assert!(warnings[0].contains("PDF file was not produced"));
    }
}
