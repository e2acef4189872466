//! CLI binary for mdlatex.
//!
//! A thin shim over the library crate: each invocation reads exactly one
//! JSON document (stdin or `--input`), runs one engine mode, and writes
//! exactly one JSON document to stdout. Logs go to stderr so stdout stays a
//! pure JSON channel for the dispatcher that spawned us.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mdlatex::{citations, compile, mathcheck, CompileConfig, CompileRequest, EngineResponse};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r##"EXAMPLES:
  # Compile a request from stdin (the default mode)
  echo '{"request_id":"r1","source":"# Hello"}' | mdlatex

  # Compile from a file, pretty-printed response to a file
  mdlatex compile --input request.json --output response.json --pretty

  # Fail hard when no PDF can be produced (CI gating)
  mdlatex compile --require-pdf < request.json

  # Resolve BibTeX keys
  echo '{"bibliography_content":"@article{k1,title={T}}","citation_keys":["k1","k2"]}' \
    | mdlatex citations

  # Validate math expressions
  echo '{"expressions":[{"id":"e1","expression":"$x^2$"}]}' | mdlatex check-math

EXIT STATUS:
  0  success or partial success (LaTeX produced, PDF possibly absent)
  1  error response written ({"error": ...}), including malformed input JSON

ENVIRONMENT VARIABLES:
  MDLATEX_PANDOC     Path to the pandoc binary (default: pandoc on PATH)
  MDLATEX_PDFLATEX   Path to the pdflatex binary (default: pdflatex on PATH)
  MDLATEX_TIMEOUT    Per-pass compilation timeout in seconds (default: 60)
"##;

/// Compile Markdown + frontmatter requests into LaTeX and PDF.
#[derive(Parser, Debug)]
#[command(
    name = "mdlatex",
    version,
    about = "Compile Markdown + frontmatter into LaTeX and PDF — JSON in, JSON out",
    long_about = "Reads a single JSON request, compiles it through pandoc and pdflatex when \
available (with a built-in fallback converter when they are not), and writes a single JSON \
response. Degraded toolchains produce partial responses carrying the generated LaTeX source.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    #[command(flatten)]
    io: IoArgs,

    #[command(flatten)]
    compile: CompileArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MDLATEX_VERBOSE", global = true)]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "MDLATEX_QUIET", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Compile a document request (the default when no mode is given).
    Compile {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        compile: CompileArgs,
    },
    /// Resolve BibTeX citation keys against a bibliography.
    Citations {
        #[command(flatten)]
        io: IoArgs,
    },
    /// Validate a batch of LaTeX math expressions.
    CheckMath {
        #[command(flatten)]
        io: IoArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct IoArgs {
    /// Read the JSON request from this file instead of stdin.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write the JSON response to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON response.
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Args, Debug, Clone)]
struct CompileArgs {
    /// Path to the pandoc binary.
    #[arg(long, env = "MDLATEX_PANDOC", default_value = "pandoc")]
    pandoc: PathBuf,

    /// Path to the pdflatex binary.
    #[arg(long, env = "MDLATEX_PDFLATEX", default_value = "pdflatex")]
    pdflatex: PathBuf,

    /// Per-pass compilation timeout in seconds.
    #[arg(long, env = "MDLATEX_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Parent directory for request workspaces.
    #[arg(long, env = "MDLATEX_WORKSPACE_ROOT")]
    workspace_root: Option<PathBuf>,

    /// Treat a missing/failed/timed-out PDF as a hard error.
    #[arg(long)]
    require_pdf: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.mode {
        None => run_compile(cli.io, cli.compile).await,
        Some(Mode::Compile { io, compile }) => run_compile(io, compile).await,
        Some(Mode::Citations { io }) => run_citations(io),
        Some(Mode::CheckMath { io }) => run_check_math(io),
    }
}

// ── Modes ────────────────────────────────────────────────────────────────

async fn run_compile(io: IoArgs, args: CompileArgs) -> Result<ExitCode> {
    let raw = read_request(&io)?;

    let mut req: CompileRequest = match serde_json::from_str(&raw) {
        Ok(req) => req,
        // Malformed envelope: still answer with the error shape.
        Err(e) => return write_parse_error(&io, e),
    };
    if args.require_pdf {
        req.options.require_pdf = true;
    }

    // Toolchain probe happens here, once per process.
    let mut builder = CompileConfig::builder()
        .pandoc_program(args.pandoc)
        .pdflatex_program(args.pdflatex)
        .pass_timeout_secs(args.timeout);
    if let Some(root) = args.workspace_root {
        builder = builder.workspace_root(root);
    }
    let config = match builder.build() {
        Ok(config) => config,
        Err(e) => {
            let resp = EngineResponse::from_error(e);
            write_response(&io, &serde_json::to_value(&resp)?)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let response = compile(&req, &config).await;
    write_response(&io, &serde_json::to_value(&response)?)?;
    Ok(if response.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_citations(io: IoArgs) -> Result<ExitCode> {
    let raw = read_request(&io)?;
    let req: citations::CitationRequest = match serde_json::from_str(&raw) {
        Ok(req) => req,
        Err(e) => return write_parse_error(&io, e),
    };
    let report = citations::resolve(&req.bibliography_content, &req.citation_keys);
    write_response(&io, &serde_json::to_value(&report)?)?;
    Ok(ExitCode::SUCCESS)
}

fn run_check_math(io: IoArgs) -> Result<ExitCode> {
    let raw = read_request(&io)?;
    let req: mathcheck::MathCheckRequest = match serde_json::from_str(&raw) {
        Ok(req) => req,
        Err(e) => return write_parse_error(&io, e),
    };
    let report = mathcheck::validate(&req);
    write_response(&io, &serde_json::to_value(&report)?)?;
    Ok(ExitCode::SUCCESS)
}

// ── I/O helpers ──────────────────────────────────────────────────────────

fn read_request(io: &IoArgs) -> Result<String> {
    match &io.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file '{}'", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            Ok(buf)
        }
    }
}

fn write_response(io: &IoArgs, value: &serde_json::Value) -> Result<()> {
    let rendered = if io.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match &io.output {
        Some(path) => std::fs::write(path, rendered + "\n")
            .with_context(|| format!("Failed to write response file '{}'", path.display())),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

fn write_parse_error(io: &IoArgs, e: serde_json::Error) -> Result<ExitCode> {
    let resp = EngineResponse::from_error(e.into());
    write_response(io, &serde_json::to_value(&resp)?)?;
    Ok(ExitCode::FAILURE)
}
