//! # mdlatex
//!
//! Compile Markdown + frontmatter into LaTeX and PDF.
//!
//! ## Why this crate?
//!
//! Turning structured document requests into PDFs means living with an
//! external toolchain that may or may not exist: pandoc for rich conversion,
//! pdflatex for compilation. This crate treats both as optional. When pandoc
//! is missing or fails, a built-in normalizer produces a minimal but valid
//! LaTeX document; when pdflatex is missing, times out, or produces nothing,
//! the caller still receives the generated LaTeX source as a partial result.
//! Degradation is explicit — warnings name the condition — never silent.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request (JSON)
//!  │
//!  ├─ 1. Workspace  fresh per-request temp dir, removed on every exit path
//!  ├─ 2. Convert    pandoc --standalone (falls back to the built-in normalizer)
//!  ├─ 3. Inject     preamble / \title / required packages before \begin{document}
//!  ├─ 4. Compile    pdflatex × 2 passes, 60 s wall-clock bound per pass
//!  ├─ 5. Encode     PDF → base64, page count from structural markers
//!  └─ 6. Assemble   success | partial (LaTeX only) | error — always exactly one
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mdlatex::{compile, CompileConfig, CompileRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let req: CompileRequest = serde_json::from_str(
//!         r##"{"request_id":"r1","source":"# Hello","frontmatter":{"title":"Hello"}}"##,
//!     ).unwrap();
//!     // Toolchain availability is probed once, here — not per request.
//!     let config = CompileConfig::default();
//!     let response = compile(&req, &config).await;
//!     println!("{}", serde_json::to_string(&response).unwrap());
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mdlatex` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! mdlatex = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod citations;
pub mod compile;
pub mod config;
pub mod error;
pub mod mathcheck;
pub mod pipeline;
pub mod request;
pub mod response;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compile::{compile, compile_sync};
pub use config::{Capabilities, CompileConfig, CompileConfigBuilder};
pub use error::{EngineError, ErrorCode};
pub use request::{AuthorSpec, CompileRequest, Frontmatter, RequestOptions};
pub use response::{CitationSummary, EngineResponse, ErrorBody};
