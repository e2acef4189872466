//! Pipeline stages for Markdown-to-PDF compilation.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap an
//! implementation (e.g. a different rich converter) without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! request ──▶ workspace ──▶ select ──▶ inject ──▶ latex ──▶ encode
//! (JSON)      (tempdir)    (pandoc |  (metadata  (2-pass    (base64 +
//!                           fallback)  splice)    pdflatex)  page count)
//! ```
//!
//! 1. [`workspace`] — request-scoped temp directory; drop-cleaned on every
//!    exit path
//! 2. [`select`]    — rich conversion via [`pandoc`], degrading to the
//!    [`fallback`] normalizer with a recorded warning
//! 3. [`inject`]    — splice preamble/title/package declarations before the
//!    document-start marker, idempotently
//! 4. [`latex`]     — bounded two-pass compilation with timeout discipline
//!    and outcome classification
//! 5. [`encode`]    — base64 transport encoding and the page-count estimate

pub mod encode;
pub mod fallback;
pub mod inject;
pub mod latex;
pub mod pandoc;
pub mod select;
pub mod workspace;
