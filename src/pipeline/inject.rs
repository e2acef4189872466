//! Metadata Injector: splice declarations in front of `\begin{document}`.
//!
//! The generated document — whichever converter produced it — may be missing
//! the caller's custom preamble, a `\title`, or the quality-of-life packages
//! the compiler pass expects. Each declaration is inserted immediately
//! before the first document-start marker, and skipped when its canonical
//! form is already present, so re-running the injector is a byte-identical
//! no-op.
//!
//! If the marker is absent the document is returned unmodified. That is a
//! recoverable condition (pandoc fragments without `--standalone` have no
//! marker), not an error.

use crate::request::Frontmatter;
use tracing::debug;

const DOCUMENT_START: &str = "\\begin{document}";

/// Packages injected for every document, in this order.
const REQUIRED_PACKAGES: [&str; 3] = ["microtype", "hyperref", "bookmark"];

/// Inject custom preamble, title, and required packages.
///
/// Order: preamble first, then `\title` (only when no title declaration
/// exists yet), then each required package. Presence checks re-run against
/// the document as it grows, so a package brought in by the custom preamble
/// is not injected twice.
pub fn inject_metadata(
    mut latex: String,
    frontmatter: &Frontmatter,
    preamble: Option<&str>,
) -> String {
    if !latex.contains(DOCUMENT_START) {
        debug!("No document-start marker; skipping metadata injection");
        return latex;
    }

    if let Some(text) = preamble {
        if !text.is_empty() && !latex.contains(text) {
            latex = insert_before_marker(latex, text);
        }
    }

    if let Some(ref title) = frontmatter.title {
        if !latex.contains("\\title{") {
            latex = insert_before_marker(latex, &format!("\\title{{{title}}}"));
        }
    }

    for pkg in REQUIRED_PACKAGES {
        let declaration = format!("\\usepackage{{{pkg}}}");
        if !latex.contains(&declaration) {
            latex = insert_before_marker(latex, &declaration);
        }
    }

    latex
}

/// Splice `text` plus a newline immediately before the first marker.
fn insert_before_marker(latex: String, text: &str) -> String {
    match latex.find(DOCUMENT_START) {
        Some(idx) => {
            let mut out = String::with_capacity(latex.len() + text.len() + 1);
            out.push_str(&latex[..idx]);
            out.push_str(text);
            out.push('\n');
            out.push_str(&latex[idx..]);
            out
        }
        None => latex,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fm_with_title(title: &str) -> Frontmatter {
        Frontmatter {
            title: Some(title.to_string()),
            author: None,
            extra: Default::default(),
        }
    }

    const BARE_DOC: &str = "\\documentclass{article}\n\\begin{document}\nBody\n\\end{document}";

    #[test]
    fn injects_packages_before_document_start() {
        let out = inject_metadata(BARE_DOC.to_string(), &Frontmatter::default(), None);
        for pkg in ["microtype", "hyperref", "bookmark"] {
            let decl = format!("\\usepackage{{{pkg}}}");
            let decl_pos = out.find(&decl).unwrap();
            assert!(decl_pos < out.find("\\begin{document}").unwrap());
        }
    }

    #[test]
    fn injection_is_idempotent() {
        let once = inject_metadata(
            BARE_DOC.to_string(),
            &fm_with_title("T"),
            Some("\\usepackage{tikz}"),
        );
        let twice = inject_metadata(once.clone(), &fm_with_title("T"), Some("\\usepackage{tikz}"));
        assert_eq!(once, twice);
    }

    #[test]
    fn existing_title_is_not_duplicated() {
        let doc = format!("\\title{{Already}}\n{BARE_DOC}");
        let out = inject_metadata(doc, &fm_with_title("New"), None);
        assert!(out.contains("\\title{Already}"));
        assert!(!out.contains("\\title{New}"));
    }

    #[test]
    fn preamble_package_suppresses_required_package_injection() {
        let out = inject_metadata(
            BARE_DOC.to_string(),
            &Frontmatter::default(),
            Some("\\usepackage{microtype}"),
        );
        assert_eq!(out.matches("\\usepackage{microtype}").count(), 1);
    }

    #[test]
    fn missing_marker_is_a_no_op() {
        let fragment = "\\section{No document environment}";
        let out = inject_metadata(fragment.to_string(), &fm_with_title("T"), Some("\\relax"));
        assert_eq!(out, fragment);
    }

    #[test]
    fn preamble_is_injected_ahead_of_title_and_packages() {
        let out = inject_metadata(
            BARE_DOC.to_string(),
            &fm_with_title("T"),
            Some("% custom preamble"),
        );
        let p = out.find("% custom preamble").unwrap();
        let t = out.find("\\title{T}").unwrap();
        let m = out.find("\\usepackage{microtype}").unwrap();
        assert!(p < t && t < m, "order should be preamble, title, packages");
    }
}
