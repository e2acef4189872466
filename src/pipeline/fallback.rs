//! Markup Normalizer: the dependency-free markdown→LaTeX fallback.
//!
//! When the rich converter is unavailable or chokes on its input, this
//! module produces a minimal but always-valid LaTeX document. It is a pure
//! function of its inputs — no I/O, no external tools, cannot fail — which
//! is exactly what the degraded path needs.
//!
//! It is a best-effort fallback, not a renderer: no escaping of control
//! characters, no tables, lists, or code blocks. Lines are classified by a
//! small rule table; anything unrecognized passes through unescaped.

use crate::request::Frontmatter;

/// Fixed document preamble emitted before anything else.
const PREAMBLE: [&str; 4] = [
    "\\documentclass{article}",
    "\\usepackage[utf8]{inputenc}",
    "\\usepackage{amsmath}",
    "\\usepackage{hyperref}",
];

/// Build a minimal LaTeX document from markdown-like source and frontmatter.
pub fn render(source: &str, frontmatter: &Frontmatter, preamble: Option<&str>) -> String {
    let mut lines: Vec<String> = PREAMBLE.iter().map(|s| s.to_string()).collect();

    if let Some(extra) = preamble {
        lines.push(extra.to_string());
    }

    lines.push("\\begin{document}".to_string());

    if let Some(ref title) = frontmatter.title {
        lines.push(format!("\\title{{{title}}}"));
    }
    if let Some(ref author) = frontmatter.author {
        lines.push(format!("\\author{{{}}}", author.joined()));
    }
    if frontmatter.title.is_some() {
        lines.push("\\maketitle".to_string());
    }

    for line in source.lines() {
        if let Some(rendered) = render_line(line.trim()) {
            lines.push(rendered);
        }
    }

    lines.push("\\end{document}".to_string());
    lines.join("\n")
}

/// Classify one trimmed source line. `None` means the line is dropped.
fn render_line(stripped: &str) -> Option<String> {
    if let Some(rest) = stripped.strip_prefix("# ") {
        return Some(format!("\\section{{{rest}}}"));
    }
    if let Some(rest) = stripped.strip_prefix("## ") {
        return Some(format!("\\subsection{{{rest}}}"));
    }
    if let Some(rest) = stripped.strip_prefix("### ") {
        return Some(format!("\\subsubsection{{{rest}}}"));
    }
    if is_horizontal_rule(stripped) {
        return None;
    }
    if is_leftover_frontmatter(stripped) {
        return None;
    }
    if stripped.is_empty() {
        return None;
    }
    Some(stripped.to_string())
}

/// A line consisting solely of three or more `-`.
fn is_horizontal_rule(stripped: &str) -> bool {
    stripped.len() >= 3 && stripped.bytes().all(|b| b == b'-')
}

/// The `key: value` heuristic: a line containing `:` whose pre-colon text is
/// at most two words is treated as frontmatter that leaked into the body and
/// dropped. Known false positive: prose like `Note: see above` is dropped
/// too. The rule is kept for compatibility with existing documents.
fn is_leftover_frontmatter(stripped: &str) -> bool {
    match stripped.split_once(':') {
        Some((key, _)) => key.split_whitespace().count() <= 2,
        None => false,
    }
}
