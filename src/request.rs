//! The request envelope: one JSON document describing one compilation.
//!
//! A request is immutable once deserialized. Every field beyond `request_id`
//! and `source` is optional with a serde default, so the minimal useful
//! request is `{"request_id": "r1", "source": "# Title"}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One compilation request, read as a single JSON document at the boundary.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompileRequest {
    /// Opaque correlation token; also keys the workspace directory name.
    #[serde(default)]
    pub request_id: String,

    /// Markdown-like source text.
    #[serde(default)]
    pub source: String,

    /// Structured metadata supplied alongside the source.
    #[serde(default)]
    pub frontmatter: Frontmatter,

    /// BibTeX bibliography text, if the document cites anything.
    #[serde(default)]
    pub bibliography: Option<String>,

    /// Requested citation style. Carried through; does not alter the
    /// conversion commands (citeproc styling is out of scope).
    #[serde(default = "default_bibliography_style")]
    pub bibliography_style: String,

    /// Custom LaTeX preamble, injected verbatim before `\begin{document}`.
    #[serde(default)]
    pub latex_preamble: Option<String>,

    /// Recognized option flags. Unknown keys are ignored.
    #[serde(default)]
    pub options: RequestOptions,
}

fn default_bibliography_style() -> String {
    "apa".to_string()
}

/// Frontmatter mapping: `title` and `author` are interpreted, everything
/// else is carried opaquely.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Frontmatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorSpec>,

    /// Fields this engine does not interpret (date, keywords, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// An author field is either a single string or a list of names.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AuthorSpec {
    One(String),
    Many(Vec<String>),
}

impl AuthorSpec {
    /// Render the `\author{...}` argument. Lists are joined with the
    /// historical ` \\and ` separator; a one-element list has no separator.
    pub fn joined(&self) -> String {
        match self {
            AuthorSpec::One(s) => s.clone(),
            AuthorSpec::Many(names) => names.join(" \\\\and "),
        }
    }
}

/// Recognized flags from the request `options` object.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RequestOptions {
    /// Escalate tool-missing / timeout / no-artifact outcomes to a hard
    /// error instead of a partial result carrying the LaTeX source.
    #[serde(default)]
    pub require_pdf: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_request_deserializes() {
        let req: CompileRequest =
            serde_json::from_str(r##"{"request_id":"r1","source":"# Hi"}"##).unwrap();
        assert_eq!(req.request_id, "r1");
        assert_eq!(req.bibliography_style, "apa");
        assert!(req.bibliography.is_none());
        assert!(!req.options.require_pdf);
    }

    #[test]
    fn author_accepts_string_or_list() {
        let one: Frontmatter =
            serde_json::from_str(r#"{"title":"T","author":"Ada Lovelace"}"#).unwrap();
        assert_eq!(one.author.unwrap().joined(), "Ada Lovelace");

        let many: Frontmatter =
            serde_json::from_str(r#"{"author":["Ada Lovelace","Alan Turing"]}"#).unwrap();
        assert_eq!(
            many.author.unwrap().joined(),
            "Ada Lovelace \\\\and Alan Turing"
        );
    }

    #[test]
    fn single_element_author_list_has_no_separator() {
        let fm: Frontmatter = serde_json::from_str(r#"{"author":["Solo"]}"#).unwrap();
        let joined = fm.author.unwrap().joined();
        assert_eq!(joined, "Solo");
        assert!(!joined.contains("\\\\and"));
    }

    #[test]
    fn unknown_frontmatter_and_option_keys_are_tolerated() {
        let req: CompileRequest = serde_json::from_str(
            r#"{
                "request_id": "r2",
                "source": "",
                "frontmatter": {"title": "T", "date": "2024-01-01"},
                "options": {"require_pdf": true, "future_flag": 1}
            }"#,
        )
        .unwrap();
        assert!(req.options.require_pdf);
        assert!(req.frontmatter.extra.contains_key("date"));
    }
}
