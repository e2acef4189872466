//! BibTeX citation resolution.
//!
//! Given bibliography text and a list of requested keys, split the keys into
//! resolved (with their parsed entries) and unresolved. Also extracts the
//! keys a markdown source actually cites, in pandoc (`[@key]`) and LaTeX
//! (`\cite{a,b}`) spellings, so the compile pipeline can summarize citation
//! health without the caller enumerating keys.
//!
//! The parser handles the common shape of hand-written `.bib` files: `@type{
//! key, field = {value}, ... }` with brace-nested values and quoted strings.
//! `@comment` blocks are skipped; `@string` abbreviations are not expanded.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request shape for the standalone citations mode.
#[derive(Debug, Deserialize)]
pub struct CitationRequest {
    #[serde(default)]
    pub bibliography_content: String,
    #[serde(default)]
    pub citation_keys: Vec<String>,
}

/// Response shape for the standalone citations mode.
#[derive(Debug, Serialize)]
pub struct CitationReport {
    pub resolved: Vec<ResolvedCitation>,
    pub unresolved: Vec<String>,
}

/// One requested key found in the bibliography.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedCitation {
    pub key: String,
    pub entry: BibEntry,
}

/// A parsed bibliography entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BibEntry {
    /// Entry type (`article`, `book`, ...), lowercased.
    pub entry_type: String,
    /// Field map with brace/quote delimiters stripped.
    pub fields: BTreeMap<String, String>,
}

/// Resolve `citation_keys` against `bibliography` text.
pub fn resolve(bibliography: &str, citation_keys: &[String]) -> CitationReport {
    let entries = parse_bibliography(bibliography);
    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();

    for key in citation_keys {
        match entries.get(key) {
            Some(entry) => resolved.push(ResolvedCitation {
                key: key.clone(),
                entry: entry.clone(),
            }),
            None => unresolved.push(key.clone()),
        }
    }

    CitationReport {
        resolved,
        unresolved,
    }
}

static RE_ENTRY_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z]+)\s*\{\s*([^,\s{}]+)\s*,").unwrap());

/// Parse every entry in the bibliography into a key → entry map.
pub fn parse_bibliography(bibliography: &str) -> BTreeMap<String, BibEntry> {
    let mut entries = BTreeMap::new();

    for caps in RE_ENTRY_HEAD.captures_iter(bibliography) {
        let entry_type = caps[1].to_ascii_lowercase();
        if entry_type == "comment" || entry_type == "preamble" || entry_type == "string" {
            continue;
        }
        let key = caps[2].to_string();

        // The entry body runs from just past the head to the matching brace.
        let body_start = caps.get(0).unwrap().end();
        let open = bibliography[..body_start].rfind('{').unwrap_or(body_start);
        let Some(body) = balanced_block(&bibliography[open..]) else {
            continue;
        };
        let fields = parse_fields(&body[body_start - open..]);

        entries.entry(key).or_insert(BibEntry { entry_type, fields });
    }

    entries
}

/// Return the text inside the brace block starting at `text[0] == '{'`,
/// including the braces, or `None` if unbalanced.
fn balanced_block(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse `name = value` pairs from an entry body. Values may be brace
/// blocks, quoted strings, or bare words (numbers, abbreviations).
fn parse_fields(body: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let bytes = body.as_bytes();
    let mut i = 0usize;

    while i < body.len() {
        // Field name. Value blocks are consumed whole below, so any '}'
        // seen here is the entry terminator.
        while i < body.len() && !bytes[i].is_ascii_alphabetic() {
            if bytes[i] == b'}' {
                return fields;
            }
            i += 1;
        }
        let name_start = i;
        while i < body.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'-') {
            i += 1;
        }
        if name_start == i {
            break;
        }
        let name = body[name_start..i].to_ascii_lowercase();

        // '=' separator.
        while i < body.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= body.len() || bytes[i] != b'=' {
            continue;
        }
        i += 1;
        while i < body.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= body.len() {
            break;
        }

        // Value.
        let value = match bytes[i] {
            b'{' => match balanced_block(&body[i..]) {
                Some(block) => {
                    i += block.len();
                    block[1..block.len() - 1].to_string()
                }
                None => break,
            },
            b'"' => {
                let rest = &body[i + 1..];
                match rest.find('"') {
                    Some(end) => {
                        let v = rest[..end].to_string();
                        i += end + 2;
                        v
                    }
                    None => break,
                }
            }
            _ => {
                let start = i;
                while i < body.len() && bytes[i] != b',' && bytes[i] != b'}' && bytes[i] != b'\n' {
                    i += 1;
                }
                body[start..i].trim().to_string()
            }
        };

        fields.insert(name, value);

        // Skip to the next field separator.
        while i < body.len() && bytes[i] != b',' {
            if bytes[i] == b'}' {
                return fields;
            }
            i += 1;
        }
        if i < body.len() {
            i += 1;
        }
    }

    fields
}

static RE_PANDOC_CITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z](?:[A-Za-z0-9_:.#$%&+?<>~/-]*[A-Za-z0-9])?)").unwrap());
static RE_LATEX_CITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\cite[tp]?\*?\{([^}]*)\}").unwrap());

/// Extract the citation keys a markdown source references, first-seen order,
/// deduplicated. Recognizes pandoc `@key` / `[@key]` citations and LaTeX
/// `\cite{a,b}` (plus `\citet`/`\citep` variants).
pub fn extract_keys(source: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut push = |key: &str| {
        let key = key.trim();
        if !key.is_empty() && !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    };

    for caps in RE_LATEX_CITE.captures_iter(source) {
        for key in caps[1].split(',') {
            push(key);
        }
    }
    for caps in RE_PANDOC_CITE.captures_iter(source) {
        // Skip e-mail-like matches: "user@host" has a word char before '@'.
        let at = caps.get(0).unwrap().start();
        if at > 0
            && source[..at]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric())
        {
            continue;
        }
        push(&caps[1]);
    }

    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIB: &str = r#"
@article{smith2020,
  title = {A Study of Things},
  author = {Smith, Jane},
  year = 2020,
  journal = "Journal of Examples"
}

@book{doe1999,
  title = {Nested {Braces} Survive},
  publisher = {Example Press}
}

@comment{this is not an entry}
"#;

    #[test]
    fn resolves_present_keys_and_reports_missing_ones() {
        let keys = vec!["smith2020".to_string(), "ghost".to_string()];
        let report = resolve(BIB, &keys);
        assert_eq!(report.resolved.len(), 1);
        assert_eq!(report.resolved[0].key, "smith2020");
        assert_eq!(report.unresolved, vec!["ghost"]);
    }

    #[test]
    fn parses_entry_types_and_fields() {
        let entries = parse_bibliography(BIB);
        let smith = &entries["smith2020"];
        assert_eq!(smith.entry_type, "article");
        assert_eq!(smith.fields["title"], "A Study of Things");
        assert_eq!(smith.fields["author"], "Smith, Jane");
        assert_eq!(smith.fields["year"], "2020");
        assert_eq!(smith.fields["journal"], "Journal of Examples");
    }

    #[test]
    fn nested_braces_are_kept_inside_values() {
        let entries = parse_bibliography(BIB);
        assert_eq!(entries["doe1999"].fields["title"], "Nested {Braces} Survive");
    }

    #[test]
    fn comment_blocks_are_not_entries() {
        let entries = parse_bibliography(BIB);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn empty_bibliography_resolves_nothing() {
        let report = resolve("", &["a".to_string()]);
        assert!(report.resolved.is_empty());
        assert_eq!(report.unresolved, vec!["a"]);
    }

    #[test]
    fn extracts_pandoc_and_latex_keys_in_order() {
        let source = "As shown [@smith2020] and \\cite{doe1999,smith2020}, see @knuth84.";
        assert_eq!(
            extract_keys(source),
            vec!["doe1999", "smith2020", "knuth84"]
        );
    }

    #[test]
    fn email_addresses_are_not_citations() {
        assert!(extract_keys("mail me at jane@example.org").is_empty());
    }

    #[test]
    fn no_citations_yields_empty_list() {
        assert!(extract_keys("plain text, no references").is_empty());
    }
}
