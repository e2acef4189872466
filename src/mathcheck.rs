//! Batch validation of LaTeX math expressions.
//!
//! A structural lint, not a grammar: each expression is stripped of its math
//! delimiters and checked for the mistakes that actually break compilation —
//! unbalanced braces and brackets, unpaired `\left`/`\right`, a dangling
//! trailing backslash, and emptiness. Anything subtler is the compiler's
//! job to reject.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Request shape for the standalone check-math mode.
#[derive(Debug, Deserialize)]
pub struct MathCheckRequest {
    #[serde(default)]
    pub expressions: Vec<MathExpression>,
}

/// One expression to validate.
#[derive(Debug, Clone, Deserialize)]
pub struct MathExpression {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub expression: String,
    /// Free-text context from the caller; accepted but not interpreted.
    #[serde(default)]
    pub context: Option<String>,
}

/// Response shape for the standalone check-math mode.
#[derive(Debug, Serialize)]
pub struct MathCheckReport {
    pub results: Vec<MathVerdict>,
}

/// Verdict for one expression.
#[derive(Debug, Serialize)]
pub struct MathVerdict {
    pub id: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validate every expression in the batch.
pub fn validate(request: &MathCheckRequest) -> MathCheckReport {
    let results = request
        .expressions
        .iter()
        .map(|expr| {
            let verdict = check_expression(&expr.expression);
            MathVerdict {
                id: expr.id.clone(),
                valid: verdict.is_ok(),
                error: verdict.err(),
            }
        })
        .collect();
    MathCheckReport { results }
}

/// Math delimiters stripped before structural checks, longest first so `$$`
/// is consumed before `$`.
const DELIMITERS: [&str; 6] = ["$$", "$", "\\[", "\\]", "\\(", "\\)"];

static RE_LEFT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\left\b").unwrap());
static RE_RIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\right\b").unwrap());

fn check_expression(expression: &str) -> Result<(), String> {
    let mut cleaned = expression.trim().to_string();
    for delim in DELIMITERS {
        cleaned = cleaned.replace(delim, "");
    }
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err("expression is empty".to_string());
    }

    check_balance(cleaned, '{', '}')?;
    check_balance(cleaned, '[', ']')?;

    let lefts = RE_LEFT.find_iter(cleaned).count();
    let rights = RE_RIGHT.find_iter(cleaned).count();
    if lefts != rights {
        return Err(format!(
            "\\left/\\right mismatch: {lefts} \\left vs {rights} \\right"
        ));
    }

    if cleaned.ends_with('\\') && !cleaned.ends_with("\\\\") {
        return Err("trailing backslash".to_string());
    }

    Ok(())
}

/// Check delimiter pairing, ignoring escaped forms (`\{`, `\}`).
fn check_balance(text: &str, open: char, close: char) -> Result<(), String> {
    let mut depth = 0i64;
    let mut prev_backslash = false;
    for c in text.chars() {
        if !prev_backslash {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("unmatched '{close}'"));
                }
            }
        }
        prev_backslash = c == '\\' && !prev_backslash;
    }
    if depth != 0 {
        return Err(format!("unmatched '{open}'"));
    }
    Ok(())
}
