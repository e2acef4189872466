//! Artifact encoding: PDF bytes → base64, plus a page-count estimate.
//!
//! The artifact travels inside a JSON response, so it is base64-encoded for
//! transport. The page count is derived by scanning the raw bytes for
//! structural markers — the count of page objects (`/Type /Page`) minus the
//! count of page-tree nodes (`/Type /Pages`, whose spelling contains the
//! former as a prefix and is therefore double-counted by the first scan).
//! This is an approximation over the artifact's internal structure, not a
//! parse; linearized or compressed documents may fool it, so it is floored
//! at 1 for any non-empty artifact.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

const PAGE_MARKER: &[u8] = b"/Type /Page";
const PAGE_TREE_MARKER: &[u8] = b"/Type /Pages";

/// Encode the PDF artifact for JSON transport.
pub fn encode_pdf(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded artifact → {} bytes base64", b64.len());
    b64
}

/// Best-effort page count from structural markers, floored at 1 for a
/// non-empty artifact.
pub fn estimate_page_count(bytes: &[u8]) -> usize {
    if bytes.is_empty() {
        return 0;
    }
    let pages = count_occurrences(bytes, PAGE_MARKER);
    let trees = count_occurrences(bytes, PAGE_TREE_MARKER);
    pages.saturating_sub(trees).max(1)
}

fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    if needle.is_empty() || haystack.len() < needle.len() {
        return 0;
    }
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}
