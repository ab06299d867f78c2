//! Locating the paragraph that marks where the TOC belongs.

use crate::doc::{Document, Span};

/// Substrings that mark a paragraph as the TOC heading. Order matters only
/// for readability; any hit wins.
const MARKERS: [&str; 3] = ["table of contents", "toc", "contents"];

/// The located anchor paragraph. Offsets are stale after any mutation;
/// re-locate instead of caching across edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub paragraph: usize,
    pub span: Span,
}

/// Scan paragraphs in document order and return the first whose trimmed,
/// lowercased text contains a marker substring. Scanning stops on the first
/// hit.
///
/// The match is a plain substring test against the full paragraph text, not
/// scoped to heading-styled paragraphs - a body paragraph that merely
/// mentions "contents" will be picked up. Kept bug-compatible with the
/// behavior this replaces.
pub fn locate(doc: &Document) -> Option<Anchor> {
    for idx in 0..doc.paragraph_count() {
        let text = doc.paragraph_text(idx).trim().to_lowercase();
        if MARKERS.iter().any(|m| text.contains(m)) {
            return Some(Anchor {
                paragraph: idx,
                span: doc.paragraph_span(idx),
            });
        }
    }
    None
}
