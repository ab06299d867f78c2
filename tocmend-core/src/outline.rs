//! Heading outline extraction.
//!
//! The outline is the read-only, document-ordered list of heading
//! paragraphs; TOC entries are derived from it and never authored directly.
//! Both ATX (`# ...`) and setext (`===`/`---` underline) headings count.

use crate::doc::{Document, Span};

/// A heading paragraph in the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    /// Paragraph index of the heading line.
    pub paragraph: usize,
    /// Character span of the heading paragraph, stale after any mutation.
    pub span: Span,
}

/// Extract every heading in document order.
pub fn extract_headings(doc: &Document) -> Vec<Heading> {
    let mut headings = Vec::new();
    let count = doc.paragraph_count();

    let mut idx = 0;
    while idx < count {
        let line = doc.paragraph_text(idx);
        let trimmed = line.trim_end();

        if let Some(level) = parse_atx_heading(trimmed) {
            let stripped = trimmed.trim_start();
            let text = stripped[level..].trim().to_string();
            headings.push(Heading {
                level: level as u8,
                text,
                paragraph: idx,
                span: doc.paragraph_span(idx),
            });
        } else if idx + 1 < count && !trimmed.trim().is_empty() {
            let next = doc.paragraph_text(idx + 1);
            if let Some(level) = parse_setext_underline(next.trim()) {
                headings.push(Heading {
                    level,
                    text: trimmed.trim().to_string(),
                    paragraph: idx,
                    span: doc.paragraph_span(idx),
                });
                // Skip the underline
                idx += 1;
            }
        }

        idx += 1;
    }

    headings
}

/// Headings whose level falls within `[min_level, max_level]`.
pub fn heading_outline(doc: &Document, min_level: u8, max_level: u8) -> Vec<Heading> {
    extract_headings(doc)
        .into_iter()
        .filter(|h| h.level >= min_level && h.level <= max_level)
        .collect()
}

/// Parse an ATX heading (returns level if valid, None otherwise).
pub(crate) fn parse_atx_heading(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('#') {
        return None;
    }

    let hash_count = trimmed.chars().take_while(|&c| c == '#').count();
    if hash_count > 6 {
        return None;
    }

    // Must be followed by whitespace or be at end
    let rest = &trimmed[hash_count..];
    if rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace()) {
        Some(hash_count)
    } else {
        None
    }
}

/// Parse a setext heading underline (returns level if valid).
pub(crate) fn parse_setext_underline(line: &str) -> Option<u8> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let first_char = trimmed.chars().next()?;
    if first_char == '=' && trimmed.chars().all(|c| c == '=') {
        Some(1)
    } else if first_char == '-' && trimmed.chars().all(|c| c == '-') {
        Some(2)
    } else {
        None
    }
}
