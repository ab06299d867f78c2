//! Artifact cleanup ahead of the anchor.
//!
//! Documents that have been through a few rounds of manual TOC surgery
//! accumulate stray page breaks, section breaks, invisible characters and
//! blank paragraphs in front of the TOC heading. The cleaner strips those
//! from the region before the anchor (or a bounded prefix when there is no
//! anchor), then collapses leading empty paragraphs to a fixed point.

use crate::anchor;
use crate::doc::{Document, Span, INVISIBLE_CHARS, PAGE_BREAK, SECTION_BREAK};

/// Prefix scanned when the document has no anchor paragraph.
pub const NO_ANCHOR_SCAN_CHARS: usize = 2000;

/// Compute the cleanup span: everything before the anchor, or a bounded
/// document prefix when no anchor exists.
pub fn cleanup_span(doc: &Document, anchor_start: Option<usize>, no_anchor_limit: usize) -> Span {
    match anchor_start {
        Some(start) => Span::new(0, start),
        None => Span::new(0, no_anchor_limit.min(doc.len_chars())),
    }
}

/// Remove page breaks, section breaks, then each invisible character from
/// the cleanup region. The span is re-derived from the live document before
/// every pass, since each pass shifts the offsets the next one needs.
/// Returns the number of characters removed.
pub fn remove_artifacts(doc: &mut Document, no_anchor_limit: usize) -> usize {
    let needles = [
        PAGE_BREAK,
        SECTION_BREAK,
        INVISIBLE_CHARS[0],
        INVISIBLE_CHARS[1],
    ];

    let mut removed = 0;
    for needle in needles {
        let anchor_start = anchor::locate(doc).map(|a| a.span.start);
        let span = cleanup_span(doc, anchor_start, no_anchor_limit);
        let count = doc.replace_all_in(span, &needle.to_string(), "");
        if count > 0 {
            log::debug!("removed {count} occurrence(s) of U+{:04X}", needle as u32);
        }
        removed += count;
    }
    removed
}

/// Delete empty leading paragraphs until the first paragraph is non-empty,
/// the document is empty, or `max_iter` deletions have been made - whichever
/// comes first. The ceiling guards against an edit that fails to shrink the
/// structure. Returns the number of paragraphs deleted.
pub fn collapse_leading_empty(doc: &mut Document, max_iter: usize) -> usize {
    let mut deleted = 0;
    while deleted < max_iter {
        let span = doc.paragraph_span(0);
        if span.is_empty() {
            // Nothing left but the final empty paragraph.
            break;
        }
        if !doc.paragraph_text(0).trim().is_empty() {
            break;
        }
        doc.delete_span(span);
        deleted += 1;
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_span_before_anchor() {
        let doc = Document::from_text("junk\nContents\n");
        let anchor = anchor::locate(&doc).unwrap();
        let span = cleanup_span(&doc, Some(anchor.span.start), NO_ANCHOR_SCAN_CHARS);
        assert_eq!(span, Span::new(0, 5));
    }

    #[test]
    fn test_cleanup_span_no_anchor_is_bounded() {
        let text = "word ".repeat(500);
        assert!(text.chars().count() >= 2000);
        let doc = Document::from_text(&text);
        let span = cleanup_span(&doc, None, NO_ANCHOR_SCAN_CHARS);
        assert_eq!(span.end, 2000);
    }

    #[test]
    fn test_cleanup_span_no_anchor_short_document() {
        let doc = Document::from_text("short\n");
        let span = cleanup_span(&doc, None, NO_ANCHOR_SCAN_CHARS);
        assert_eq!(span, Span::new(0, 6));
    }

    #[test]
    fn test_remove_artifacts_stops_at_anchor() {
        let mut doc = Document::from_text("\u{000C}\n\u{200B}x\nContents\n\u{000C}after\n");
        let removed = remove_artifacts(&mut doc, NO_ANCHOR_SCAN_CHARS);
        assert_eq!(removed, 2);
        // The break after the anchor survives.
        assert_eq!(doc.full_text(), "\nx\nContents\n\u{000C}after\n");
    }

    #[test]
    fn test_remove_artifacts_all_kinds() {
        let mut doc =
            Document::from_text("\u{000C}\u{001C}\u{200B}\u{FEFF}body\nContents\n");
        let removed = remove_artifacts(&mut doc, NO_ANCHOR_SCAN_CHARS);
        assert_eq!(removed, 4);
        assert_eq!(doc.full_text(), "body\nContents\n");
    }

    #[test]
    fn test_collapse_leading_empty() {
        let mut doc = Document::from_text("\n   \n\u{000C}\nContent\n");
        let deleted = collapse_leading_empty(&mut doc, 50);
        // Form feed is whitespace, so a break-only paragraph is empty too.
        assert_eq!(deleted, 3);
        assert_eq!(doc.full_text(), "Content\n");
    }

    #[test]
    fn test_collapse_is_idempotent() {
        let mut doc = Document::from_text("\n\nContent\n");
        collapse_leading_empty(&mut doc, 50);
        let once = doc.full_text();
        collapse_leading_empty(&mut doc, 50);
        assert_eq!(doc.full_text(), once);
    }

    #[test]
    fn test_collapse_respects_ceiling() {
        let mut doc = Document::from_text(&"\n".repeat(10));
        let deleted = collapse_leading_empty(&mut doc, 4);
        assert_eq!(deleted, 4);
        assert_eq!(doc.paragraph_count(), 7);
    }

    #[test]
    fn test_collapse_all_empty_document_terminates() {
        let mut doc = Document::from_text("\n\n\n");
        let deleted = collapse_leading_empty(&mut doc, 50);
        assert_eq!(deleted, 3);
        assert_eq!(doc.full_text(), "");
    }
}
