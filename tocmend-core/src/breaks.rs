//! Page-break enforcement for the anchor paragraph.

use crate::anchor;
use crate::doc::{Document, PAGE_BREAK};

/// Make sure the anchor paragraph starts a fresh page.
///
/// The anchor is re-located from the live document; if it exists and does
/// not already sit at the document start, a page-break paragraph is inserted
/// immediately before it. An anchor at offset 0 (or no anchor at all) gets
/// no break - that would only manufacture a blank leading page.
///
/// Returns true if a break was inserted.
pub fn enforce_page_break(doc: &mut Document) -> bool {
    let Some(anchor) = anchor::locate(doc) else {
        return false;
    };
    if anchor.span.start == 0 {
        return false;
    }

    let insertion = anchor.span.collapse_to_start();
    doc.insert(insertion.start, &format!("{PAGE_BREAK}\n"));
    true
}
