//! TOC fields: regenerable regions delimited by marker lines.
//!
//! A field looks like
//!
//! ```text
//! <!-- toc:begin levels=1-3 pages=right -->
//! - Introduction ....................................... 1
//!   - Background ....................................... 2
//! <!-- toc:end -->
//! ```
//!
//! The begin marker carries the field configuration; everything between the
//! markers is derived from the heading outline and is rewritten wholesale on
//! every refresh. Entry lines are never authored by hand.

use serde::{Deserialize, Serialize};

use crate::doc::{Document, Span};
use crate::outline;

const FIELD_BEGIN_PREFIX: &str = "<!-- toc:begin";
const FIELD_END_MARKER: &str = "<!-- toc:end -->";
const MARKER_SUFFIX: &str = "-->";

/// Width entry lines are padded to when page numbers are right-aligned.
const ENTRY_WIDTH: usize = 60;

/// Field configuration, round-tripped through the begin marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TocFieldConfig {
    pub min_level: u8,
    pub max_level: u8,
    pub show_page_numbers: bool,
    pub right_align_page_numbers: bool,
}

impl TocFieldConfig {
    /// The styled configuration the synthesizer attempts first.
    pub fn preferred() -> Self {
        Self {
            min_level: 1,
            max_level: 3,
            show_page_numbers: true,
            right_align_page_numbers: true,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_level == 0 || self.max_level > 9 || self.min_level > self.max_level {
            return Err(format!(
                "invalid heading level window {}-{}",
                self.min_level, self.max_level
            ));
        }
        Ok(())
    }

    pub fn begin_marker(&self) -> String {
        let pages = if !self.show_page_numbers {
            "none"
        } else if self.right_align_page_numbers {
            "right"
        } else {
            "plain"
        };
        format!(
            "{FIELD_BEGIN_PREFIX} levels={}-{} pages={pages} {MARKER_SUFFIX}",
            self.min_level, self.max_level
        )
    }
}

impl Default for TocFieldConfig {
    /// The engine default used for fallback insertion: every heading level,
    /// right-aligned page numbers.
    fn default() -> Self {
        Self {
            min_level: 1,
            max_level: 9,
            show_page_numbers: true,
            right_align_page_numbers: true,
        }
    }
}

/// One derived TOC entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    pub text: String,
    pub level: u8,
    pub page: usize,
}

/// A field region located by paragraph index. `end` is `None` when the end
/// marker is missing; such a region cannot be removed or refreshed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldRegion {
    pub begin: usize,
    pub end: Option<usize>,
}

fn is_begin_marker(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with(FIELD_BEGIN_PREFIX) && trimmed.ends_with(MARKER_SUFFIX)
}

fn is_end_marker(line: &str) -> bool {
    line.trim() == FIELD_END_MARKER
}

/// Parse a begin marker back into its configuration.
fn parse_begin_marker(line: &str) -> Result<TocFieldConfig, String> {
    let trimmed = line.trim();
    let body = trimmed
        .strip_prefix(FIELD_BEGIN_PREFIX)
        .and_then(|rest| rest.strip_suffix(MARKER_SUFFIX))
        .ok_or_else(|| format!("not a field marker: {trimmed}"))?;

    let mut config = TocFieldConfig::default();
    for token in body.split_whitespace() {
        if let Some(levels) = token.strip_prefix("levels=") {
            let (min, max) = levels
                .split_once('-')
                .ok_or_else(|| format!("malformed levels token: {token}"))?;
            config.min_level = min
                .parse()
                .map_err(|_| format!("malformed levels token: {token}"))?;
            config.max_level = max
                .parse()
                .map_err(|_| format!("malformed levels token: {token}"))?;
        } else if let Some(pages) = token.strip_prefix("pages=") {
            match pages {
                "right" => {
                    config.show_page_numbers = true;
                    config.right_align_page_numbers = true;
                }
                "plain" => {
                    config.show_page_numbers = true;
                    config.right_align_page_numbers = false;
                }
                "none" => {
                    config.show_page_numbers = false;
                    config.right_align_page_numbers = false;
                }
                other => return Err(format!("unknown pages mode: {other}")),
            }
        } else {
            return Err(format!("unknown field marker token: {token}"));
        }
    }
    config.validate()?;
    Ok(config)
}

/// Locate every field region in document order.
pub fn find_fields(doc: &Document) -> Vec<FieldRegion> {
    let mut fields = Vec::new();
    let count = doc.paragraph_count();

    let mut idx = 0;
    while idx < count {
        if is_begin_marker(&doc.paragraph_text(idx)) {
            let end = (idx + 1..count).find(|&j| is_end_marker(&doc.paragraph_text(j)));
            fields.push(FieldRegion { begin: idx, end });
            idx = end.map(|j| j + 1).unwrap_or(idx + 1);
        } else {
            idx += 1;
        }
    }

    fields
}

/// Remove every removable field, one at a time, rescanning after each
/// removal. Returns `(removed, residue)`; residue counts regions that could
/// not be removed (missing end marker) and were skipped.
pub fn strip_fields(doc: &mut Document) -> (usize, usize) {
    let mut removed = 0;
    loop {
        let fields = find_fields(doc);
        let Some(region) = fields.iter().find(|r| r.end.is_some()) else {
            return (removed, fields.len());
        };
        let begin_span = doc.paragraph_span(region.begin);
        let end_span = doc.paragraph_span(region.end.unwrap());
        doc.delete_span(Span::new(begin_span.start, end_span.end));
        removed += 1;
    }
}

/// Derive the entries a field with `config` would hold right now.
pub fn entries_for(
    doc: &Document,
    config: &TocFieldConfig,
    page_of: &dyn Fn(&Document, usize) -> usize,
) -> Vec<TocEntry> {
    outline::heading_outline(doc, config.min_level, config.max_level)
        .into_iter()
        .map(|h| TocEntry {
            page: page_of(doc, h.span.start),
            level: h.level,
            text: h.text,
        })
        .collect()
}

fn render_entry(entry: &TocEntry, config: &TocFieldConfig) -> String {
    let indent = "  ".repeat(entry.level.saturating_sub(config.min_level) as usize);
    let base = format!("{indent}- {}", entry.text);
    if !config.show_page_numbers {
        return base;
    }
    if config.right_align_page_numbers {
        let page = entry.page.to_string();
        let used = base.chars().count() + page.chars().count() + 2;
        let dots = ".".repeat(ENTRY_WIDTH.saturating_sub(used).max(2));
        format!("{base} {dots} {page}")
    } else {
        format!("{base} {}", entry.page)
    }
}

fn render_field(config: &TocFieldConfig, entries: &[TocEntry]) -> Result<String, String> {
    config.validate()?;
    let mut text = String::new();
    text.push_str(&config.begin_marker());
    text.push('\n');
    for entry in entries {
        text.push_str(&render_entry(entry, config));
        text.push('\n');
    }
    text.push_str(FIELD_END_MARKER);
    text.push('\n');
    Ok(text)
}

/// Insert a freshly rendered field at a character offset. The field always
/// begins on its own line.
pub fn insert_field(
    doc: &mut Document,
    at: usize,
    config: &TocFieldConfig,
    page_of: &dyn Fn(&Document, usize) -> usize,
) -> Result<(), String> {
    let entries = entries_for(doc, config, page_of);
    let rendered = render_field(config, &entries)?;

    let mut text = String::new();
    if at > 0 && doc.char_at(at - 1) != Some('\n') {
        text.push('\n');
    }
    text.push_str(&rendered);
    doc.insert(at, &text);
    Ok(())
}

/// Re-render the entry lines of the `index`-th field (by current document
/// order) against the live heading outline.
pub fn refresh_field(
    doc: &mut Document,
    index: usize,
    page_of: &dyn Fn(&Document, usize) -> usize,
) -> Result<(), String> {
    let fields = find_fields(doc);
    let region = fields
        .get(index)
        .copied()
        .ok_or_else(|| format!("field {index} no longer exists"))?;
    let end = region
        .end
        .ok_or_else(|| "field has no end marker".to_string())?;

    let config = parse_begin_marker(&doc.paragraph_text(region.begin))?;
    let entries = entries_for(doc, &config, page_of);

    let mut text = String::new();
    for entry in &entries {
        text.push_str(&render_entry(entry, &config));
        text.push('\n');
    }

    let entries_span = Span::new(
        doc.paragraph_span(region.begin).end,
        doc.paragraph_span(end).start,
    );
    doc.delete_span(entries_span);
    doc.insert(entries_span.start, &text);
    Ok(())
}
