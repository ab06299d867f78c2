//! Document model with Rope-based text storage.
//!
//! A document is an ordered sequence of paragraphs over a mutable character
//! buffer. One rope line is one paragraph; the terminating newline belongs
//! to its paragraph, the way a word processor's paragraph mark does. All
//! offsets are character offsets into the rope, and any [`Span`] becomes
//! stale the moment the document is mutated - callers re-derive spans from
//! the live document instead of caching them across edits.

use ropey::Rope;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::RepairError;
use crate::outline;

/// Manual page break character (plain-text form feed).
pub const PAGE_BREAK: char = '\u{000C}';
/// Section break character.
pub const SECTION_BREAK: char = '\u{001C}';
/// Invisible characters the cleaner removes: zero-width space and BOM.
pub const INVISIBLE_CHARS: [char; 2] = ['\u{200B}', '\u{FEFF}'];

/// Lossy-decode repair gives up once more than this share of the decoded
/// characters are U+FFFD replacements.
const MAX_REPLACEMENT_RATIO: f64 = 0.10;

/// A half-open span `[start, end)` of character offsets.
///
/// Copying a span is the "duplicate" operation: the copy is decoupled from
/// any further mutation of the document it was derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Collapse to a zero-length span at the start offset.
    pub fn collapse_to_start(self) -> Self {
        Self::new(self.start, self.start)
    }

    /// Collapse to a zero-length span at the end offset.
    pub fn collapse_to_end(self) -> Self {
        Self::new(self.end, self.end)
    }

    fn clamp(self, max: usize) -> Self {
        Self::new(self.start.min(max), self.end.min(max))
    }
}

/// Derived paragraph style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParagraphStyle {
    /// Heading level 1..=6.
    Heading(u8),
    Normal,
}

impl ParagraphStyle {
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            ParagraphStyle::Heading(level) => Some(*level),
            ParagraphStyle::Normal => None,
        }
    }
}

/// The main document structure.
#[derive(Clone, Debug)]
pub struct Document {
    rope: Rope,
}

impl Document {
    /// Build a document from already-decoded text. Line endings are taken
    /// as-is; use [`Document::from_bytes`] for container input.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Open a container from raw bytes, repairing what can be repaired.
    ///
    /// Repair covers lossy UTF-8 decoding and CRLF/CR normalization. A
    /// container with NUL bytes, or one that loses more than a fraction of
    /// its characters to replacement marks, is beyond repair.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RepairError> {
        let text = decode_repair(bytes)?;
        let text = normalize_newlines(&text);
        Ok(Self::from_text(&text))
    }

    /// Open a container from a file path and verify its content is
    /// actually accessible before handing it to the pipeline.
    pub fn open(path: &Path) -> Result<Self, RepairError> {
        let bytes = fs::read(path).map_err(|e| {
            RepairError::unreadable(format!("failed to read {}: {e}", path.display()))
        })?;
        let doc = Self::from_bytes(&bytes)?;
        doc.verify_readable()?;
        Ok(doc)
    }

    /// Force a full read of the document content.
    ///
    /// A container that opens but cannot be walked back out paragraph by
    /// paragraph counts as unreadable, same as one that fails to open.
    pub fn verify_readable(&self) -> Result<(), RepairError> {
        let mut covered = 0;
        let mut text = String::with_capacity(self.rope.len_bytes());
        for idx in 0..self.paragraph_count() {
            let span = self.paragraph_span(idx);
            covered += span.len();
            text.push_str(&self.span_text(span));
        }
        if covered != self.len_chars() || text.chars().count() != self.len_chars() {
            return Err(RepairError::unreadable(format!(
                "paragraph scan covered {covered} of {} chars",
                self.len_chars()
            )));
        }
        Ok(())
    }

    /// Serialize to `path` via a temp file in the same directory, so a
    /// failed save never leaves a partial file at the output location.
    pub fn save(&self, path: &Path) -> Result<(), RepairError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_err = |e: &dyn std::fmt::Display| {
            RepairError::write_failed(format!("failed to write {}: {e}", path.display()))
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_err(&e))?;
        self.rope
            .write_to(tmp.as_file_mut())
            .map_err(|e| write_err(&e))?;
        tmp.as_file_mut().flush().map_err(|e| write_err(&e))?;
        tmp.persist(path).map_err(|e| write_err(&e))?;
        Ok(())
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Number of paragraphs. Never zero: an empty buffer is one empty
    /// paragraph, like a word processor's mandatory final paragraph mark.
    pub fn paragraph_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Character span of paragraph `idx`, including its trailing newline.
    pub fn paragraph_span(&self, idx: usize) -> Span {
        let start = self.rope.line_to_char(idx);
        let end = if idx + 1 < self.rope.len_lines() {
            self.rope.line_to_char(idx + 1)
        } else {
            self.rope.len_chars()
        };
        Span::new(start, end)
    }

    /// Raw paragraph text, trailing newline included.
    pub fn paragraph_text(&self, idx: usize) -> String {
        self.rope.line(idx).to_string()
    }

    /// Derived style of paragraph `idx`.
    pub fn style_of(&self, idx: usize) -> ParagraphStyle {
        let line = self.paragraph_text(idx);
        let trimmed = line.trim_end();
        if let Some(level) = outline::parse_atx_heading(trimmed) {
            return ParagraphStyle::Heading(level as u8);
        }
        if !trimmed.trim().is_empty() && idx + 1 < self.paragraph_count() {
            let next = self.paragraph_text(idx + 1);
            if let Some(level) = outline::parse_setext_underline(next.trim()) {
                return ParagraphStyle::Heading(level);
            }
        }
        ParagraphStyle::Normal
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        if offset < self.rope.len_chars() {
            Some(self.rope.char(offset))
        } else {
            None
        }
    }

    pub fn span_text(&self, span: Span) -> String {
        let span = span.clamp(self.len_chars());
        if span.is_empty() {
            return String::new();
        }
        self.rope.slice(span.start..span.end).to_string()
    }

    pub fn full_text(&self) -> String {
        self.rope.to_string()
    }

    /// Delete the characters covered by `span`.
    pub fn delete_span(&mut self, span: Span) {
        let span = span.clamp(self.len_chars());
        if !span.is_empty() {
            self.rope.remove(span.start..span.end);
        }
    }

    /// Insert text at a character offset.
    pub fn insert(&mut self, offset: usize, text: &str) {
        let offset = offset.min(self.len_chars());
        self.rope.insert(offset, text);
    }

    /// Replace every non-overlapping occurrence of `needle` inside `span`
    /// with `replacement`. Returns the number of replacements made.
    pub fn replace_all_in(&mut self, span: Span, needle: &str, replacement: &str) -> usize {
        let span = span.clamp(self.len_chars());
        if needle.is_empty() || span.is_empty() {
            return 0;
        }

        let text = self.span_text(span);
        let needle_chars = needle.chars().count();

        // Character offsets of matches, relative to the span start.
        let mut matches = Vec::new();
        let mut byte_pos = 0;
        let mut char_pos = 0;
        while let Some(found) = text[byte_pos..].find(needle) {
            let abs_byte = byte_pos + found;
            char_pos += text[byte_pos..abs_byte].chars().count();
            matches.push(char_pos);
            byte_pos = abs_byte + needle.len();
            char_pos += needle_chars;
        }

        // Apply back to front so earlier offsets stay valid.
        for &pos in matches.iter().rev() {
            let start = span.start + pos;
            self.rope.remove(start..start + needle_chars);
            if !replacement.is_empty() {
                self.rope.insert(start, replacement);
            }
        }
        matches.len()
    }
}

fn decode_repair(bytes: &[u8]) -> Result<String, RepairError> {
    if bytes.contains(&0) {
        return Err(RepairError::unreadable(
            "container holds NUL bytes; not a text document",
        ));
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => {
            let repaired = String::from_utf8_lossy(bytes);
            let total = repaired.chars().count().max(1);
            let lost = repaired.chars().filter(|&c| c == '\u{FFFD}').count();
            if lost as f64 / total as f64 > MAX_REPLACEMENT_RATIO {
                return Err(RepairError::unreadable(format!(
                    "invalid UTF-8 beyond repair ({lost} of {total} chars lost)"
                )));
            }
            log::warn!("repaired invalid UTF-8 in container ({lost} chars replaced)");
            Ok(repaired.into_owned())
        }
    }
}

fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}
