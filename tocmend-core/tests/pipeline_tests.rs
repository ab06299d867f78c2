//! End-to-end tests for the repair pipeline.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use tocmend_core::doc::PAGE_BREAK;
use tocmend_core::pipeline::Step;
use tocmend_core::{anchor, cleaner, field};
use tocmend_core::{Config, Document, Engine, RepairError, RepairReport, StepStatus};

struct Fixture {
    root: TempDir,
    engine: Engine,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let engine = Engine::startup(root.path().join("scratch")).unwrap();
        Self { root, engine }
    }

    fn write_input(&self, name: &str, text: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn repair(
        &self,
        input: &PathBuf,
        output_name: &str,
        config: &Config,
    ) -> (Result<RepairReport, RepairError>, PathBuf) {
        let output = self.root.path().join(output_name);
        let session = self.engine.acquire_session().unwrap();
        let result = session.repair(input, &output, config);
        (result, output)
    }

    fn repair_text(&self, text: &str) -> (String, RepairReport) {
        let input = self.write_input("input.md", text);
        let (result, output) = self.repair(&input, "output.md", &Config::default());
        let report = result.unwrap();
        (fs::read_to_string(&output).unwrap(), report)
    }
}

#[test]
fn anchor_precedence_first_substring_match_wins() {
    let doc = Document::from_text("\nContents\n# A\n");
    let anchor = anchor::locate(&doc).unwrap();
    assert_eq!(anchor.paragraph, 1);
}

#[test]
fn no_anchor_cleanup_bound_is_exactly_2000() {
    let text = "lorem ".repeat(400);
    assert!(text.chars().count() >= 2000);
    let doc = Document::from_text(&text);
    assert!(anchor::locate(&doc).is_none());

    let span = cleaner::cleanup_span(&doc, None, 2000);
    assert_eq!(span.end, 2000);
}

#[test]
fn leading_empty_collapse_is_idempotent() {
    let mut doc = Document::from_text("\n \n\nBody\n");
    cleaner::collapse_leading_empty(&mut doc, 50);
    let once = doc.full_text();
    cleaner::collapse_leading_empty(&mut doc, 50);
    assert_eq!(doc.full_text(), once);
}

#[test]
fn pipeline_twice_never_accumulates_fields() {
    let fx = Fixture::new();
    let input = fx.write_input(
        "input.md",
        "intro paragraph\nContents\n# One\nbody\n## Two\nmore body\n",
    );

    let (first, out1) = fx.repair(&input, "pass1.md", &Config::default());
    first.unwrap();
    let (second, out2) = fx.repair(&out1, "pass2.md", &Config::default());
    second.unwrap();

    let final_doc = Document::from_text(&fs::read_to_string(&out2).unwrap());
    assert_eq!(field::find_fields(&final_doc).len(), 1);
}

#[test]
fn entries_match_heading_outline_in_order() {
    let fx = Fixture::new();
    let (output, report) = fx.repair_text("# Intro\n## Background\n# Methods\nbody\n");
    assert_eq!(
        report.status_of(Step::InsertField),
        Some(&StepStatus::Completed)
    );

    let entry_lines: Vec<&str> = output
        .lines()
        .filter(|l| l.trim_start().starts_with("- "))
        .collect();
    assert_eq!(entry_lines.len(), 3);
    assert!(entry_lines[0].starts_with("- Intro "));
    assert!(entry_lines[1].starts_with("  - Background "));
    assert!(entry_lines[2].starts_with("- Methods "));
}

#[test]
fn anchor_at_document_start_gets_no_page_break() {
    let fx = Fixture::new();
    let (output, report) = fx.repair_text("Contents\n# A\nbody\n");

    assert!(!report.page_break_inserted);
    assert_eq!(
        report.status_of(Step::EnforcePageBreak),
        Some(&StepStatus::Skipped)
    );
    assert_eq!(output.matches(PAGE_BREAK).count(), 0);
}

#[test]
fn anchor_mid_document_gets_page_break() {
    let fx = Fixture::new();
    let (output, report) = fx.repair_text("title page\nContents\n# A\nbody\n");

    assert!(report.page_break_inserted);
    assert_eq!(output.matches(PAGE_BREAK).count(), 1);
    // The break sits between the title page and the anchor.
    let break_pos = output.find(PAGE_BREAK).unwrap();
    assert!(break_pos < output.find("Contents").unwrap());
}

#[test]
fn end_to_end_scenario() {
    let fx = Fixture::new();
    let (output, report) = fx.repair_text("\n\nContents\n# Introduction\nBody.\n");

    // Leading empty paragraphs removed; anchor now at the document start.
    assert!(output.starts_with("Contents\n"));
    assert_eq!(report.leading_removed, 2);
    // Anchor at offset 0 after cleanup: no page break.
    assert!(!output.contains(PAGE_BREAK));
    // Field immediately after the anchor paragraph, one level-1 entry.
    assert!(output.starts_with("Contents\n<!-- toc:begin levels=1-3 pages=right -->\n"));
    let entry = output
        .lines()
        .find(|l| l.starts_with("- Introduction"))
        .expect("entry for Introduction");
    assert!(entry.ends_with(" 1"));
    // Body intact after the field.
    assert!(output.ends_with("<!-- toc:end -->\n# Introduction\nBody.\n"));
}

#[test]
fn unreadable_container_is_fatal_and_produces_no_output() {
    let fx = Fixture::new();
    let input = fx.root.path().join("garbage.md");
    fs::write(&input, vec![0xFFu8; 64]).unwrap();

    let (result, output) = fx.repair(&input, "never.md", &Config::default());
    assert!(matches!(
        result,
        Err(RepairError::DocumentUnreadable { .. })
    ));
    assert!(!output.exists());
}

#[test]
fn missing_input_is_fatal() {
    let fx = Fixture::new();
    let input = fx.root.path().join("does-not-exist.md");
    let (result, _) = fx.repair(&input, "never.md", &Config::default());
    assert!(matches!(
        result,
        Err(RepairError::DocumentUnreadable { .. })
    ));
}

#[test]
fn unwritable_output_is_fatal() {
    let fx = Fixture::new();
    let input = fx.write_input("input.md", "Contents\n# A\n");
    let output = fx.root.path().join("no-such-dir").join("out.md");

    let session = fx.engine.acquire_session().unwrap();
    let result = session.repair(&input, &output, &Config::default());
    assert!(matches!(
        result,
        Err(RepairError::DocumentWriteFailed { .. })
    ));
}

#[test]
fn stale_fields_are_stripped_before_synthesis() {
    let fx = Fixture::new();
    let (output, report) = fx.repair_text(
        "<!-- toc:begin levels=1-3 pages=right -->\n\
         - Stale entry ........ 9\n\
         <!-- toc:end -->\n\
         Contents\n\
         # Fresh\n",
    );

    assert_eq!(report.fields_removed, 1);
    assert!(!output.contains("Stale entry"));
    let final_doc = Document::from_text(&output);
    assert_eq!(field::find_fields(&final_doc).len(), 1);
    assert!(output.contains("- Fresh"));
}

#[test]
fn unremovable_field_residue_degrades_but_does_not_abort() {
    let fx = Fixture::new();
    let (output, report) =
        fx.repair_text("<!-- toc:begin -->\nno end marker here\nContents\n# A\n");

    assert_eq!(report.field_residue, 1);
    assert!(matches!(
        report.status_of(Step::StripFields),
        Some(StepStatus::Degraded(_))
    ));
    // The request still produced a document with the new field in it.
    assert!(output.contains("<!-- toc:end -->"));
}

#[test]
fn invalid_preferred_config_falls_back_to_default_field() {
    let fx = Fixture::new();
    let input = fx.write_input("input.md", "Contents\n# A\n");

    let mut config = Config::default();
    config.toc.min_level = 0;

    let (result, output) = fx.repair(&input, "out.md", &config);
    let report = result.unwrap();

    assert!(matches!(
        report.status_of(Step::InsertField),
        Some(StepStatus::Degraded(_))
    ));
    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("levels=1-9"));
}

#[test]
fn artifacts_before_anchor_are_removed() {
    let fx = Fixture::new();
    let (output, report) = fx.repair_text(
        "\u{FEFF}front matter\u{200B}\n\u{000C}\nContents\n# A\nbody \u{200B}after\n",
    );

    assert_eq!(report.artifacts_removed, 3);
    // Invisible characters after the anchor are out of scope.
    assert!(output.contains("body \u{200B}after"));
    assert!(!output.starts_with('\u{FEFF}'));
}

#[test]
fn page_numbers_follow_page_breaks() {
    let fx = Fixture::new();
    let (output, _) = fx.repair_text("Contents\n# A\nbody\n\u{000C}\n# B\nmore\n");

    let line_a = output.lines().find(|l| l.starts_with("- A ")).unwrap();
    let line_b = output.lines().find(|l| l.starts_with("- B ")).unwrap();
    assert!(line_a.ends_with(" 1"));
    assert!(line_b.ends_with(" 2"));
}
