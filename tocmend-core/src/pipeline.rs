//! The repair pipeline.
//!
//! One strictly sequential pass per request: load, strip stale fields,
//! locate the anchor, clean artifacts, enforce the page break, synthesize
//! the TOC, save. Only the load and the save can abort the request; every
//! step in between is best-effort, and its outcome - completed, skipped, or
//! degraded - is recorded in the [`RepairReport`] instead of being silently
//! swallowed.

use std::fmt;
use std::path::Path;

use crate::anchor;
use crate::breaks;
use crate::cleaner;
use crate::config::Config;
use crate::doc::Document;
use crate::engine::Session;
use crate::error::RepairError;
use crate::field::{self, TocFieldConfig};

/// The cosmetic steps between load and save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    StripFields,
    LocateAnchor,
    CleanArtifacts,
    CollapseLeading,
    EnforcePageBreak,
    InsertField,
    RefreshFields,
    FinalCollapse,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::StripFields => "strip-fields",
            Step::LocateAnchor => "locate-anchor",
            Step::CleanArtifacts => "clean-artifacts",
            Step::CollapseLeading => "collapse-leading",
            Step::EnforcePageBreak => "enforce-page-break",
            Step::InsertField => "insert-field",
            Step::RefreshFields => "refresh-fields",
            Step::FinalCollapse => "final-collapse",
        }
    }
}

/// How a best-effort step ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    /// The step had nothing to do (no anchor, anchor already at start, ...).
    Skipped,
    /// The step failed or partially failed; output quality degrades but the
    /// request continues.
    Degraded(String),
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Completed => f.write_str("ok"),
            StepStatus::Skipped => f.write_str("skipped"),
            StepStatus::Degraded(reason) => write!(f, "degraded: {reason}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StepStatus,
}

/// Per-request ledger of what the pipeline did.
#[derive(Clone, Debug, Default)]
pub struct RepairReport {
    pub outcomes: Vec<StepOutcome>,
    pub anchor_paragraph: Option<usize>,
    pub fields_removed: usize,
    pub field_residue: usize,
    pub artifacts_removed: usize,
    pub leading_removed: usize,
    pub page_break_inserted: bool,
}

impl RepairReport {
    fn push(&mut self, step: Step, status: StepStatus) {
        if let StepStatus::Degraded(reason) = &status {
            log::warn!("{} degraded: {reason}", step.name());
        }
        self.outcomes.push(StepOutcome { step, status });
    }

    pub fn status_of(&self, step: Step) -> Option<&StepStatus> {
        self.outcomes
            .iter()
            .find(|o| o.step == step)
            .map(|o| &o.status)
    }

    /// Steps that failed or partially failed.
    pub fn degraded(&self) -> Vec<&StepOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, StepStatus::Degraded(_)))
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.degraded().is_empty()
    }

    pub fn summary(&self) -> String {
        self.outcomes
            .iter()
            .map(|o| format!("{:<20} {}", o.step.name(), o.status))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Run the full pipeline: `input` container in, repaired container at
/// `output`. Fatal only on an unreadable input or a failed save.
pub fn run(
    session: &Session,
    input: &Path,
    output: &Path,
    config: &Config,
) -> Result<RepairReport, RepairError> {
    let mut doc = session.open_document(input)?;
    let mut report = RepairReport::default();

    // Strip stale fields first so the output never accumulates duplicates.
    let (removed, residue) = field::strip_fields(&mut doc);
    report.fields_removed = removed;
    report.field_residue = residue;
    let strip_status = if residue > 0 {
        StepStatus::Degraded(format!("{residue} unremovable field(s) left in place"))
    } else {
        StepStatus::Completed
    };
    report.push(Step::StripFields, strip_status);

    let located = anchor::locate(&doc);
    report.anchor_paragraph = located.map(|a| a.paragraph);
    let locate_status = if located.is_some() {
        StepStatus::Completed
    } else {
        StepStatus::Skipped
    };
    report.push(Step::LocateAnchor, locate_status);

    report.artifacts_removed =
        cleaner::remove_artifacts(&mut doc, config.cleanup.no_anchor_scan_chars);
    report.push(Step::CleanArtifacts, StepStatus::Completed);

    report.leading_removed =
        cleaner::collapse_leading_empty(&mut doc, config.cleanup.pre_anchor_collapse_limit);
    report.push(Step::CollapseLeading, StepStatus::Completed);

    report.page_break_inserted = breaks::enforce_page_break(&mut doc);
    let break_status = if report.page_break_inserted {
        StepStatus::Completed
    } else {
        StepStatus::Skipped
    };
    report.push(Step::EnforcePageBreak, break_status);

    synthesize(session, &mut doc, config, &mut report);

    cleaner::collapse_leading_empty(&mut doc, config.cleanup.post_insert_collapse_limit);
    report.push(Step::FinalCollapse, StepStatus::Completed);

    doc.save(output)?;
    Ok(report)
}

/// Insert the new field and refresh every field against the live outline.
fn synthesize(session: &Session, doc: &mut Document, config: &Config, report: &mut RepairReport) {
    let page_of = |d: &Document, offset: usize| session.page_of(d, offset);

    // Insertion point: end of the re-resolved anchor paragraph, else the
    // document start.
    let insert_at = anchor::locate(doc).map(|a| a.span.end).unwrap_or(0);

    let insert_status = match field::insert_field(doc, insert_at, &config.toc, &page_of) {
        Ok(()) => StepStatus::Completed,
        Err(styled_err) => {
            // Never fail the request just because the styled insert was
            // rejected; retry with the engine default at the same point.
            match field::insert_field(doc, insert_at, &TocFieldConfig::default(), &page_of) {
                Ok(()) => StepStatus::Degraded(format!(
                    "styled insertion failed ({styled_err}); inserted default field"
                )),
                Err(fallback_err) => {
                    StepStatus::Degraded(format!("field insertion failed: {fallback_err}"))
                }
            }
        }
    };
    report.push(Step::InsertField, insert_status);

    // Expected: exactly one field. Refresh whatever is actually there; the
    // stripper may have documented residue.
    let field_count = field::find_fields(doc).len();
    let mut failures = Vec::new();
    for idx in 0..field_count {
        if let Err(e) = field::refresh_field(doc, idx, &page_of) {
            failures.push(format!("field {idx}: {e}"));
        }
    }
    let refresh_status = if failures.is_empty() {
        StepStatus::Completed
    } else {
        StepStatus::Degraded(failures.join("; "))
    };
    report.push(Step::RefreshFields, refresh_status);
}
