//! tocmend core - document model and the TOC repair pipeline
//!
//! This crate contains the repair logic for tocmend, independent of any
//! transport concerns:
//! - Document model with Rope-based text storage
//! - TOC field scanning, stripping, synthesis and refresh
//! - Anchor location and pre-anchor artifact cleanup
//! - Page-break enforcement
//! - Exclusive engine sessions for isolated per-request processing
//! - Configuration management

pub mod anchor;
pub mod breaks;
pub mod cleaner;
pub mod config;
pub mod doc;
pub mod engine;
pub mod error;
pub mod field;
pub mod outline;
pub mod pipeline;

// Re-export commonly used types
pub use config::Config;
pub use doc::{Document, Span};
pub use engine::{Engine, Session};
pub use error::RepairError;
pub use field::TocFieldConfig;
pub use pipeline::{RepairReport, Step, StepOutcome, StepStatus};
