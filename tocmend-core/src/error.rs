//! Fatal pipeline errors.
//!
//! Only two things abort a repair: a document that cannot be opened and a
//! document that cannot be saved. Everything between those is best-effort
//! and reported through [`crate::pipeline::StepOutcome`] instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepairError {
    /// The input container could not be opened, or opened but its content
    /// could not be read back even after repair.
    #[error("document unreadable: {cause}")]
    DocumentUnreadable { cause: String },

    /// The transformed document could not be serialized to the output path.
    #[error("document write failed: {cause}")]
    DocumentWriteFailed { cause: String },
}

impl RepairError {
    pub fn unreadable(cause: impl Into<String>) -> Self {
        Self::DocumentUnreadable {
            cause: cause.into(),
        }
    }

    pub fn write_failed(cause: impl Into<String>) -> Self {
        Self::DocumentWriteFailed {
            cause: cause.into(),
        }
    }
}
