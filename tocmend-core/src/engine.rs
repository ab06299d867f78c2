//! Exclusive engine sessions.
//!
//! The document engine is not safe to share across concurrent operations,
//! so every request runs against its own [`Session`]: an isolated scratch
//! directory plus the pagination service the synthesizer invokes. Sessions
//! are created per request and destroyed per request - never pooled.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::Config;
use crate::doc::{Document, Span, PAGE_BREAK};
use crate::error::RepairError;
use crate::pipeline::{self, RepairReport};

/// Supervisor handle for the document engine.
pub struct Engine {
    scratch_root: PathBuf,
}

impl Engine {
    /// Startup reset: clear any session state a previous process left
    /// behind, then prepare the scratch root. Run once per process before
    /// any request is accepted; the pipeline never depends on it re-running.
    pub fn startup(scratch_root: impl Into<PathBuf>) -> Result<Self> {
        let scratch_root = scratch_root.into();
        if scratch_root.exists() {
            let mut stale = 0;
            for entry in fs::read_dir(&scratch_root)
                .with_context(|| format!("failed to scan {}", scratch_root.display()))?
            {
                let path = entry?.path();
                if path.is_dir() {
                    fs::remove_dir_all(&path)
                        .with_context(|| format!("failed to remove {}", path.display()))?;
                } else {
                    fs::remove_file(&path)
                        .with_context(|| format!("failed to remove {}", path.display()))?;
                }
                stale += 1;
            }
            if stale > 0 {
                log::warn!("startup reset cleared {stale} stale session entr(ies) in scratch");
            }
        }
        fs::create_dir_all(&scratch_root)
            .with_context(|| format!("failed to create {}", scratch_root.display()))?;
        Ok(Self { scratch_root })
    }

    /// Create an isolated session for a single request.
    pub fn acquire_session(&self) -> Result<Session> {
        let id = Uuid::new_v4();
        let dir = self.scratch_root.join(format!("session-{}", id.simple()));
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create session dir {}", dir.display()))?;
        log::debug!("acquired engine session {}", id.simple());
        Ok(Session { id, dir })
    }
}

/// The exclusive context one request runs its pipeline in.
///
/// Dropping the session releases it: the scratch directory and everything
/// staged into it goes away.
pub struct Session {
    id: Uuid,
    dir: PathBuf,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.dir
    }

    /// Stage the input container into this session's scratch and open it.
    /// The staged copy keeps concurrent requests off each other's files.
    pub fn open_document(&self, input: &Path) -> Result<Document, RepairError> {
        let staged = self.dir.join("staged-input");
        fs::copy(input, &staged).map_err(|e| {
            RepairError::unreadable(format!("failed to stage {}: {e}", input.display()))
        })?;
        Document::open(&staged)
    }

    /// Page number of a character offset under this engine's layout: one
    /// plus the page breaks before it.
    pub fn page_of(&self, doc: &Document, offset: usize) -> usize {
        doc.span_text(Span::new(0, offset))
            .chars()
            .filter(|&c| c == PAGE_BREAK)
            .count()
            + 1
    }

    /// Run the full repair pipeline inside this session.
    pub fn repair(
        &self,
        input: &Path,
        output: &Path,
        config: &Config,
    ) -> Result<RepairReport, RepairError> {
        pipeline::run(self, input, output, config)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            log::warn!("failed to release session scratch {}: {e}", self.dir.display());
        }
    }
}
