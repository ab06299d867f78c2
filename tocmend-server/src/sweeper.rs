//! Background retention sweep for request/response artifacts.
//!
//! Uploaded inputs and transformed outputs live in the downloads directory
//! only long enough for the client to fetch them; everything older than the
//! retention age is deleted on a fixed interval.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Spawn the sweep loop. Runs for the life of the process.
pub fn spawn(dir: PathBuf, max_age: Duration, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = sweep_once(&dir, max_age);
            if removed > 0 {
                log::info!("retention sweep removed {removed} artifact(s)");
            }
        }
    })
}

/// Delete files in `dir` older than `max_age`. Returns how many went.
pub fn sweep_once(dir: &Path, max_age: Duration) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("retention sweep cannot read {}: {e}", dir.display());
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if age.is_some_and(|age| age > max_age) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("retention sweep failed to remove {}: {e}", path.display()),
            }
        }
    }
    removed
}
