//! Store reclamation: dead owners and aged-out data.

use std::fs;
use std::path::PathBuf;

use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::lifecycle::LifecycleTracker;
use crate::probe::ProcessProbe;
use crate::record::wall_clock_secs;
use crate::store::is_store_file;
use crate::store::read_store;

const SECS_PER_DAY: f64 = 86_400.0;

pub struct RetentionManager {
    config: Config,
}

impl RetentionManager {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Delete stores whose owning shell has died. Returns the number of
    /// stores deleted.
    pub fn reclaim_dead(&self, probe: &dyn ProcessProbe) -> usize {
        LifecycleTracker::new(self.config.clone()).sweep(probe)
    }

    /// Delete stores whose newest record is older than `days` days.
    ///
    /// A store that cannot be read, or whose lines all fail to parse, is
    /// deleted unconditionally and counted: corruption warrants removal as
    /// much as staleness does. A store with no lines at all is a healthy
    /// empty log and survives.
    pub fn evict_older_than(&self, days: u64) -> usize {
        let cutoff = wall_clock_secs() - days as f64 * SECS_PER_DAY;
        let mut removed = 0;

        for path in self.store_files() {
            match read_store(&path) {
                Err(e) => {
                    warn!(error = %e, "Evicting unreadable store");
                    if remove_store(&path) {
                        removed += 1;
                    }
                }
                Ok(raw) if raw.records.is_empty() => {
                    if raw.malformed_lines > 0 {
                        warn!(path = %path.display(), "Evicting store with no parseable records");
                        if remove_store(&path) {
                            removed += 1;
                        }
                    }
                }
                Ok(raw) => {
                    let newest = raw
                        .records
                        .iter()
                        .map(|r| r.timestamp)
                        .fold(f64::NEG_INFINITY, f64::max);
                    if newest < cutoff {
                        info!(path = %path.display(), "Evicting aged-out store");
                        if remove_store(&path) {
                            removed += 1;
                        }
                    }
                }
            }
        }

        removed
    }

    fn store_files(&self) -> Vec<PathBuf> {
        let dir = self.config.data_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut files = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if is_store_file(name) {
                files.push(entry.path());
            }
        }
        files
    }
}

fn remove_store(path: &std::path::Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to delete store");
            false
        }
    }
}
