//! Lifecycle markers and dead-shell reclamation.
//!
//! A marker file asserts "this shell identity is currently alive", but its
//! presence is never trusted on its own: abnormal termination leaves stale
//! markers behind, so liveness is always re-verified against the recorded
//! pid. Immediate cleanup on exit and the later sweep are both best-effort;
//! neither mechanism is assumed reliable alone.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::error::StoreError;
use crate::identity::ShellIdentity;
use crate::probe::ProcessProbe;
use crate::record::wall_clock_secs;
use crate::store::store_path;

const MARKER_PREFIX: &str = "active_";

/// Persisted liveness assertion for one shell identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleMarker {
    pub shell_id: String,
    pub start_time: f64,
    pub tty: String,
    pub pid: u32,
}

pub struct LifecycleTracker {
    config: Config,
}

impl LifecycleTracker {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn marker_path(&self, identifier: &str) -> PathBuf {
        self.config
            .lifecycle_dir()
            .join(format!("{}{}", MARKER_PREFIX, identifier))
    }

    /// Write the marker for this shell, overwriting any previous one.
    pub fn mark_active(&self, identity: &ShellIdentity) -> Result<(), StoreError> {
        let dir = self.config.lifecycle_dir();
        fs::create_dir_all(&dir).map_err(|e| StoreError::init(&dir, e))?;

        let marker = LifecycleMarker {
            shell_id: identity.identifier.clone(),
            start_time: wall_clock_secs(),
            tty: identity.tty.clone(),
            pid: identity.pid,
        };
        let json = serde_json::to_string(&marker).map_err(|e| StoreError::Write {
            operation: "serialize_marker".to_string(),
            reason: e.to_string(),
        })?;

        let path = self.marker_path(&identity.identifier);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json).map_err(|e| StoreError::write("write_marker", e))?;
        fs::rename(&temp_path, &path).map_err(|e| StoreError::write("rename_marker", e))
    }

    /// Remove the marker for `identifier`. Already removed is a no-op.
    pub fn mark_inactive(&self, identifier: &str) {
        let path = self.marker_path(identifier);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Failed to remove lifecycle marker");
            }
        }
    }

    /// Reclaim stores whose owning shell no longer exists.
    ///
    /// Removes the marker and deletes the matching session store for every
    /// dead pid; returns the number of stores deleted. Unparseable markers
    /// are dropped without touching any store, since store deletion requires
    /// confidence about ownership. Files vanishing mid-enumeration are
    /// treated as not found.
    pub fn sweep(&self, probe: &dyn ProcessProbe) -> usize {
        let dir = self.config.lifecycle_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut reclaimed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(MARKER_PREFIX) || name.ends_with(".tmp") {
                continue;
            }

            let path = entry.path();
            let marker = match fs::read_to_string(&path) {
                Ok(contents) => match serde_json::from_str::<LifecycleMarker>(&contents) {
                    Ok(marker) => marker,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Removing unparseable lifecycle marker");
                        let _ = fs::remove_file(&path);
                        continue;
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Removing unreadable lifecycle marker");
                    let _ = fs::remove_file(&path);
                    continue;
                }
            };

            if probe.is_alive(marker.pid) {
                continue;
            }

            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove stale marker");
                }
            }

            let store = store_path(&self.config, &marker.shell_id);
            match fs::remove_file(&store) {
                Ok(()) => {
                    reclaimed += 1;
                    info!(shell_id = %marker.shell_id, "Reclaimed dead shell store");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(store = %store.display(), error = %e, "Failed to delete reclaimed store");
                }
            }
        }

        reclaimed
    }
}
