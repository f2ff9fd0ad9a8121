//! Per-shell append-only session stores.
//!
//! Each shell identity owns one JSONL file under the data directory; the
//! file name is a pure function of the identifier so any process can derive
//! it. Stores never coordinate with each other: a writer only ever touches
//! its own file, and readers tolerate whatever state they find.

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::warn;

use crate::config::Config;
use crate::error::StoreError;
use crate::identity::ShellIdentity;
use crate::record::HistoryRecord;

const STORE_PREFIX: &str = "session_";
const STORE_SUFFIX: &str = ".jsonl";

/// Path of the session store owned by `identifier`.
pub fn store_path(config: &Config, identifier: &str) -> PathBuf {
    config
        .data_dir()
        .join(format!("{}{}{}", STORE_PREFIX, identifier, STORE_SUFFIX))
}

pub(crate) fn is_store_file(name: &str) -> bool {
    name.starts_with(STORE_PREFIX) && name.ends_with(STORE_SUFFIX)
}

/// Raw contents of a store file, before ordering.
pub(crate) struct RawStore {
    pub records: Vec<HistoryRecord>,
    /// Lines present in the file that did not parse as records.
    pub malformed_lines: usize,
}

/// Read every parseable record from a store file.
///
/// A missing file is an empty store, not an error. Individual lines that
/// fail to parse are counted and skipped; an I/O failure mid-read makes the
/// whole store unreadable.
pub(crate) fn read_store(path: &Path) -> Result<RawStore, StoreError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(RawStore {
                records: Vec::new(),
                malformed_lines: 0,
            });
        }
        Err(e) => return Err(StoreError::read(path, e)),
    };

    let reader = BufReader::new(file);
    let mut records = Vec::new();
    let mut malformed_lines = 0;
    for line in reader.lines() {
        let line = line.map_err(|e| StoreError::read(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HistoryRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                malformed_lines += 1;
                warn!(path = %path.display(), error = %e, "Skipping malformed history line");
            }
        }
    }

    Ok(RawStore {
        records,
        malformed_lines,
    })
}

/// Read a store newest-first, degrading to empty on any read failure.
pub(crate) fn read_all_at(path: &Path) -> Vec<HistoryRecord> {
    match read_store(path) {
        Ok(mut raw) => {
            raw.records.sort_by(HistoryRecord::newest_first);
            raw.records
        }
        Err(e) => {
            warn!(error = %e, "Unreadable session store");
            Vec::new()
        }
    }
}

/// One shell's private command log. Single active writer per identifier in
/// normal operation; the file may outlive its writer and is reclaimed later.
pub struct SessionStore {
    identifier: String,
    path: PathBuf,
    next_seq: u64,
}

impl SessionStore {
    /// Open the store owned by `identifier`, creating the data directory if
    /// needed. The backing file itself is created lazily on first append.
    pub fn open_or_create(config: &Config, identifier: &str) -> Result<Self, StoreError> {
        let data_dir = config.data_dir();
        fs::create_dir_all(&data_dir).map_err(|e| StoreError::init(&data_dir, e))?;

        let path = store_path(config, identifier);
        let next_seq = match read_store(&path) {
            Ok(raw) => raw.records.iter().map(|r| r.seq + 1).max().unwrap_or(0),
            Err(e) => {
                warn!(error = %e, "Existing store unreadable, restarting sequence");
                0
            }
        };

        Ok(Self {
            identifier: identifier.to_string(),
            path,
            next_seq,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one record, stamping it with this store's identifier
    /// and the next row id. Returns false (and logs) on any storage error;
    /// never blocks on other stores and never retries.
    pub fn append(
        &mut self,
        command: &str,
        directory: &str,
        identity: &ShellIdentity,
        timestamp: f64,
    ) -> bool {
        let record = HistoryRecord {
            command: command.to_string(),
            directory: directory.to_string(),
            shell_id: self.identifier.clone(),
            tty: identity.tty.clone(),
            pid: identity.pid,
            ppid: Some(identity.ppid),
            timestamp,
            seq: self.next_seq,
        };

        match self.write_line(&record) {
            Ok(()) => {
                self.next_seq += 1;
                debug!(store = %self.identifier, seq = record.seq, "Appended history record");
                true
            }
            Err(e) => {
                warn!(store = %self.identifier, error = %e, "Failed to append history record");
                false
            }
        }
    }

    /// All records in this store, newest first. Empty on any read failure.
    pub fn read_all(&self) -> Vec<HistoryRecord> {
        read_all_at(&self.path)
    }

    fn write_line(&self, record: &HistoryRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record).map_err(|e| StoreError::Write {
            operation: "serialize".to_string(),
            reason: e.to_string(),
        })?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::write("open", e))?;

        lock_exclusive(&file)?;
        file.write_all(line.as_bytes())
            .map_err(|e| StoreError::write("write", e))?;
        file.flush().map_err(|e| StoreError::write("flush", e))
        // flock released when the handle drops
    }
}

/// Single non-blocking lock attempt. One writer owns a store in normal
/// operation, so contention here drops the entry rather than queueing.
fn lock_exclusive(file: &File) -> Result<(), StoreError> {
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        Ok(())
    } else {
        Err(StoreError::write("flock", std::io::Error::last_os_error()))
    }
}
