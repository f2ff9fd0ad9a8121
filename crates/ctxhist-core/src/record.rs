use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

/// One recorded shell command.
///
/// Immutable once written; deletion happens only at whole-store granularity.
/// `seq` is the store-local row id assigned on append, so the ordering key
/// `(timestamp, seq)` is total within a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub command: String,
    pub directory: String,
    pub shell_id: String,
    pub tty: String,
    pub pid: u32,
    pub ppid: Option<u32>,
    pub timestamp: f64,
    pub seq: u64,
}

impl HistoryRecord {
    /// Newest-first comparison key: timestamp descending, then insertion
    /// order descending.
    pub(crate) fn newest_first(a: &HistoryRecord, b: &HistoryRecord) -> std::cmp::Ordering {
        b.timestamp
            .total_cmp(&a.timestamp)
            .then(b.seq.cmp(&a.seq))
    }
}

/// Wall-clock time in seconds since the Unix epoch.
pub fn wall_clock_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
