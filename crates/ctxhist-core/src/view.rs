//! Merged, read-only view over every session store.
//!
//! The view is rebuilt from scratch on each query: no caching, no
//! cross-store transaction. Each store is read to completion before
//! merging, so a write landing between two store reads may or may not be
//! observed. Stale reads at that granularity are accepted for human-scale
//! interactive history.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use crate::config::Config;
use crate::record::HistoryRecord;
use crate::store::is_store_file;
use crate::store::read_all_at;
use crate::store::read_store;
use crate::store::store_path;

/// Aggregate statistics over the merged view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub unique_directories: usize,
    pub unique_shells: usize,
    pub unique_ttys: usize,
    /// (oldest, newest) timestamps, absent when there are no records.
    pub time_range: Option<(f64, f64)>,
}

/// Reader over all discoverable session stores. Never writes.
pub struct GlobalView {
    config: Config,
}

impl GlobalView {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn session_files(&self) -> Vec<PathBuf> {
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
        files.sort();
        files
    }

    /// Every record across every store, newest first. A store that fails to
    /// read is skipped with a warning, never fatal to the merge.
    pub fn merge_all(&self) -> Vec<HistoryRecord> {
        let mut all = Vec::new();
        for path in self.session_files() {
            match read_store(&path) {
                Ok(raw) => all.extend(raw.records),
                Err(e) => warn!(error = %e, "Skipping unreadable store in merge"),
            }
        }
        all.sort_by(HistoryRecord::newest_first);
        all
    }

    pub fn by_directory(&self, directory: &str) -> Vec<HistoryRecord> {
        self.merge_all()
            .into_iter()
            .filter(|r| r.directory == directory)
            .collect()
    }

    /// Records for one shell. Reads only the matching store as a shortcut;
    /// results are identical to filtering the full merge.
    pub fn by_shell(&self, shell_id: &str) -> Vec<HistoryRecord> {
        read_all_at(&store_path(&self.config, shell_id))
            .into_iter()
            .filter(|r| r.shell_id == shell_id)
            .collect()
    }

    pub fn by_tty(&self, tty: &str) -> Vec<HistoryRecord> {
        self.merge_all()
            .into_iter()
            .filter(|r| r.tty == tty)
            .collect()
    }

    /// Records with `start <= timestamp <= end`.
    pub fn by_time_range(&self, start: f64, end: f64) -> Vec<HistoryRecord> {
        self.merge_all()
            .into_iter()
            .filter(|r| r.timestamp >= start && r.timestamp <= end)
            .collect()
    }

    pub fn recent(&self, limit: usize) -> Vec<HistoryRecord> {
        let mut all = self.merge_all();
        all.truncate(limit);
        all
    }

    pub fn top_directories(&self, limit: usize) -> Vec<(String, usize)> {
        let all = self.merge_all();
        frequency_top(all.iter().map(|r| r.directory.as_str()), limit)
    }

    pub fn top_commands(&self, limit: usize) -> Vec<(String, usize)> {
        let all = self.merge_all();
        frequency_top(all.iter().map(|r| r.command.as_str()), limit)
    }

    pub fn stats(&self) -> HistoryStats {
        let all = self.merge_all();
        if all.is_empty() {
            return HistoryStats {
                total: 0,
                unique_directories: 0,
                unique_shells: 0,
                unique_ttys: 0,
                time_range: None,
            };
        }

        let directories: HashSet<&str> = all.iter().map(|r| r.directory.as_str()).collect();
        let shells: HashSet<&str> = all.iter().map(|r| r.shell_id.as_str()).collect();
        let ttys: HashSet<&str> = all.iter().map(|r| r.tty.as_str()).collect();
        let mut min_ts = f64::INFINITY;
        let mut max_ts = f64::NEG_INFINITY;
        for record in &all {
            min_ts = min_ts.min(record.timestamp);
            max_ts = max_ts.max(record.timestamp);
        }

        HistoryStats {
            total: all.len(),
            unique_directories: directories.len(),
            unique_shells: shells.len(),
            unique_ttys: ttys.len(),
            time_range: Some((min_ts, max_ts)),
        }
    }
}

/// Frequency count with descending order; the stable sort keeps
/// first-encountered order among equal counts.
fn frequency_top<'a>(values: impl Iterator<Item = &'a str>, limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for value in values {
        let entry = counts.entry(value).or_insert(0);
        if *entry == 0 {
            order.push(value);
        }
        *entry += 1;
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|v| (v.to_string(), counts[v]))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ShellIdentity;
    use crate::store::SessionStore;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        Config::default().with_base_dir(dir.path())
    }

    fn identity(tty: &str, pid: u32) -> ShellIdentity {
        ShellIdentity {
            tty: tty.to_string(),
            pid,
            ppid: 1000,
            identifier: format!("{}_{}", tty, pid),
            parent_identifier: Some(format!("{}_1000", tty)),
        }
    }

    fn append(config: &Config, ident: &ShellIdentity, command: &str, dir: &str, ts: f64) {
        let mut store = SessionStore::open_or_create(config, &ident.identifier).unwrap();
        assert!(store.append(command, dir, ident, ts));
    }

    #[test]
    fn test_merge_all_is_union_of_all_stores() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let a = identity("pts-1", 42);
        let b = identity("pts-2", 43);

        append(&config, &a, "one", "/", 1.0);
        append(&config, &a, "three", "/", 3.0);
        append(&config, &b, "two", "/", 2.0);
        append(&config, &b, "four", "/", 4.0);

        let merged = GlobalView::new(config).merge_all();
        let commands: Vec<&str> = merged.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(commands, vec!["four", "three", "two", "one"]);

        let mut multiset: Vec<&str> = commands.clone();
        multiset.sort_unstable();
        assert_eq!(multiset, vec!["four", "one", "three", "two"]);
    }

    #[test]
    fn test_by_directory_merges_across_stores() {
        // two shells working in the same directory
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let s1 = identity("pts-1", 42);
        let s2 = identity("pts-2", 43);

        append(&config, &s1, "git status", "/home/u/proj", 1.0);
        append(&config, &s1, "ls", "/home/u/proj", 2.0);
        append(&config, &s2, "git commit -m x", "/home/u/proj", 3.0);
        append(&config, &s2, "elsewhere", "/other", 4.0);

        let view = GlobalView::new(config);
        let records = view.by_directory("/home/u/proj");
        let commands: Vec<&str> = records.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(commands, vec!["git commit -m x", "ls", "git status"]);
    }

    #[test]
    fn test_by_shell_matches_filtered_merge() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let a = identity("pts-1", 42);
        let b = identity("pts-2", 43);

        append(&config, &a, "alpha", "/", 1.0);
        append(&config, &b, "beta", "/", 2.0);
        append(&config, &a, "gamma", "/", 3.0);

        let view = GlobalView::new(config);
        let direct = view.by_shell(&a.identifier);
        let filtered: Vec<HistoryRecord> = view
            .merge_all()
            .into_iter()
            .filter(|r| r.shell_id == a.identifier)
            .collect();
        assert_eq!(direct, filtered);
    }

    #[test]
    fn test_by_tty() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let a = identity("pts-1", 42);
        let b = identity("pts-2", 43);

        append(&config, &a, "alpha", "/", 1.0);
        append(&config, &b, "beta", "/", 2.0);

        let view = GlobalView::new(config);
        let records = view.by_tty("pts-2");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].command, "beta");
    }

    #[test]
    fn test_by_time_range_bounds_are_inclusive() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let a = identity("pts-1", 42);

        append(&config, &a, "before", "/", 1.0);
        append(&config, &a, "start", "/", 2.0);
        append(&config, &a, "end", "/", 3.0);
        append(&config, &a, "after", "/", 4.0);

        let view = GlobalView::new(config);
        let records = view.by_time_range(2.0, 3.0);
        let commands: Vec<&str> = records.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(commands, vec!["end", "start"]);
    }

    #[test]
    fn test_recent_truncates() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let a = identity("pts-1", 42);

        for i in 0..5 {
            append(&config, &a, &format!("cmd{}", i), "/", i as f64);
        }

        let view = GlobalView::new(config);
        let records = view.recent(2);
        let commands: Vec<&str> = records.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(commands, vec!["cmd4", "cmd3"]);
    }

    #[test]
    fn test_top_directories_counts_and_tie_break() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let a = identity("pts-1", 42);

        append(&config, &a, "c1", "/busy", 1.0);
        append(&config, &a, "c2", "/busy", 2.0);
        append(&config, &a, "c3", "/newer-once", 4.0);
        append(&config, &a, "c4", "/older-once", 3.0);

        let view = GlobalView::new(config);
        let top = view.top_directories(10);
        assert_eq!(top[0], ("/busy".to_string(), 2));
        // equal counts keep first-encountered (newest-first) order
        assert_eq!(top[1], ("/newer-once".to_string(), 1));
        assert_eq!(top[2], ("/older-once".to_string(), 1));
    }

    #[test]
    fn test_top_commands_limit() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let a = identity("pts-1", 42);

        append(&config, &a, "ls", "/", 1.0);
        append(&config, &a, "ls", "/", 2.0);
        append(&config, &a, "pwd", "/", 3.0);

        let view = GlobalView::new(config);
        let top = view.top_commands(1);
        assert_eq!(top, vec![("ls".to_string(), 2)]);
    }

    #[test]
    fn test_stats_empty() {
        let dir = TempDir::new().unwrap();
        let view = GlobalView::new(test_config(&dir));
        let stats = view.stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.unique_shells, 0);
        assert_eq!(stats.time_range, None);
    }

    #[test]
    fn test_stats_counts_uniques_and_range() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let a = identity("pts-1", 42);
        let b = identity("pts-2", 43);

        append(&config, &a, "ls", "/x", 1.5);
        append(&config, &a, "ls", "/y", 2.5);
        append(&config, &b, "pwd", "/x", 3.5);

        let view = GlobalView::new(config);
        let stats = view.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.unique_directories, 2);
        assert_eq!(stats.unique_shells, 2);
        assert_eq!(stats.unique_ttys, 2);
        assert_eq!(stats.time_range, Some((1.5, 3.5)));
    }

    #[test]
    fn test_unreadable_store_is_skipped() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let a = identity("pts-1", 42);
        append(&config, &a, "survivor", "/", 1.0);

        // invalid UTF-8 makes the whole file unreadable
        let corrupt = config.data_dir().join("session_pts-9_99.jsonl");
        fs::write(&corrupt, [0xff, 0xfe, 0x00, 0x01]).unwrap();

        let merged = GlobalView::new(config).merge_all();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].command, "survivor");
    }

    #[test]
    fn test_missing_data_dir_is_empty_view() {
        let dir = TempDir::new().unwrap();
        let view = GlobalView::new(test_config(&dir));
        assert!(view.merge_all().is_empty());
        assert!(view.by_directory("/nope").is_empty());
    }
}
