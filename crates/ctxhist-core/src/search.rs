//! Exact and fuzzy matching over a merged record set.
//!
//! Scoring: literal case-insensitive containment is a 1.0 and skips the
//! metric entirely; everything else gets a normalized Levenshtein ratio in
//! [0, 1]. Results are ranked by score, newest first within a score, with
//! one entry per distinct command text.

use std::collections::HashSet;

use crate::record::HistoryRecord;

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.6;
pub const DEFAULT_FUZZY_LIMIT: usize = 20;

/// Case-insensitive substring filter on `command`. Preserves input order.
pub fn exact(records: &[HistoryRecord], query: &str) -> Vec<HistoryRecord> {
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|r| r.command.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Rank records by similarity to `query`.
///
/// Records scoring below `threshold` are dropped. Ordering is score
/// descending, then timestamp descending; only the highest-ranked
/// occurrence of each distinct command text is kept, capped at `limit`.
pub fn fuzzy(
    records: &[HistoryRecord],
    query: &str,
    threshold: f64,
    limit: usize,
) -> Vec<(HistoryRecord, f64)> {
    let needle = query.to_lowercase();

    let mut scored: Vec<(HistoryRecord, f64)> = records
        .iter()
        .filter_map(|r| {
            let score = score(&needle, &r.command.to_lowercase());
            if score >= threshold {
                Some((r.clone(), score))
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.total_cmp(&a.1)
            .then(b.0.timestamp.total_cmp(&a.0.timestamp))
            .then(b.0.seq.cmp(&a.0.seq))
    });

    let mut seen: HashSet<String> = HashSet::new();
    let mut ranked = Vec::new();
    for (record, score) in scored {
        if !seen.insert(record.command.clone()) {
            continue;
        }
        ranked.push((record, score));
        if ranked.len() == limit {
            break;
        }
    }

    ranked
}

fn score(needle: &str, haystack: &str) -> f64 {
    if haystack.contains(needle) {
        return 1.0;
    }
    similarity(needle, haystack)
}

/// Normalized Levenshtein ratio: 1 - distance / max_len.
fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// Two-row Levenshtein edit distance over chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev_row: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr_row: Vec<usize> = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(command: &str, timestamp: f64, seq: u64) -> HistoryRecord {
        HistoryRecord {
            command: command.to_string(),
            directory: "/".to_string(),
            shell_id: "pts-0_1".to_string(),
            tty: "pts-0".to_string(),
            pid: 1,
            ppid: Some(1),
            timestamp,
            seq,
        }
    }

    #[test]
    fn test_levenshtein_distances() {
        assert_eq!(levenshtein("hello", "hello"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("cats", "cat"), 1);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("saturday", "sunday"), 3);
    }

    #[test]
    fn test_exact_is_case_insensitive() {
        let records = vec![
            record("GIT status", 1.0, 0),
            record("ls -la", 2.0, 1),
            record("git push", 3.0, 2),
        ];
        let hits = exact(&records, "git");
        let commands: Vec<&str> = hits.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(commands, vec!["GIT status", "git push"]);
    }

    #[test]
    fn test_substring_scores_exactly_one() {
        let records = vec![record("git status", 5.0, 0), record("got", 9.0, 1)];
        let hits = fuzzy(&records, "git", 0.6, 20);

        // containment outranks similarity even when the similar record is newer
        assert_eq!(hits[0].0.command, "git status");
        assert_eq!(hits[0].1, 1.0);
        assert_eq!(hits[1].0.command, "got");
        assert!(hits[1].1 < 1.0);
    }

    #[test]
    fn test_threshold_excludes_low_scores() {
        let records = vec![record("git", 1.0, 0), record("make install", 2.0, 1)];
        let hits = fuzzy(&records, "git", 0.6, 20);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.command, "git");
    }

    #[test]
    fn test_dedup_keeps_highest_ranked_occurrence() {
        let records = vec![
            record("git status", 1.0, 0),
            record("git status", 9.0, 1),
            record("git push", 5.0, 2),
        ];
        let hits = fuzzy(&records, "git", 0.6, 20);

        let statuses: Vec<&(HistoryRecord, f64)> = hits
            .iter()
            .filter(|(r, _)| r.command == "git status")
            .collect();
        assert_eq!(statuses.len(), 1);
        // the retained duplicate is the newer one
        assert_eq!(statuses[0].0.timestamp, 9.0);
    }

    #[test]
    fn test_limit_caps_results() {
        let records: Vec<HistoryRecord> = (0..30)
            .map(|i| record(&format!("git cmd {}", i), i as f64, i))
            .collect();
        let hits = fuzzy(&records, "git", 0.6, 20);
        assert_eq!(hits.len(), 20);
    }

    #[test]
    fn test_ranking_is_score_then_recency() {
        let records = vec![
            record("git log", 1.0, 0),
            record("git diff", 2.0, 1),
            record("gut", 3.0, 2),
        ];
        let hits = fuzzy(&records, "git", 0.6, 20);
        let commands: Vec<&str> = hits.iter().map(|(r, _)| r.command.as_str()).collect();
        // both containment hits first (newest leading), then the near-miss
        assert_eq!(commands, vec!["git diff", "git log", "gut"]);
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        let mid = similarity("git", "gut");
        assert!(mid > 0.0 && mid < 1.0);
    }
}
