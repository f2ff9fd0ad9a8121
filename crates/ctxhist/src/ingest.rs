//! History-file ingestion.
//!
//! Turns a raw shell-history file into the (command, directory) pair stream
//! the storage layer consumes, inferring directory transitions from `cd` and
//! `pushd` commands. Best-effort by design: a target that cannot be resolved
//! leaves the tracked directory unchanged, and nothing is ever fabricated.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

/// Read raw command lines from a history file, skipping blank lines.
pub fn parse_history_file(path: &Path) -> io::Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Pair each command with the directory in effect when it ran.
///
/// A `cd`/`pushd` is attributed to its target directory. Directory state
/// starts at `start_dir` and only changes when a target actually resolves.
pub fn track_directories(commands: &[String], start_dir: &Path) -> Vec<(String, String)> {
    let mut current = start_dir.to_path_buf();
    let mut pairs = Vec::with_capacity(commands.len());

    for command in commands {
        let target = command
            .strip_prefix("cd ")
            .or_else(|| command.strip_prefix("pushd "));
        if let Some(resolved) = target.and_then(|t| resolve_target(t.trim(), &current)) {
            current = resolved;
        }
        pairs.push((command.clone(), current.to_string_lossy().into_owned()));
    }

    pairs
}

/// Resolve a cd target against the tracked directory: `~` expansion,
/// relative joining, then canonicalization. `None` when the target does not
/// exist or cannot be expanded.
fn resolve_target(target: &str, current: &Path) -> Option<PathBuf> {
    if target.is_empty() {
        return None;
    }

    let candidate = if target == "~" {
        home_dir()?
    } else if let Some(rest) = target.strip_prefix("~/") {
        home_dir()?.join(rest)
    } else {
        let path = Path::new(target);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            current.join(path)
        }
    };

    fs::canonicalize(candidate).ok()
}

pub fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn strings(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_history_file_skips_blanks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");
        fs::write(&path, "ls\n\n  \ngit status\n").unwrap();

        let commands = parse_history_file(&path).unwrap();
        assert_eq!(commands, vec!["ls".to_string(), "git status".to_string()]);
    }

    #[test]
    fn test_parse_history_file_missing() {
        let dir = TempDir::new().unwrap();
        let err = parse_history_file(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_cd_absolute_changes_directory() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let canonical_sub = fs::canonicalize(&sub).unwrap();

        let commands = strings(&[&format!("cd {}", sub.display()), "ls"]);
        let pairs = track_directories(&commands, Path::new("/"));

        // the cd itself is attributed to its target
        assert_eq!(pairs[0].1, canonical_sub.to_string_lossy());
        assert_eq!(pairs[1].0, "ls");
        assert_eq!(pairs[1].1, canonical_sub.to_string_lossy());
    }

    #[test]
    fn test_cd_relative_resolves_against_current() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("proj");
        fs::create_dir(&sub).unwrap();
        let canonical_sub = fs::canonicalize(&sub).unwrap();

        let commands = strings(&["cd proj", "make"]);
        let pairs = track_directories(&commands, dir.path());
        assert_eq!(pairs[1].1, canonical_sub.to_string_lossy());
    }

    #[test]
    fn test_cd_nonexistent_keeps_directory() {
        let dir = TempDir::new().unwrap();
        let commands = strings(&["cd does-not-exist", "ls"]);
        let pairs = track_directories(&commands, dir.path());
        assert_eq!(pairs[0].1, dir.path().to_string_lossy());
        assert_eq!(pairs[1].1, dir.path().to_string_lossy());
    }

    #[test]
    fn test_pushd_changes_directory() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("stack");
        fs::create_dir(&sub).unwrap();
        let canonical_sub = fs::canonicalize(&sub).unwrap();

        let commands = strings(&["pushd stack", "ls"]);
        let pairs = track_directories(&commands, dir.path());
        assert_eq!(pairs[1].1, canonical_sub.to_string_lossy());
    }

    #[test]
    fn test_bare_cd_is_not_a_transition() {
        let dir = TempDir::new().unwrap();
        let commands = strings(&["cd", "ls"]);
        let pairs = track_directories(&commands, dir.path());
        assert_eq!(pairs[1].1, dir.path().to_string_lossy());
    }
}
