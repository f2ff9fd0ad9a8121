use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
pub use clap_complete::Shell;
use ctxhist_core::DEFAULT_FUZZY_LIMIT;
use ctxhist_core::DEFAULT_FUZZY_THRESHOLD;

const LONG_ABOUT: &str = r#"ctxhist records every shell command together with the directory it ran in
and the shell session it came from, then lets you query that record across
all of your shells at once.

Each shell writes to its own private store; queries merge every store that
currently exists. Stores left behind by shells that died abnormally are
reclaimed by 'cleanup-dead'.

WORKFLOW:
    1. Run 'ctxhist' (or 'ctxhist record') from a shell hook to ingest new
       history and see what ran in the current directory
    2. Query with 'dir', 'recent', 'timeline', or 'search'
    3. Occasionally run 'cleanup' / 'cleanup-dead' to reclaim old stores

EXAMPLES:
    ctxhist                          Ingest, then show history for the cwd
    ctxhist dir /path/to/project     History for a specific directory
    ctxhist recent -n 20             20 most recent commands, all shells
    ctxhist search 'git'             Commands containing 'git'
    ctxhist search 'git sttaus' --fuzzy
                                     Similarity-ranked matches
    ctxhist timeline -t              Everything, with timestamps
    ctxhist stats                    Totals, top directories, top commands
    ctxhist cleanup --days 30        Drop stores idle for 30+ days
    ctxhist cleanup-dead             Drop stores of exited shells"#;

#[derive(Parser)]
#[command(name = "ctxhist")]
#[command(author, version)]
#[command(about = "Contextual shell history: what you ran, where, in which shell")]
#[command(long_about = LONG_ABOUT)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Show which shell session each entry came from
    #[arg(short = 's', long = "shell-info", global = true)]
    pub shell_info: bool,

    /// Show timestamps alongside entries
    #[arg(short = 't', long, global = true)]
    pub timestamps: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest the shell history file, then show history for the current directory
    Record {
        /// History file to ingest (default: $CTXHIST_HISTFILE or ~/.bash_history)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show history for a directory (default: current directory)
    Dir {
        path: Option<PathBuf>,
    },

    /// Show the most recent commands across all shells
    Recent {
        /// Number of commands to show
        #[arg(short = 'n', long, default_value = "50")]
        count: usize,
    },

    /// Show all commands in time order, optionally bounded
    Timeline {
        /// Start of the range, seconds since the epoch
        #[arg(long)]
        from: Option<f64>,
        /// End of the range, seconds since the epoch
        #[arg(long)]
        to: Option<f64>,
    },

    /// Search commands by substring, or by similarity with --fuzzy
    Search {
        query: String,
        /// Rank by similarity instead of exact substring matching
        #[arg(long)]
        fuzzy: bool,
        /// Minimum similarity score to keep (fuzzy only)
        #[arg(long, default_value_t = DEFAULT_FUZZY_THRESHOLD)]
        threshold: f64,
        /// Maximum number of fuzzy results
        #[arg(long, default_value_t = DEFAULT_FUZZY_LIMIT)]
        limit: usize,
    },

    /// Show statistics across all session stores
    Stats,

    /// Delete session stores with no activity in the last N days
    Cleanup {
        #[arg(long, default_value = "30")]
        days: u64,
    },

    /// Delete session stores whose owning shell has exited
    CleanupDead,

    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_bare_invocation() {
        let cli = Cli::try_parse_from(["ctxhist"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_search_defaults() {
        let cli = Cli::try_parse_from(["ctxhist", "search", "git"]).unwrap();
        match cli.command {
            Some(Commands::Search {
                query,
                fuzzy,
                threshold,
                limit,
            }) => {
                assert_eq!(query, "git");
                assert!(!fuzzy);
                assert_eq!(threshold, DEFAULT_FUZZY_THRESHOLD);
                assert_eq!(limit, DEFAULT_FUZZY_LIMIT);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ctxhist", "recent", "-n", "5", "-t", "-s"]).unwrap();
        assert!(cli.timestamps);
        assert!(cli.shell_info);
        match cli.command {
            Some(Commands::Recent { count }) => assert_eq!(count, 5),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
