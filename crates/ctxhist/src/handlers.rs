//! One handler per subcommand, bridging the CLI surface to the core.

use std::error::Error;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use ctxhist_core::Config;
use ctxhist_core::GlobalView;
use ctxhist_core::HistoryRecord;
use ctxhist_core::LifecycleTracker;
use ctxhist_core::RetentionManager;
use ctxhist_core::SessionStore;
use ctxhist_core::ShellIdentity;
use ctxhist_core::UnixProcessProbe;
use ctxhist_core::exact;
use ctxhist_core::fuzzy;
use ctxhist_core::wall_clock_secs;
use serde_json::json;
use tracing::warn;

use crate::display;
use crate::display::DisplayOptions;
use crate::ingest;
use crate::signals::CleanupGuard;

pub type HandlerResult = Result<(), Box<dyn Error>>;

pub struct HandlerContext {
    pub config: Config,
    pub shell_info: bool,
    pub timestamps: bool,
    pub json: bool,
}

impl HandlerContext {
    fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            shell_info: self.shell_info,
            timestamps: self.timestamps,
        }
    }

    fn view(&self) -> GlobalView {
        GlobalView::new(self.config.clone())
    }

    fn emit_entries(&self, records: &[HistoryRecord]) -> HandlerResult {
        if self.json {
            println!("{}", serde_json::to_string_pretty(records)?);
        } else {
            display::print_entries(records, self.display_options());
        }
        Ok(())
    }
}

/// Ingest the history file into this shell's store, then show what ran in
/// the current directory across all shells.
pub fn handle_record(ctx: &HandlerContext, file: Option<PathBuf>) -> HandlerResult {
    let identity = ShellIdentity::resolve();

    let tracker = LifecycleTracker::new(ctx.config.clone());
    if let Err(e) = tracker.mark_active(&identity) {
        warn!(error = %e, "Could not write lifecycle marker");
    }
    let _cleanup = CleanupGuard::register(&ctx.config, &identity.identifier);

    match SessionStore::open_or_create(&ctx.config, &identity.identifier) {
        Ok(mut store) => ingest_into(&mut store, &identity, file),
        Err(e) => {
            // recording is unavailable; queries still work
            eprintln!("Warning: history recording disabled: {}", e);
        }
    }

    let cwd = std::env::current_dir()?;
    let cwd = cwd.to_string_lossy();
    let records = ctx.view().by_directory(&cwd);
    if !ctx.json {
        println!("History for: {}", cwd);
    }
    ctx.emit_entries(&records)
}

fn ingest_into(store: &mut SessionStore, identity: &ShellIdentity, file: Option<PathBuf>) {
    let Some(history_file) = file.or_else(default_history_file) else {
        warn!("No history file to ingest");
        return;
    };

    let commands = match ingest::parse_history_file(&history_file) {
        Ok(commands) => commands,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(file = %history_file.display(), error = %e, "Could not read history file");
            }
            return;
        }
    };

    let start_dir = ingest::home_dir().unwrap_or_else(|| PathBuf::from("/"));
    for (command, directory) in ingest::track_directories(&commands, &start_dir) {
        store.append(&command, &directory, identity, wall_clock_secs());
    }
}

fn default_history_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CTXHIST_HISTFILE") {
        return Some(PathBuf::from(path));
    }
    ingest::home_dir().map(|home| home.join(".bash_history"))
}

pub fn handle_dir(ctx: &HandlerContext, path: Option<PathBuf>) -> HandlerResult {
    let target = match path {
        Some(path) => resolve_query_dir(&path),
        None => std::env::current_dir()?,
    };
    let target = target.to_string_lossy();

    let records = ctx.view().by_directory(&target);
    if !ctx.json {
        println!("History for: {}", target);
    }
    ctx.emit_entries(&records)
}

fn resolve_query_dir(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

pub fn handle_recent(ctx: &HandlerContext, count: usize) -> HandlerResult {
    let records = ctx.view().recent(count);
    if !ctx.json {
        println!("Recent {} commands:", count);
    }
    ctx.emit_entries(&records)
}

pub fn handle_timeline(ctx: &HandlerContext, from: Option<f64>, to: Option<f64>) -> HandlerResult {
    let start = from.unwrap_or(0.0);
    let end = to.unwrap_or_else(wall_clock_secs);

    let records = ctx.view().by_time_range(start, end);
    if !ctx.json {
        println!("Timeline:");
    }
    ctx.emit_entries(&records)
}

pub fn handle_search(
    ctx: &HandlerContext,
    query: &str,
    use_fuzzy: bool,
    threshold: f64,
    limit: usize,
) -> HandlerResult {
    let merged = ctx.view().merge_all();

    if !use_fuzzy {
        let records = exact(&merged, query);
        if !ctx.json {
            println!("Search results for '{}':", query);
        }
        return ctx.emit_entries(&records);
    }

    let hits = fuzzy(&merged, query, threshold, limit);
    if ctx.json {
        let values: Vec<serde_json::Value> = hits
            .iter()
            .map(|(record, score)| json!({ "record": record, "score": score }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        println!("Fuzzy matches for '{}':", query);
        display::print_scored(&hits, ctx.display_options());
    }
    Ok(())
}

const TOP_LISTING_LIMIT: usize = 5;

pub fn handle_stats(ctx: &HandlerContext) -> HandlerResult {
    let view = ctx.view();
    let stats = view.stats();
    let top_directories = view.top_directories(TOP_LISTING_LIMIT);
    let top_commands = view.top_commands(TOP_LISTING_LIMIT);

    if ctx.json {
        let value = json!({
            "stats": stats,
            "top_directories": top_directories,
            "top_commands": top_commands,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        display::print_stats(&stats, &top_directories, &top_commands);
    }
    Ok(())
}

pub fn handle_cleanup(ctx: &HandlerContext, days: u64) -> HandlerResult {
    let removed = RetentionManager::new(ctx.config.clone()).evict_older_than(days);
    if ctx.json {
        println!("{}", json!({ "removed": removed }));
    } else {
        println!("Cleaned up {} old session stores", removed);
    }
    Ok(())
}

pub fn handle_cleanup_dead(ctx: &HandlerContext) -> HandlerResult {
    let removed = RetentionManager::new(ctx.config.clone()).reclaim_dead(&UnixProcessProbe);
    if ctx.json {
        println!("{}", json!({ "removed": removed }));
    } else {
        println!("Cleaned up {} dead shell stores", removed);
    }
    Ok(())
}
