//! Plain-text rendering of query results.

use chrono::DateTime;
use chrono::Local;
use ctxhist_core::HistoryRecord;
use ctxhist_core::HistoryStats;

const COMMAND_DISPLAY_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    pub shell_info: bool,
    pub timestamps: bool,
}

pub fn print_entries(records: &[HistoryRecord], opts: DisplayOptions) {
    if records.is_empty() {
        println!("No entries found.");
        return;
    }

    for record in records {
        print_header(record, opts);
        println!("   {}", record.command);
        if opts.timestamps {
            println!();
        }
    }
}

pub fn print_scored(hits: &[(HistoryRecord, f64)], opts: DisplayOptions) {
    if hits.is_empty() {
        println!("No entries found.");
        return;
    }

    for (record, score) in hits {
        print_header(record, opts);
        println!("   [{:.2}] {}", score, record.command);
        if opts.timestamps {
            println!();
        }
    }
}

fn print_header(record: &HistoryRecord, opts: DisplayOptions) {
    if !opts.timestamps {
        return;
    }
    let shell = if opts.shell_info {
        truncate(&record.shell_id, 12)
    } else {
        String::new()
    };
    println!(
        "[{}] {} ({}) {}",
        format_timestamp(record.timestamp),
        shell,
        record.tty,
        record.directory
    );
}

pub fn print_stats(
    stats: &HistoryStats,
    top_directories: &[(String, usize)],
    top_commands: &[(String, usize)],
) {
    println!("History statistics:");
    println!("  Total entries: {}", stats.total);
    println!("  Unique directories: {}", stats.unique_directories);
    println!("  Unique shells: {}", stats.unique_shells);
    println!("  Unique TTYs: {}", stats.unique_ttys);
    if let Some((oldest, newest)) = stats.time_range {
        println!(
            "  Date range: {} to {}",
            format_timestamp(oldest),
            format_timestamp(newest)
        );
    }

    println!();
    println!("Top directories:");
    for (directory, count) in top_directories {
        println!("  {}: {} commands", directory, count);
    }

    println!();
    println!("Top commands:");
    for (command, count) in top_commands {
        println!("  {}: {} times", truncate(command, COMMAND_DISPLAY_WIDTH), count);
    }
}

pub fn format_timestamp(timestamp: f64) -> String {
    let secs = timestamp.floor() as i64;
    let nanos = ((timestamp - secs as f64) * 1e9) as u32;
    match DateTime::from_timestamp(secs, nanos) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => format!("{:.0}", timestamp),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let head: String = text.chars().take(width).collect();
        format!("{}...", head)
    }
}
