use clap::CommandFactory;
use clap::Parser;
use clap_complete::generate;

use ctxhist::commands::Cli;
use ctxhist::commands::Commands;
use ctxhist::handlers;
use ctxhist::handlers::HandlerContext;
use ctxhist::telemetry;
use ctxhist_core::Config;
use ctxhist_core::StoreError;

fn main() {
    let _telemetry = telemetry::init_tracing("warn");

    if let Err(e) = run() {
        if let Some(store_error) = e.downcast_ref::<StoreError>() {
            eprintln!("Error: {}", store_error);
            std::process::exit(74); // EX_IOERR
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let ctx = HandlerContext {
        config: Config::from_env(),
        shell_info: cli.shell_info,
        timestamps: cli.timestamps,
        json: cli.json,
    };

    match cli.command {
        None => handlers::handle_record(&ctx, None),
        Some(Commands::Record { file }) => handlers::handle_record(&ctx, file),
        Some(Commands::Dir { path }) => handlers::handle_dir(&ctx, path),
        Some(Commands::Recent { count }) => handlers::handle_recent(&ctx, count),
        Some(Commands::Timeline { from, to }) => handlers::handle_timeline(&ctx, from, to),
        Some(Commands::Search {
            query,
            fuzzy,
            threshold,
            limit,
        }) => handlers::handle_search(&ctx, &query, fuzzy, threshold, limit),
        Some(Commands::Stats) => handlers::handle_stats(&ctx),
        Some(Commands::Cleanup { days }) => handlers::handle_cleanup(&ctx, days),
        Some(Commands::CleanupDead) => handlers::handle_cleanup_dead(&ctx),
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}
