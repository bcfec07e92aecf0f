//! PWA CLI - Inspect offline worker and push configuration.
//!
//! Commands:
//! - `pwa config` - Check or print the configuration
//! - `pwa route` - Explain how the worker would handle a URL
//! - `pwa push` - Preview the notification built from a push payload
//! - `pwa offline-page` - Render the offline fallback document

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pwa_observability::{init_logging, LogConfig};

use commands::{ConfigArgs, OfflinePageArgs, PushArgs, RouteArgs};

/// PWA CLI - Inspect offline worker and push configuration
#[derive(Parser)]
#[command(name = "pwa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check or print the configuration
    Config(ConfigArgs),

    /// Explain how the worker would handle a request
    Route(RouteArgs),

    /// Push payload tools
    Push(PushArgs),

    /// Render the offline fallback page
    OfflinePage(OfflinePageArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    init_logging(&LogConfig::human(level).without_timestamps())?;

    let output = output::Output::new(cli.verbose, cli.json);

    let ctx = match context::Context::load(cli.config.as_deref(), output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Config(args) => commands::config::run(args, &ctx).await,
        Commands::Route(args) => commands::route::run(args, &ctx).await,
        Commands::Push(args) => commands::push::run(args, &ctx).await,
        Commands::OfflinePage(args) => commands::offline::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
