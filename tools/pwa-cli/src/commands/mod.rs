//! CLI command implementations.

pub mod config;
pub mod offline;
pub mod push;
pub mod route;

use clap::{Args, Subcommand};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Validate the configuration.
    Check,
    /// Print the effective configuration, defaults included.
    Show {
        /// Print as TOML instead of a summary.
        #[arg(long)]
        toml: bool,
    },
}

/// Arguments for the route command.
#[derive(Args)]
pub struct RouteArgs {
    /// Absolute URL, or a path resolved against `--origin`.
    pub url: String,

    /// Origin the worker is registered on.
    #[arg(long, default_value = "http://localhost")]
    pub origin: String,

    /// Treat the request as a full-document navigation.
    #[arg(long)]
    pub navigate: bool,

    /// Request destination (script, style, image, font, document, ...).
    #[arg(short, long)]
    pub destination: Option<String>,

    /// HTTP method.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,
}

/// Arguments for the push command.
#[derive(Args)]
pub struct PushArgs {
    #[command(subcommand)]
    pub command: PushCommand,
}

#[derive(Subcommand)]
pub enum PushCommand {
    /// Show the notification a payload would produce.
    Preview {
        /// Payload text, `@file` to read a file, or omitted for an empty push.
        payload: Option<String>,

        /// Arrival time (RFC 3339) used for the default tag. Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },
}

/// Arguments for the offline-page command.
#[derive(Args)]
pub struct OfflinePageArgs {
    /// Write to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<String>,
}
