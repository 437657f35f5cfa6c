//! # wox CLI
//!
//! Command-line front end for the Wox launcher core.
//!
//! ## Usage
//!
//! - `wox` - Start interactive mode
//! - `wox query "text"` - Run a single query and print the results
//! - `wox plugins` - Show registered plugins
//! - `wox history` - Show recent queries

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod output;
mod plugins;

use commands::{history_command, interactive_command, plugins_command, query_command};
use config::CliConfigLoader;
use output::formatter::DEFAULT_TITLE_WIDTH;
use output::ResultFormatter;

/// Default time to wait for a query round to settle
const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// wox - A keyboard launcher core in your terminal
#[derive(Parser)]
#[command(name = "wox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query the Wox launcher core from a terminal")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory for query history, selection counts and pins
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Number of visible results
    #[arg(long)]
    max_results: Option<usize>,

    /// Plugin ids to disable for this run
    #[arg(long = "disable", value_delimiter = ',')]
    disabled_plugins: Vec<String>,

    /// Time to wait for a query round to settle
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Show each result's score
    #[arg(long, global = true)]
    scores: bool,

    /// Width of the title column
    #[arg(long, global = true, default_value_t = DEFAULT_TITLE_WIDTH)]
    title_width: usize,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single query
    Query {
        /// Query text, e.g. "g rust" or "1+2"
        text: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show registered plugins
    Plugins,

    /// Show recent queries
    History {
        /// Maximum number of entries
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(storage_dir) = &cli.storage_dir {
        loader = loader.with_storage_dir_override(storage_dir.clone());
    }

    if let Some(max_results) = cli.max_results {
        loader = loader.with_max_results_override(max_results);
    }

    if !cli.disabled_plugins.is_empty() {
        loader = loader.with_disabled_plugins(cli.disabled_plugins.clone());
    }

    loader
}

/// Build the result formatter from CLI arguments
fn build_formatter(cli: &Cli) -> ResultFormatter {
    ResultFormatter::new()
        .with_title_width(cli.title_width)
        .with_scores(cli.scores)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    wox_core::install_panic_hook();
    wox_core::init_tracing_with_debug(cli.verbose);

    let config_loader = build_config_loader(&cli);
    let formatter = build_formatter(&cli);

    match cli.command {
        Some(Commands::Query { text, json }) => {
            query_command(config_loader, formatter, text, json, cli.timeout_ms).await
        }
        Some(Commands::Plugins) => plugins_command(config_loader).await,
        Some(Commands::History { limit }) => history_command(config_loader, limit).await,
        // Default to interactive mode
        None => interactive_command(config_loader, formatter, cli.timeout_ms).await,
    }
}
