//! Query history command

use super::build_launcher;
use crate::config::CliConfigLoader;
use anyhow::Result;
use colored::Colorize;

/// Print recent queries, newest first
pub async fn history_command(config_loader: CliConfigLoader, limit: usize) -> Result<()> {
    let launcher = build_launcher(config_loader.load().await?).await?;

    let items = launcher.history_results("");
    if items.is_empty() {
        println!("{}", "No query history".dimmed());
    }
    for item in items.iter().take(limit) {
        println!("{}  {}", item.title, item.subtitle.dimmed());
    }

    launcher.shutdown().await?;
    Ok(())
}
