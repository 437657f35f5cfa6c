//! Plugin listing command

use super::build_launcher;
use crate::config::CliConfigLoader;
use anyhow::Result;
use colored::Colorize;
use tracing::info;

/// Show registered plugins with their trigger keywords
pub async fn plugins_command(config_loader: CliConfigLoader) -> Result<()> {
    info!("Listing plugins");

    let launcher = build_launcher(config_loader.load().await?).await?;

    for instance in launcher.registry().list() {
        let metadata = &instance.metadata;
        let trigger = if metadata.is_global() {
            "global".to_string()
        } else {
            format!("keyword: {}", metadata.trigger_keywords.join(", "))
        };
        let state = if instance.is_disabled() {
            " (disabled)".red().to_string()
        } else {
            String::new()
        };

        println!(
            "{} {}{}",
            metadata.id.bold(),
            format!("[{}]", trigger).cyan(),
            state
        );
        println!("   {} v{}", metadata.name, metadata.version);
        if !metadata.description.is_empty() {
            println!("   {}", metadata.description.dimmed());
        }
        for command in &metadata.commands {
            println!("   • {} - {}", command.command, command.description);
        }
    }

    launcher.shutdown().await?;
    Ok(())
}
