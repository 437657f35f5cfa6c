//! Single query command

use super::build_launcher;
use crate::config::CliConfigLoader;
use crate::output::ResultFormatter;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Run one query, wait for the round to settle and print the display list
pub async fn query_command(
    config_loader: CliConfigLoader,
    formatter: ResultFormatter,
    text: String,
    json: bool,
    timeout_ms: u64,
) -> Result<()> {
    let config = config_loader.load().await?;
    let max_results = config.max_results_to_show;
    let launcher = build_launcher(config).await?;

    info!("Querying: {}", text);
    if let Some(round) = launcher.query(&text).await? {
        debug!(
            "Dispatched {} to {} plugins",
            round.query(),
            round.plugin_count()
        );
        match tokio::time::timeout(Duration::from_millis(timeout_ms), round.finished()).await {
            Ok(true) => {}
            Ok(false) => warn!("Query round was cancelled"),
            Err(_) => warn!(
                "Query timed out after {}ms, showing partial results",
                timeout_ms
            ),
        }
    }

    let snapshot = launcher.snapshot();
    let results = snapshot.results().take(max_results);
    if json {
        println!("{}", formatter.format_json(results)?);
    } else {
        println!("{}", formatter.format_list(results, None));
    }

    launcher.shutdown().await?;
    Ok(())
}
