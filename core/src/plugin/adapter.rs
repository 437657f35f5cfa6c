//! Plugin query adapter
//!
//! Calls a plugin's query entry point, contains any failure, and normalizes
//! the returned results so the merge engine can rely on their shape.

use super::PluginInstance;
use crate::error::PluginError;
use crate::query::Query;
use crate::result::{normalize_refresh_interval, ResultItem, DEFAULT_ACTION_HOTKEY};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Query one plugin; failures and panics become an empty result list
pub async fn query_plugin(instance: &PluginInstance, query: &Arc<Query>) -> Vec<ResultItem> {
    let start_time = Instant::now();
    let outcome = AssertUnwindSafe(instance.plugin.query(query))
        .catch_unwind()
        .await;
    let duration = start_time.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(results)) => {
            debug!(
                "Plugin {} returned {} results for query {} in {}ms",
                instance.id(),
                results.len(),
                query,
                duration
            );
            polish_results(instance.id(), query, results)
        }
        Ok(Err(e)) => {
            warn!(
                "Plugin {} failed on query {} after {}ms: {}",
                instance.id(),
                query,
                duration,
                e
            );
            Vec::new()
        }
        Err(payload) => {
            let fault = panicked(instance.id(), payload.as_ref());
            error!("{} on query {}", fault, query);
            Vec::new()
        }
    }
}

/// Stamp ownership and fill in missing fields on a plugin's results
///
/// Results without context data or id get the synthetic id
/// `<plugin id>:<index>`. Later duplicates of an identity are dropped.
pub fn polish_results(
    plugin_id: &str,
    query: &Arc<Query>,
    results: Vec<ResultItem>,
) -> Vec<ResultItem> {
    let mut seen = HashSet::new();
    let mut polished = Vec::with_capacity(results.len());

    for (index, mut result) in results.into_iter().enumerate() {
        result.plugin_id = plugin_id.to_string();
        result.origin_query = Some(query.clone());

        if result.context_data.is_none() && result.id.is_none() {
            result.id = Some(format!("{}:{}", plugin_id, index));
        }

        result.refresh_interval_ms = result
            .refresh_interval_ms
            .and_then(normalize_refresh_interval);

        polish_actions(&mut result);

        if !seen.insert(result.identity_key().to_string()) {
            debug!(
                "Dropping duplicate result {} from plugin {}",
                result.identity_key(),
                plugin_id
            );
            continue;
        }
        polished.push(result);
    }

    polished
}

pub(crate) fn polish_actions(result: &mut ResultItem) {
    for action in result.actions.iter_mut() {
        if action.id.is_empty() {
            action.id = Uuid::new_v4().to_string();
        }
    }

    if result.actions.is_empty() {
        return;
    }

    let default_index = match result.actions.iter().position(|a| a.is_default) {
        Some(index) => index,
        None => {
            result.actions[0].is_default = true;
            0
        }
    };

    let mut default_action = result.actions.remove(default_index);
    if default_action.hotkey.is_none() {
        default_action.hotkey = Some(DEFAULT_ACTION_HOTKEY.to_string());
    }
    result.actions.insert(0, default_action);
}

/// Error describing a panic caught in plugin code
pub(crate) fn panicked(plugin_id: &str, payload: &(dyn Any + Send)) -> PluginError {
    PluginError::Panicked {
        plugin: plugin_id.to_string(),
        message: panic_message(payload),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
