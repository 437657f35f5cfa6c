//! Plugin registry for managing loaded plugins

use super::{Plugin, PluginFactory, PluginMetadata};
use crate::error::{PluginError, Result};
use crate::query::{KeywordIndex, Query};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// A loaded plugin plus its runtime state
pub struct PluginInstance {
    pub metadata: Arc<PluginMetadata>,
    pub plugin: Arc<dyn Plugin>,
    disabled: AtomicBool,
}

impl PluginInstance {
    pub fn new(plugin: Arc<dyn Plugin>) -> Self {
        Self {
            metadata: Arc::new(plugin.metadata().clone()),
            plugin,
            disabled: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }
}

/// Registry of loaded plugins, in registration order
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<PluginInstance>>,
    by_id: HashMap<String, usize>,
}

impl PluginRegistry {
    /// Create a new plugin registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        let metadata = plugin.metadata();
        if metadata.id.trim().is_empty() {
            return Err(PluginError::InvalidMetadata {
                message: format!("plugin '{}' has an empty id", metadata.name),
            }
            .into());
        }
        if self.by_id.contains_key(&metadata.id) {
            return Err(PluginError::DuplicateId {
                id: metadata.id.clone(),
            }
            .into());
        }

        for keyword in metadata.trigger_keywords.iter().filter(|k| metadata.has_keyword(k)) {
            if let Some(owner) = self.plugins.iter().find(|p| p.metadata.has_keyword(keyword)) {
                warn!(
                    "Trigger keyword '{}' of plugin {} is already used by {}",
                    keyword,
                    metadata.id,
                    owner.id()
                );
            }
        }

        debug!("Registered plugin {} ({})", metadata.id, metadata.name);
        let instance = Arc::new(PluginInstance::new(plugin));
        self.by_id.insert(instance.id().to_string(), self.plugins.len());
        self.plugins.push(instance);
        Ok(())
    }

    /// Register a plugin created by a factory
    pub fn register_factory(&mut self, factory: &dyn PluginFactory) -> Result<()> {
        self.register(factory.create())
    }

    /// Get a plugin by id
    pub fn get(&self, id: &str) -> Option<Arc<PluginInstance>> {
        self.by_id.get(id).map(|&index| self.plugins[index].clone())
    }

    /// All plugins in registration order
    pub fn list(&self) -> &[Arc<PluginInstance>] {
        &self.plugins
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Enable or disable a plugin
    pub fn set_disabled(&self, id: &str, disabled: bool) -> Result<()> {
        let instance = self.get(id).ok_or_else(|| PluginError::NotFound {
            id: id.to_string(),
        })?;
        instance.disabled.store(disabled, Ordering::Release);
        Ok(())
    }

    /// Enabled plugins that should receive `query`
    pub fn eligible_for(&self, query: &Query) -> Vec<Arc<PluginInstance>> {
        self.plugins
            .iter()
            .filter(|p| !p.is_disabled() && p.metadata.accepts(query))
            .cloned()
            .collect()
    }
}

impl KeywordIndex for PluginRegistry {
    fn commands_for(&self, keyword: &str) -> Option<Vec<String>> {
        let owners: Vec<&Arc<PluginInstance>> = self
            .plugins
            .iter()
            .filter(|p| !p.is_disabled() && p.metadata.has_keyword(keyword))
            .collect();
        if owners.is_empty() {
            return None;
        }
        Some(
            owners
                .iter()
                .flat_map(|p| p.metadata.commands.iter().map(|c| c.command.clone()))
                .collect(),
        )
    }
}
