//! Base plugin trait and metadata

use crate::engine::ResultsUpdater;
use crate::error::Result;
use crate::query::{Query, GLOBAL_TRIGGER_KEYWORD};
use crate::result::{RefreshedFields, ResultItem};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A command a keyword plugin understands, e.g. `wpm install`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCommand {
    pub command: String,
    #[serde(default)]
    pub description: String,
}

/// Static description of a plugin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginMetadata {
    pub id: String,
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    pub icon: Option<String>,
    /// Empty or containing `*` means the plugin answers every query
    pub trigger_keywords: Vec<String>,
    pub commands: Vec<PluginCommand>,
    /// Keep raw plugin scores instead of adding the usage boost
    pub ignore_auto_score: bool,
}

impl PluginMetadata {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: "1.0.0".to_string(),
            ..Default::default()
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_author<S: Into<String>>(mut self, author: S) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_keyword<S: Into<String>>(mut self, keyword: S) -> Self {
        self.trigger_keywords.push(keyword.into());
        self
    }

    pub fn with_command<C: Into<String>, D: Into<String>>(
        mut self,
        command: C,
        description: D,
    ) -> Self {
        self.commands.push(PluginCommand {
            command: command.into(),
            description: description.into(),
        });
        self
    }

    pub fn ignoring_auto_score(mut self) -> Self {
        self.ignore_auto_score = true;
        self
    }

    /// Whether the plugin answers queries without a trigger keyword
    pub fn is_global(&self) -> bool {
        self.trigger_keywords.is_empty()
            || self
                .trigger_keywords
                .iter()
                .any(|k| k == GLOBAL_TRIGGER_KEYWORD)
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        keyword != GLOBAL_TRIGGER_KEYWORD && self.trigger_keywords.iter().any(|k| k == keyword)
    }

    /// Whether a query should be dispatched to this plugin
    pub fn accepts(&self, query: &Query) -> bool {
        self.is_global()
            || query
                .trigger_keyword()
                .is_some_and(|keyword| self.has_keyword(keyword))
    }
}

/// Trait for all plugins
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Get the plugin metadata
    fn metadata(&self) -> &PluginMetadata;

    /// Answer a query
    async fn query(&self, query: &Query) -> Result<Vec<ResultItem>>;

    /// Extra entries shown in the context menu of one of this plugin's results
    fn context_menu(&self, _result: &ResultItem) -> Vec<ResultItem> {
        Vec::new()
    }

    /// New display fields for a self-refreshing result
    async fn refresh(&self, _result: &ResultItem) -> Option<RefreshedFields> {
        None
    }

    /// Receive the handle used to push results outside the query cycle
    fn attach_updater(&self, _updater: ResultsUpdater) {}
}

/// Factory trait for creating plugins
pub trait PluginFactory: Send + Sync {
    /// Create a new instance of the plugin
    fn create(&self) -> Arc<dyn Plugin>;

    /// Get the id of the plugin this factory creates
    fn plugin_id(&self) -> &str;

    /// Get the display name of the plugin this factory creates
    fn plugin_name(&self) -> &str;
}

/// Macro to help implement plugin factories
#[macro_export]
macro_rules! impl_plugin_factory {
    ($factory:ident, $constructor:expr, $id:expr, $name:expr) => {
        pub struct $factory;

        impl $crate::plugin::PluginFactory for $factory {
            fn create(&self) -> std::sync::Arc<dyn $crate::plugin::Plugin> {
                std::sync::Arc::new($constructor)
            }

            fn plugin_id(&self) -> &str {
                $id
            }

            fn plugin_name(&self) -> &str {
                $name
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryBuilder, QueryId};
    use std::collections::HashMap;

    fn query(text: &str) -> Query {
        let mut keywords = HashMap::new();
        keywords.insert("g".to_string(), Vec::new());
        keywords.insert("y".to_string(), Vec::new());
        QueryBuilder::new(&keywords).build(QueryId(1), text)
    }

    #[test]
    fn test_global_detection() {
        assert!(PluginMetadata::new("calc", "Calculator").is_global());
        assert!(PluginMetadata::new("sys", "System")
            .with_keyword("*")
            .is_global());
        assert!(!PluginMetadata::new("google", "Google")
            .with_keyword("g")
            .is_global());
    }

    #[test]
    fn test_accepts_by_keyword() {
        let google = PluginMetadata::new("google", "Google").with_keyword("g");
        let youtube = PluginMetadata::new("youtube", "YouTube").with_keyword("y");
        let calc = PluginMetadata::new("calc", "Calculator");

        let scoped = query("g test");
        assert!(google.accepts(&scoped));
        assert!(!youtube.accepts(&scoped));
        assert!(calc.accepts(&scoped));

        let global = query("test");
        assert!(!google.accepts(&global));
        assert!(calc.accepts(&global));
    }
}
