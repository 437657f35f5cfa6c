//! Keyword-scoped web search plugins

use async_trait::async_trait;
use url::form_urlencoded;
use wox_core::error::Result;
use wox_core::{impl_plugin_factory, Plugin, PluginMetadata, Query, ResultAction, ResultItem};

pub const GOOGLE_PLUGIN_ID: &str = "websearch.google";
pub const YOUTUBE_PLUGIN_ID: &str = "websearch.youtube";

const QUERY_PLACEHOLDER: &str = "{query}";
const RESULT_SCORE: i64 = 100;

/// A search command that swaps the URL template, e.g. `g image cats`
struct SearchCommand {
    command: &'static str,
    description: &'static str,
    label: &'static str,
    url_template: &'static str,
}

pub struct WebSearchPlugin {
    metadata: PluginMetadata,
    label: &'static str,
    url_template: &'static str,
    commands: Vec<SearchCommand>,
}

impl WebSearchPlugin {
    pub fn google() -> Self {
        let commands = vec![SearchCommand {
            command: "image",
            description: "Search Google Images",
            label: "Google Images",
            url_template: "https://www.google.com/search?tbm=isch&q={query}",
        }];
        Self::new(
            GOOGLE_PLUGIN_ID,
            "Google",
            "g",
            "https://www.google.com/search?q={query}",
            commands,
        )
    }

    pub fn youtube() -> Self {
        Self::new(
            YOUTUBE_PLUGIN_ID,
            "YouTube",
            "y",
            "https://www.youtube.com/results?search_query={query}",
            Vec::new(),
        )
    }

    fn new(
        id: &str,
        label: &'static str,
        keyword: &str,
        url_template: &'static str,
        commands: Vec<SearchCommand>,
    ) -> Self {
        let mut metadata = PluginMetadata::new(id, format!("{} Search", label))
            .with_author("Wox Launcher")
            .with_description(format!("Search {} from the launcher", label))
            .with_keyword(keyword);
        for command in &commands {
            metadata = metadata.with_command(command.command, command.description);
        }

        Self {
            metadata,
            label,
            url_template,
            commands,
        }
    }

    /// Label and URL for `query`, honouring a recognised command
    fn target(&self, query: &Query) -> (&'static str, String) {
        let (label, template) = query
            .command()
            .and_then(|command| self.commands.iter().find(|c| c.command == command))
            .map(|c| (c.label, c.url_template))
            .unwrap_or((self.label, self.url_template));

        let encoded: String = form_urlencoded::byte_serialize(query.search().as_bytes()).collect();
        (label, template.replace(QUERY_PLACEHOLDER, &encoded))
    }
}

#[async_trait]
impl Plugin for WebSearchPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    async fn query(&self, query: &Query) -> Result<Vec<ResultItem>> {
        if query.search().is_empty() {
            return Ok(Vec::new());
        }

        let (label, url) = self.target(query);
        let opened = url.clone();
        // One stable identity, so the row is updated in place while typing
        Ok(vec![ResultItem::new(format!(
            "Search {} for {}",
            label,
            query.search()
        ))
        .with_subtitle(url)
        .with_context_data("search")
        .with_score(RESULT_SCORE)
        .with_action(ResultAction::new("Search", move |_| {
            println!("Opening {}", opened);
            true
        }))])
    }
}

impl_plugin_factory!(
    GoogleSearchFactory,
    WebSearchPlugin::google(),
    GOOGLE_PLUGIN_ID,
    "Google Search"
);

impl_plugin_factory!(
    YouTubeSearchFactory,
    WebSearchPlugin::youtube(),
    YOUTUBE_PLUGIN_ID,
    "YouTube Search"
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wox_core::query::QueryBuilder;
    use wox_core::QueryId;

    fn query(text: &str) -> Query {
        let mut keywords = HashMap::new();
        keywords.insert("g".to_string(), vec!["image".to_string()]);
        keywords.insert("y".to_string(), Vec::new());
        QueryBuilder::new(&keywords).build(QueryId(1), text)
    }

    #[tokio::test]
    async fn test_search_url_is_encoded() {
        let results = WebSearchPlugin::google()
            .query(&query("g rust & tokio"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Search Google for rust & tokio");
        assert_eq!(
            results[0].subtitle,
            "https://www.google.com/search?q=rust+%26+tokio"
        );
    }

    #[tokio::test]
    async fn test_image_command_switches_target() {
        let plugin = WebSearchPlugin::google();

        let results = plugin.query(&query("g image cats")).await.unwrap();
        assert_eq!(results[0].title, "Search Google Images for cats");
        assert!(results[0].subtitle.contains("tbm=isch"));

        let results = plugin.query(&query("g image")).await.unwrap();
        assert_eq!(results[0].title, "Search Google for image");
    }

    #[tokio::test]
    async fn test_keyword_only_gives_nothing() {
        let results = WebSearchPlugin::youtube().query(&query("y ")).await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_metadata_declares_keyword_and_commands() {
        let google = WebSearchPlugin::google();
        assert!(google.metadata().has_keyword("g"));
        assert_eq!(google.metadata().commands[0].command, "image");
        assert!(WebSearchPlugin::youtube().metadata().commands.is_empty());
    }
}
