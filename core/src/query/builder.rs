//! Query text parsing

use super::{Query, QueryId, GLOBAL_TRIGGER_KEYWORD};
use std::collections::HashMap;

/// Lookup of trigger keywords owned by enabled plugins
pub trait KeywordIndex {
    /// Commands declared for `keyword`, or `None` if no enabled plugin owns it
    fn commands_for(&self, keyword: &str) -> Option<Vec<String>>;
}

impl KeywordIndex for () {
    fn commands_for(&self, _keyword: &str) -> Option<Vec<String>> {
        None
    }
}

impl KeywordIndex for HashMap<String, Vec<String>> {
    fn commands_for(&self, keyword: &str) -> Option<Vec<String>> {
        self.get(keyword).cloned()
    }
}

/// Parses raw query box text into a [`Query`]
pub struct QueryBuilder<'a> {
    keywords: &'a dyn KeywordIndex,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(keywords: &'a dyn KeywordIndex) -> Self {
        Self { keywords }
    }

    /// Parse `text` into a query with the given id
    pub fn build(&self, id: QueryId, text: &str) -> Query {
        let terms: Vec<&str> = text.split_whitespace().collect();
        let normalized = terms.join(" ");

        let mut query = Query {
            id,
            raw: text.to_string(),
            normalized: normalized.clone(),
            trigger_keyword: None,
            command: None,
            search: normalized,
        };

        let Some(first) = terms.first().copied() else {
            return query;
        };

        // "g" alone is a search for "g"; "g " or "g rust" is scoped to the g plugin
        let has_separator = text.trim_start()[first.len()..]
            .chars()
            .next()
            .is_some_and(char::is_whitespace);
        if !has_separator || first == GLOBAL_TRIGGER_KEYWORD {
            return query;
        }

        let Some(commands) = self.keywords.commands_for(first) else {
            return query;
        };

        let rest = &terms[1..];
        query.trigger_keyword = Some(first.to_string());

        let ends_with_separator = text.ends_with(char::is_whitespace);
        match rest.first() {
            Some(candidate)
                if commands.iter().any(|c| c == candidate)
                    && (rest.len() > 1 || ends_with_separator) =>
            {
                query.command = Some(candidate.to_string());
                query.search = rest[1..].join(" ");
            }
            _ => {
                query.search = rest.join(" ");
            }
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords() -> HashMap<String, Vec<String>> {
        let mut map = HashMap::new();
        map.insert("wpm".to_string(), vec!["install".to_string(), "uninstall".to_string()]);
        map.insert("g".to_string(), Vec::new());
        map
    }

    fn build(text: &str) -> Query {
        let index = keywords();
        QueryBuilder::new(&index).build(QueryId(1), text)
    }

    #[test]
    fn test_global_query_without_keyword() {
        let query = build("file.txt file2 file3");
        assert!(query.is_global());
        assert_eq!(query.search(), "file.txt file2 file3");
        assert_eq!(query.command(), None);
    }

    #[test]
    fn test_trigger_keyword_collapses_whitespace() {
        let query = build("wpm   file.txt    file2 file3");
        assert_eq!(query.trigger_keyword(), Some("wpm"));
        assert_eq!(query.command(), None);
        assert_eq!(query.search(), "file.txt file2 file3");
        assert_eq!(query.normalized(), "wpm file.txt file2 file3");
    }

    #[test]
    fn test_keyword_alone_is_plain_search() {
        let query = build("g");
        assert!(query.is_global());
        assert_eq!(query.search(), "g");

        let query = build("g ");
        assert_eq!(query.trigger_keyword(), Some("g"));
        assert_eq!(query.search(), "");
    }

    #[test]
    fn test_unknown_keyword_is_search_text() {
        let query = build("y test");
        assert!(query.is_global());
        assert_eq!(query.search(), "y test");
    }

    #[test]
    fn test_command_requires_following_term_or_separator() {
        let query = build("wpm install");
        assert_eq!(query.command(), None);
        assert_eq!(query.search(), "install");

        let query = build("wpm install ");
        assert_eq!(query.command(), Some("install"));
        assert_eq!(query.search(), "");

        let query = build("wpm install calculator");
        assert_eq!(query.command(), Some("install"));
        assert_eq!(query.search(), "calculator");
    }

    #[test]
    fn test_global_keyword_is_never_parsed() {
        let mut index = keywords();
        index.insert("*".to_string(), Vec::new());
        let query = QueryBuilder::new(&index).build(QueryId(3), "* test");
        assert!(query.is_global());
        assert_eq!(query.search(), "* test");
    }

    #[test]
    fn test_empty_text() {
        let query = build("   ");
        assert!(query.is_empty());
        assert_eq!(query.raw(), "   ");
        assert_eq!(query.search(), "");
    }
}
