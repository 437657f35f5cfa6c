//! Query history with navigation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of history items kept
pub const DEFAULT_HISTORY_LIMIT: usize = 300;

/// One executed query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub query: String,
    pub executed_at: DateTime<Utc>,
}

impl HistoryItem {
    pub fn new<S: Into<String>>(query: S, executed_at: DateTime<Utc>) -> Self {
        Self {
            query: query.into(),
            executed_at,
        }
    }

    /// Human readable age relative to `now`
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        let elapsed = now.signed_duration_since(self.executed_at);
        let days = elapsed.num_days();

        if days >= 365 {
            plural(days / 365, "year")
        } else if days >= 30 {
            plural(days / 30, "month")
        } else if days >= 1 {
            plural(days, "day")
        } else if elapsed.num_hours() >= 1 {
            plural(elapsed.num_hours(), "hour")
        } else if elapsed.num_minutes() >= 1 {
            plural(elapsed.num_minutes(), "minute")
        } else {
            "just now".to_string()
        }
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

/// Executed queries, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredHistory")]
pub struct QueryHistory {
    items: Vec<HistoryItem>,
    /// Navigation position; `items.len()` means "not navigating"
    #[serde(skip)]
    cursor: usize,
    #[serde(skip)]
    limit: usize,
}

/// On-disk shape of [`QueryHistory`]
#[derive(Deserialize)]
struct StoredHistory {
    #[serde(default)]
    items: Vec<HistoryItem>,
}

impl From<StoredHistory> for QueryHistory {
    fn from(stored: StoredHistory) -> Self {
        let mut history = Self {
            items: stored.items,
            cursor: 0,
            limit: DEFAULT_HISTORY_LIMIT,
        };
        history.reset();
        history
    }
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryHistory {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Change the item limit, dropping the oldest items if needed
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.trim();
        self.reset();
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record an executed query
    pub fn add(&mut self, query: &str) {
        self.add_at(query, Utc::now());
    }

    pub fn add_at(&mut self, query: &str, executed_at: DateTime<Utc>) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        match self.items.last_mut() {
            Some(last) if last.query == query => last.executed_at = executed_at,
            _ => self.items.push(HistoryItem::new(query, executed_at)),
        }

        self.trim();
        self.reset();
    }

    fn trim(&mut self) {
        if self.items.len() > self.limit {
            let excess = self.items.len() - self.limit;
            self.items.drain(..excess);
        }
    }

    /// Step back to an older query
    pub fn previous(&mut self) -> Option<&str> {
        if self.items.is_empty() || self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.items.get(self.cursor).map(|item| item.query.as_str())
    }

    /// Step forward to a newer query
    pub fn next(&mut self) -> Option<&str> {
        if self.items.is_empty() || self.cursor + 1 >= self.items.len() {
            return None;
        }
        self.cursor += 1;
        self.items.get(self.cursor).map(|item| item.query.as_str())
    }

    /// Leave navigation mode
    pub fn reset(&mut self) {
        self.cursor = self.items.len();
    }

    /// Items, newest first
    pub fn recent(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter().rev()
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_add_deduplicates_latest() {
        let mut history = QueryHistory::new();
        let earlier = Utc::now() - Duration::minutes(5);
        history.add_at("chrome", earlier);
        history.add("chrome");
        assert_eq!(history.len(), 1);
        assert!(history.items()[0].executed_at > earlier);

        history.add("firefox");
        history.add("chrome");
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = QueryHistory::new();
        history.set_limit(3);
        for query in ["a", "b", "c", "d"] {
            history.add(query);
        }
        let queries: Vec<&str> = history.items().iter().map(|i| i.query.as_str()).collect();
        assert_eq!(queries, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_navigation() {
        let mut history = QueryHistory::new();
        assert_eq!(history.previous(), None);

        history.add("one");
        history.add("two");
        history.add("three");

        assert_eq!(history.previous(), Some("three"));
        assert_eq!(history.previous(), Some("two"));
        assert_eq!(history.previous(), Some("one"));
        assert_eq!(history.previous(), None);
        assert_eq!(history.next(), Some("two"));
        assert_eq!(history.next(), Some("three"));
        assert_eq!(history.next(), None);

        history.reset();
        assert_eq!(history.previous(), Some("three"));
    }

    #[test]
    fn test_recent_is_newest_first() {
        let mut history = QueryHistory::new();
        history.add("old");
        history.add("new");
        let recent: Vec<&str> = history.recent().map(|i| i.query.as_str()).collect();
        assert_eq!(recent, vec!["new", "old"]);
    }

    #[test]
    fn test_time_ago() {
        let now = Utc::now();
        assert_eq!(HistoryItem::new("q", now).time_ago(now), "just now");
        assert_eq!(
            HistoryItem::new("q", now - Duration::minutes(1)).time_ago(now),
            "1 minute ago"
        );
        assert_eq!(
            HistoryItem::new("q", now - Duration::hours(5)).time_ago(now),
            "5 hours ago"
        );
        assert_eq!(
            HistoryItem::new("q", now - Duration::days(40)).time_ago(now),
            "1 month ago"
        );
    }

    #[test]
    fn test_serde_restores_cursor_and_limit() {
        let mut history = QueryHistory::new();
        history.add("saved");
        let json = serde_json::to_string(&history).unwrap();

        let mut restored: QueryHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.limit(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(restored.previous(), Some("saved"));
    }

    #[test]
    fn test_loaded_history_starts_at_newest() {
        let json = r#"{"items":[
            {"query":"first","executed_at":"2024-01-01T00:00:00Z"},
            {"query":"second","executed_at":"2024-01-02T00:00:00Z"}
        ]}"#;
        let mut restored: QueryHistory = serde_json::from_str(json).unwrap();
        assert_eq!(restored.next(), None);
        assert_eq!(restored.previous(), Some("second"));
        assert_eq!(restored.previous(), Some("first"));
    }
}
