//! Result entity and related types

pub mod action;

pub use action::{
    ActionContext, ActionHandler, ActionOutcome, Modifiers, ResultAction, DEFAULT_ACTION_HOTKEY,
};

use crate::query::Query;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Refresh intervals are rounded up to a multiple of this many milliseconds
pub const REFRESH_GRANULARITY_MS: u64 = 100;

/// Logical identity of a result: the owning plugin plus its context data or id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResultIdentity {
    pub plugin_id: String,
    pub key: String,
}

impl ResultIdentity {
    pub fn new<P: Into<String>, K: Into<String>>(plugin_id: P, key: K) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ResultIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.plugin_id, self.key)
    }
}

/// Half-open range of character indices to highlight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
}

impl HighlightSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge sorted character indices into contiguous spans
    pub fn from_indices(indices: &[usize]) -> Vec<HighlightSpan> {
        let mut spans: Vec<HighlightSpan> = Vec::new();
        for &index in indices {
            match spans.last_mut() {
                Some(last) if last.end == index => last.end = index + 1,
                Some(last) if index < last.end => {}
                _ => spans.push(HighlightSpan::new(index, index + 1)),
            }
        }
        spans
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// Kind of preview payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    Text,
    Markdown,
    Image,
    Url,
}

/// Optional preview shown next to the selected result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    pub kind: PreviewKind,
    pub data: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Preview {
    pub fn text<S: Into<String>>(data: S) -> Self {
        Self {
            kind: PreviewKind::Text,
            data: data.into(),
            properties: BTreeMap::new(),
        }
    }
}

/// Display fields a plugin may replace while a result is on screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshedFields {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub icon: Option<String>,
    pub preview: Option<Preview>,
}

/// One candidate answer contributed by a plugin
#[derive(Debug, Clone, Default)]
pub struct ResultItem {
    /// Plugin-assigned id
    pub id: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub icon: Option<String>,
    /// Higher is more relevant
    pub score: i64,
    /// Owning plugin; stamped by the query adapter
    pub plugin_id: String,
    pub title_highlights: Vec<HighlightSpan>,
    pub subtitle_highlights: Vec<HighlightSpan>,
    pub actions: Vec<ResultAction>,
    pub preview: Option<Preview>,
    pub refresh_interval_ms: Option<u64>,
    /// Opaque blob identifying the result across update cycles
    pub context_data: Option<String>,
    /// Query that produced this version of the result
    pub origin_query: Option<Arc<Query>>,
}

impl ResultItem {
    /// Create a new result with a title
    pub fn new<S: Into<String>>(title: S) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_subtitle<S: Into<String>>(mut self, subtitle: S) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_icon<S: Into<String>>(mut self, icon: S) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    pub fn with_context_data<S: Into<String>>(mut self, data: S) -> Self {
        self.context_data = Some(data.into());
        self
    }

    pub fn with_action(mut self, action: ResultAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_preview(mut self, preview: Preview) -> Self {
        self.preview = Some(preview);
        self
    }

    pub fn with_title_highlights(mut self, spans: Vec<HighlightSpan>) -> Self {
        self.title_highlights = spans;
        self
    }

    pub fn with_refresh_interval(mut self, interval_ms: u64) -> Self {
        self.refresh_interval_ms = Some(interval_ms);
        self
    }

    /// Context data, else id, else title
    pub fn identity_key(&self) -> &str {
        self.context_data
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or(&self.title)
    }

    pub fn identity(&self) -> ResultIdentity {
        ResultIdentity::new(self.plugin_id.clone(), self.identity_key())
    }

    /// The default action, falling back to the first one
    pub fn default_action(&self) -> Option<&ResultAction> {
        self.actions
            .iter()
            .find(|action| action.is_default)
            .or_else(|| self.actions.first())
    }

    pub fn find_action(&self, action_id: &str) -> Option<&ResultAction> {
        self.actions.iter().find(|action| action.id == action_id)
    }

    /// Copy the mutable fields of a newer version of the same logical result
    pub fn absorb(&mut self, newer: ResultItem) {
        self.score = newer.score;
        self.title_highlights = newer.title_highlights;
        self.subtitle_highlights = newer.subtitle_highlights;
        self.origin_query = newer.origin_query;
        self.title = newer.title;
        self.subtitle = newer.subtitle;
        self.icon = newer.icon;
        self.preview = newer.preview;
        self.actions = newer.actions;
    }

    /// Apply fields produced by a refresh tick
    pub fn apply_refresh(&mut self, fields: RefreshedFields) {
        if let Some(title) = fields.title {
            self.title = title;
        }
        if let Some(subtitle) = fields.subtitle {
            self.subtitle = subtitle;
        }
        if let Some(icon) = fields.icon {
            self.icon = Some(icon);
        }
        if let Some(preview) = fields.preview {
            self.preview = Some(preview);
        }
    }

    /// Serializable view for consumers that cannot hold callbacks
    pub fn view(&self) -> ResultView {
        ResultView {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            icon: self.icon.clone(),
            score: self.score,
            plugin_id: self.plugin_id.clone(),
            key: self.identity_key().to_string(),
            title_highlights: self.title_highlights.clone(),
            subtitle_highlights: self.subtitle_highlights.clone(),
            actions: self.actions.iter().map(|a| a.name.clone()).collect(),
            preview: self.preview.clone(),
        }
    }
}

/// Plain data snapshot of a result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultView {
    pub title: String,
    pub subtitle: String,
    pub icon: Option<String>,
    pub score: i64,
    pub plugin_id: String,
    pub key: String,
    pub title_highlights: Vec<HighlightSpan>,
    pub subtitle_highlights: Vec<HighlightSpan>,
    pub actions: Vec<String>,
    pub preview: Option<Preview>,
}

/// Round a refresh interval up to the refresh granularity; zero disables refresh
pub fn normalize_refresh_interval(interval_ms: u64) -> Option<u64> {
    if interval_ms == 0 {
        return None;
    }
    Some(interval_ms.div_ceil(REFRESH_GRANULARITY_MS) * REFRESH_GRANULARITY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_spans_from_indices() {
        let spans = HighlightSpan::from_indices(&[0, 1, 2, 5, 7, 8]);
        assert_eq!(
            spans,
            vec![
                HighlightSpan::new(0, 3),
                HighlightSpan::new(5, 6),
                HighlightSpan::new(7, 9)
            ]
        );
        assert!(HighlightSpan::from_indices(&[]).is_empty());
    }

    #[test]
    fn test_identity_prefers_context_data() {
        let mut result = ResultItem::new("Chrome").with_id("id-1");
        result.plugin_id = "programs".to_string();
        assert_eq!(result.identity(), ResultIdentity::new("programs", "id-1"));

        let result = result.with_context_data("C:/chrome.exe");
        assert_eq!(result.identity().key, "C:/chrome.exe");
    }

    #[test]
    fn test_refresh_interval_rounding() {
        assert_eq!(normalize_refresh_interval(0), None);
        assert_eq!(normalize_refresh_interval(100), Some(100));
        assert_eq!(normalize_refresh_interval(123), Some(200));
        assert_eq!(normalize_refresh_interval(1234), Some(1300));
    }

    #[test]
    fn test_absorb_keeps_identity_fields() {
        let mut current = ResultItem::new("old")
            .with_context_data("ctx")
            .with_score(1)
            .with_refresh_interval(500);
        current.plugin_id = "p".to_string();

        let newer = ResultItem::new("new").with_context_data("other").with_score(9);
        current.absorb(newer);

        assert_eq!(current.title, "new");
        assert_eq!(current.score, 9);
        assert_eq!(current.context_data.as_deref(), Some("ctx"));
        assert_eq!(current.plugin_id, "p");
        assert_eq!(current.refresh_interval_ms, Some(500));
    }

    #[test]
    fn test_default_action_fallback() {
        let result = ResultItem::new("x")
            .with_action(ResultAction::new("first", |_| true))
            .with_action(ResultAction::new("second", |_| true).as_default());
        assert_eq!(result.default_action().map(|a| a.name.as_str()), Some("second"));

        let result = ResultItem::new("y").with_action(ResultAction::new("only", |_| false));
        assert_eq!(result.default_action().map(|a| a.name.as_str()), Some("only"));
    }
}
