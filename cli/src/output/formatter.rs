//! Terminal formatting for result lists

use colored::Colorize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use wox_core::result::{HighlightSpan, ResultView};
use wox_core::ResultItem;

/// Default width of the title column
pub const DEFAULT_TITLE_WIDTH: usize = 36;

const SELECTED_MARKER: &str = "›";
const ELLIPSIS: char = '…';

/// Formats results as aligned, highlighted terminal rows
#[derive(Debug, Clone)]
pub struct ResultFormatter {
    title_width: usize,
    show_scores: bool,
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter {
    pub fn new() -> Self {
        Self {
            title_width: DEFAULT_TITLE_WIDTH,
            show_scores: false,
        }
    }

    pub fn with_title_width(mut self, width: usize) -> Self {
        self.title_width = width.max(4);
        self
    }

    pub fn with_scores(mut self, show: bool) -> Self {
        self.show_scores = show;
        self
    }

    /// Format a whole list; `selected` marks one row
    pub fn format_list<'a, I>(&self, results: I, selected: Option<usize>) -> String
    where
        I: IntoIterator<Item = &'a ResultItem>,
    {
        let lines: Vec<String> = results
            .into_iter()
            .enumerate()
            .map(|(index, result)| self.format_row(index, result, selected == Some(index)))
            .collect();

        if lines.is_empty() {
            return "No results".dimmed().to_string();
        }
        lines.join("\n")
    }

    /// Format one row: marker, number, title, subtitle and owning plugin
    pub fn format_row(&self, index: usize, result: &ResultItem, selected: bool) -> String {
        let marker = if selected { SELECTED_MARKER } else { " " };
        let title = truncate_to_width(&result.title, self.title_width);
        let padding = self.title_width.saturating_sub(title.width());
        let title = highlight(&title, &result.title_highlights);

        let mut line = format!(
            "{} {:>2}. {}{}  {}",
            marker.cyan().bold(),
            index + 1,
            title,
            " ".repeat(padding),
            highlight(&result.subtitle, &result.subtitle_highlights).dimmed()
        );

        if !result.plugin_id.is_empty() {
            line.push_str(&format!("  [{}]", result.plugin_id).blue().to_string());
        }
        if self.show_scores {
            line.push_str(&format!("  ({})", result.score).dimmed().to_string());
        }
        line
    }

    /// Serialize results as a pretty JSON array
    pub fn format_json<'a, I>(&self, results: I) -> serde_json::Result<String>
    where
        I: IntoIterator<Item = &'a ResultItem>,
    {
        let views: Vec<ResultView> = results.into_iter().map(ResultItem::view).collect();
        serde_json::to_string_pretty(&views)
    }
}

/// Render highlighted character spans in bold yellow
pub fn highlight(text: &str, spans: &[HighlightSpan]) -> String {
    if spans.is_empty() {
        return text.to_string();
    }

    let mut output = String::with_capacity(text.len());
    let mut segment = String::new();
    let mut segment_highlighted = false;

    for (index, ch) in text.chars().enumerate() {
        let highlighted = spans.iter().any(|span| span.contains(index));
        if highlighted != segment_highlighted && !segment.is_empty() {
            push_segment(&mut output, &segment, segment_highlighted);
            segment.clear();
        }
        segment_highlighted = highlighted;
        segment.push(ch);
    }
    push_segment(&mut output, &segment, segment_highlighted);
    output
}

fn push_segment(output: &mut String, segment: &str, highlighted: bool) {
    if highlighted {
        output.push_str(&segment.yellow().bold().to_string());
    } else {
        output.push_str(segment);
    }
}

/// Cut `text` to at most `max_width` columns, ending with an ellipsis when cut
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(1);
    let mut result = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > budget {
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result.push(ELLIPSIS);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_wide_characters() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");

        // Each CJK character is two columns wide
        let cut = truncate_to_width("你好世界", 5);
        assert_eq!(cut, "你好…");
        assert!(cut.width() <= 5);
    }

    #[test]
    fn test_highlight_keeps_text() {
        colored::control::set_override(false);
        let spans = vec![HighlightSpan::new(0, 2)];
        assert_eq!(highlight("Firefox", &spans), "Firefox");
        assert_eq!(highlight("Firefox", &[]), "Firefox");
    }

    #[test]
    fn test_row_and_list_layout() {
        colored::control::set_override(false);
        let formatter = ResultFormatter::new().with_title_width(8);
        let mut result = ResultItem::new("Firefox").with_subtitle("Web browser");
        result.plugin_id = "apps".to_string();

        let row = formatter.format_row(0, &result, true);
        assert_eq!(row, "›  1. Firefox   Web browser  [apps]");

        let list = formatter.format_list([&result, &result], Some(1));
        let lines: Vec<&str> = list.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("   1."));
        assert!(lines[1].starts_with("›  2."));

        assert_eq!(formatter.format_list(std::iter::empty(), None), "No results");
    }

    #[test]
    fn test_scores_follow_plugin_column() {
        colored::control::set_override(false);
        let mut result = ResultItem::new("3").with_subtitle("1+2 = 3").with_score(300);
        result.plugin_id = "calculator".to_string();

        let plain = ResultFormatter::new().with_title_width(4);
        assert_eq!(plain.format_row(0, &result, false), "   1. 3     1+2 = 3  [calculator]");

        let scored = plain.with_scores(true);
        assert_eq!(
            scored.format_row(0, &result, false),
            "   1. 3     1+2 = 3  [calculator]  (300)"
        );
    }

    #[test]
    fn test_json_contains_views() {
        let result = ResultItem::new("3").with_subtitle("1+2 = 3").with_score(300);
        let json = ResultFormatter::new().format_json([&result]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["title"], "3");
        assert_eq!(value[0]["score"], 300);
    }
}
