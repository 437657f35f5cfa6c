//! Fuzzy matching and result filtering

pub mod fuzzy;

pub use fuzzy::{MatchResult, SearchPrecision, StringMatcher, SEARCH_PRECISION};

use crate::result::ResultItem;

/// Match with the default precision
pub fn fuzzy_match(query: &str, candidate: &str) -> MatchResult {
    StringMatcher::default().fuzzy_match(query, candidate)
}

/// Keep results whose title or subtitle meets search precision for `text`
///
/// Title highlights are replaced by the spans of the title match. An empty
/// `text` keeps everything unchanged.
pub fn filter_results(results: Vec<ResultItem>, text: &str) -> Vec<ResultItem> {
    if text.trim().is_empty() {
        return results;
    }

    let matcher = StringMatcher::default();
    results
        .into_iter()
        .filter_map(|mut result| {
            let title = matcher.fuzzy_match(text, &result.title);
            if title.is_search_precision_met() {
                result.title_highlights = title.highlights();
                return Some(result);
            }
            let subtitle = matcher.fuzzy_match(text, &result.subtitle);
            if subtitle.is_search_precision_met() {
                result.subtitle_highlights = subtitle.highlights();
                return Some(result);
            }
            None
        })
        .collect()
}
