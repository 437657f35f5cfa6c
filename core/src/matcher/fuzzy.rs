//! Substring-sequence fuzzy matching used for ranking and filtering

use crate::result::HighlightSpan;

/// Score a match must reach to be kept in filtered lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SearchPrecision {
    None = 0,
    Low = 20,
    Regular = 50,
}

impl SearchPrecision {
    pub fn threshold(self) -> i64 {
        self as i64
    }
}

/// Precision used by every matcher in the core
pub const SEARCH_PRECISION: SearchPrecision = SearchPrecision::Regular;

/// Outcome of matching a query against a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub success: bool,
    /// Score before the precision threshold is applied
    pub raw_score: i64,
    /// Matched character positions in the candidate, ascending
    pub matched_indices: Vec<usize>,
    precision: SearchPrecision,
}

impl MatchResult {
    fn failed(precision: SearchPrecision) -> Self {
        Self {
            success: false,
            raw_score: 0,
            matched_indices: Vec::new(),
            precision,
        }
    }

    pub fn is_search_precision_met(&self) -> bool {
        self.success && self.raw_score >= self.precision.threshold()
    }

    /// Raw score when precision is met, otherwise zero
    pub fn score(&self) -> i64 {
        if self.is_search_precision_met() {
            self.raw_score
        } else {
            0
        }
    }

    pub fn highlights(&self) -> Vec<HighlightSpan> {
        HighlightSpan::from_indices(&self.matched_indices)
    }
}

/// Fuzzy matcher with a fixed precision
#[derive(Debug, Clone, Copy)]
pub struct StringMatcher {
    precision: SearchPrecision,
}

impl Default for StringMatcher {
    fn default() -> Self {
        Self {
            precision: SEARCH_PRECISION,
        }
    }
}

impl StringMatcher {
    pub fn new(precision: SearchPrecision) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> SearchPrecision {
        self.precision
    }

    /// Match `query` against `candidate`, case-insensitively
    ///
    /// Query words are matched in order. A word whose first characters were
    /// matched loosely is re-anchored when a contiguous occurrence appears
    /// later, so "chr" against "Google Chrome" highlights "Chr".
    pub fn fuzzy_match(&self, query: &str, candidate: &str) -> MatchResult {
        let query = query.trim();
        if query.is_empty() || candidate.is_empty() {
            return MatchResult::failed(self.precision);
        }

        let query: Vec<char> = query.to_lowercase().chars().collect();
        let (compare, origin) = lowercase_with_origin(candidate);

        let words: Vec<&[char]> = query
            .split(|c| c.is_whitespace())
            .filter(|w| !w.is_empty())
            .collect();

        let mut word_index = 0;
        let mut word = words[0];
        let mut char_index = 0;

        let mut first_match: Option<usize> = None;
        let mut first_match_in_word = 0;
        let mut last_match = 0;
        let mut all_matched = false;
        let mut previous_contiguous = false;
        let mut all_contiguous = true;
        let mut indices: Vec<usize> = Vec::new();

        for (position, &c) in compare.iter().enumerate() {
            if c != word[char_index] {
                previous_contiguous = false;
                continue;
            }

            if first_match.is_none() {
                first_match = Some(position);
            }

            if char_index == 0 {
                previous_contiguous = true;
                first_match_in_word = position;
            } else if !previous_contiguous {
                let start = position - char_index;
                if compare[start..position] == word[..char_index] {
                    previous_contiguous = true;
                    if word_index == 0 {
                        first_match = Some(start);
                    }
                    let word_start = origin[first_match_in_word];
                    indices.retain(|&i| i < word_start);
                    indices.extend(origin[start..position].iter().copied());
                }
            }

            last_match = position + 1;
            indices.push(origin[position]);
            char_index += 1;

            if char_index == word.len() {
                all_contiguous = previous_contiguous && all_contiguous;
                word_index += 1;
                all_matched = word_index >= words.len();
                if all_matched {
                    break;
                }
                word = words[word_index];
                char_index = 0;
            }
        }

        let Some(first) = first_match.filter(|_| all_matched) else {
            return MatchResult::failed(self.precision);
        };

        indices.sort_unstable();
        indices.dedup();

        MatchResult {
            success: true,
            raw_score: calculate_score(&query, &compare, first, last_match - first, all_contiguous),
            matched_indices: indices,
            precision: self.precision,
        }
    }

    pub fn is_match(&self, query: &str, candidate: &str) -> bool {
        self.fuzzy_match(query, candidate).is_search_precision_met()
    }
}

/// Lowercased characters plus the index of the source character each came from
fn lowercase_with_origin(candidate: &str) -> (Vec<char>, Vec<usize>) {
    let mut compare = Vec::with_capacity(candidate.len());
    let mut origin = Vec::with_capacity(candidate.len());
    for (index, c) in candidate.chars().enumerate() {
        for lower in c.to_lowercase() {
            compare.push(lower);
            origin.push(index);
        }
    }
    (compare, origin)
}

fn calculate_score(
    query: &[char],
    compare: &[char],
    first_index: usize,
    match_len: usize,
    all_contiguous: bool,
) -> i64 {
    let query_len = query.len() as i64;
    let mut score =
        100 * (query_len + 1) / ((1 + first_index as i64) + (match_len as i64 + 1));

    // Shorter candidates that differ little from the query rank higher
    let length_gap = compare.len() as i64 - query_len;
    if length_gap < 5 {
        score += 20;
    } else if length_gap < 10 {
        score += 10;
    }

    if all_contiguous {
        let meaningful = query.iter().filter(|c| !c.is_whitespace()).count() as i64;
        let factor = if meaningful < 4 { 10 } else { 5 };
        score += factor * meaningful;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> StringMatcher {
        StringMatcher::default()
    }

    #[test]
    fn test_prefix_match_score() {
        let result = matcher().fuzzy_match("chr", "Chrome");
        assert!(result.success);
        assert_eq!(result.raw_score, 130);
        assert_eq!(result.highlights(), vec![HighlightSpan::new(0, 3)]);
    }

    #[test]
    fn test_word_in_middle() {
        let result = matcher().fuzzy_match("chr", "Google Chrome");
        assert_eq!(result.raw_score, 63);
        assert_eq!(result.matched_indices, vec![7, 8, 9]);
        assert!(result.is_search_precision_met());
    }

    #[test]
    fn test_scattered_match_has_no_contiguity_bonus() {
        let result = matcher().fuzzy_match("cm", "chrome");
        assert!(result.success);
        assert_eq!(result.raw_score, 62);
        assert_eq!(result.matched_indices, vec![0, 4]);
    }

    #[test]
    fn test_backtracking_reanchors_word() {
        // 'c' at 0 is matched loosely, "co" then appears contiguously at 2
        let result = matcher().fuzzy_match("co", "cxco");
        assert!(result.success);
        assert_eq!(result.highlights(), vec![HighlightSpan::new(2, 4)]);
    }

    #[test]
    fn test_multiple_words_in_order() {
        let result = matcher().fuzzy_match("vis code", "Visual Studio Code");
        assert!(result.success);
        assert_eq!(
            result.highlights(),
            vec![HighlightSpan::new(0, 3), HighlightSpan::new(14, 18)]
        );
    }

    #[test]
    fn test_no_match() {
        assert!(!matcher().fuzzy_match("xyz", "Chrome").success);
        assert!(!matcher().fuzzy_match("", "Chrome").success);
        assert!(!matcher().fuzzy_match("chr", "").success);
        assert_eq!(matcher().fuzzy_match("xyz", "Chrome").score(), 0);
    }

    #[test]
    fn test_precision_threshold() {
        let candidate = "zzzzzzzzzzzzzzzzzzzz a e";
        let result = StringMatcher::new(SearchPrecision::Regular).fuzzy_match("ae", candidate);
        assert!(result.success);
        assert!(result.raw_score < SearchPrecision::Regular.threshold());
        assert!(!result.is_search_precision_met());

        let lenient = StringMatcher::new(SearchPrecision::None).fuzzy_match("ae", candidate);
        assert!(lenient.is_search_precision_met());
    }

    #[test]
    fn test_deterministic() {
        let a = matcher().fuzzy_match("sett", "Settings Panel");
        let b = matcher().fuzzy_match("sett", "Settings Panel");
        assert_eq!(a, b);
    }
}
