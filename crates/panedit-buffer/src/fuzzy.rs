//! Fuzzy line matching.
//!
//! Matching is case-insensitive and works on grapheme columns, so the
//! highlight spans line up with cursor columns. A contiguous substring
//! always wins; a skim-style subsequence match is the fallback.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::BufferItem;

const SUBSTRING_BONUS: i64 = 1_000;
const PREFIX_BONUS: i64 = 100;

/// Highlighted columns within one line (end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyMatch {
    /// Line index in the buffer
    pub line: usize,
    /// Highlighted spans, left to right
    pub spans: Vec<MatchSpan>,
    /// Higher is better
    pub score: i64,
}

/// Knobs for [`match_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Accept scattered (subsequence) matches
    pub subsequence: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self { subsequence: true }
    }
}

fn matcher() -> SkimMatcherV2 {
    SkimMatcherV2::default().ignore_case()
}

/// Matches `query` against `text`, returning a score and spans.
///
/// An empty query matches nothing.
pub fn match_text(query: &str, text: &str, options: MatchOptions) -> Option<(i64, Vec<MatchSpan>)> {
    match_with(&matcher(), query, text, options)
}

fn match_with(
    matcher: &SkimMatcherV2,
    query: &str,
    text: &str,
    options: MatchOptions,
) -> Option<(i64, Vec<MatchSpan>)> {
    let needle: Vec<String> = query.graphemes(true).map(str::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }
    let hay: Vec<String> = text.graphemes(true).map(str::to_lowercase).collect();
    if needle.len() > hay.len() {
        return None;
    }

    if let Some(start) = hay
        .windows(needle.len())
        .position(|window| window == needle.as_slice())
    {
        let mut score = SUBSTRING_BONUS - start as i64;
        if start == 0 {
            score += PREFIX_BONUS;
        }
        let span = MatchSpan {
            start,
            end: start + needle.len(),
        };
        return Some((score, vec![span]));
    }

    if !options.subsequence {
        return None;
    }

    let (score, indices) = matcher.fuzzy_indices(text, query)?;
    Some((score.min(SUBSTRING_BONUS - 1), char_spans(text, &indices)))
}

/// Turns matched char indices into runs of grapheme columns.
fn char_spans(text: &str, indices: &[usize]) -> Vec<MatchSpan> {
    let columns: Vec<usize> = text
        .graphemes(true)
        .enumerate()
        .flat_map(|(column, grapheme)| std::iter::repeat_n(column, grapheme.chars().count()))
        .collect();

    let mut spans: Vec<MatchSpan> = Vec::new();
    for column in indices.iter().filter_map(|&i| columns.get(i).copied()) {
        match spans.last_mut() {
            Some(span) if column < span.end => {}
            Some(span) if span.end == column => span.end += 1,
            _ => spans.push(MatchSpan {
                start: column,
                end: column + 1,
            }),
        }
    }
    spans
}

/// Matches `query` against every line, in line order.
pub fn match_items(query: &str, items: &[BufferItem], options: MatchOptions) -> Vec<FuzzyMatch> {
    if query.is_empty() {
        return Vec::new();
    }
    let matcher = matcher();
    items
        .iter()
        .enumerate()
        .filter_map(|(line, item)| {
            match_with(&matcher, query, item.text(), options).map(|(score, spans)| FuzzyMatch {
                line,
                spans,
                score,
            })
        })
        .collect()
}

/// Query, matches and the match the user last jumped to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzyState {
    query: String,
    matches: Vec<FuzzyMatch>,
    cycle_index: Option<usize>,
}

impl FuzzyState {
    /// Creates an inactive state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current query.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Matches in line order.
    pub fn matches(&self) -> &[FuzzyMatch] {
        &self.matches
    }

    /// Index into [`matches`](Self::matches) of the current match.
    pub fn cycle_index(&self) -> Option<usize> {
        self.cycle_index
    }

    /// Returns true while a query is set.
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// The match the user last jumped to.
    pub fn current(&self) -> Option<&FuzzyMatch> {
        self.cycle_index.and_then(|i| self.matches.get(i))
    }

    /// The match on a given line, if any.
    pub fn match_on(&self, line: usize) -> Option<&FuzzyMatch> {
        self.matches
            .binary_search_by_key(&line, |m| m.line)
            .ok()
            .map(|i| &self.matches[i])
    }

    /// Replaces the query and recomputes matches.
    pub fn set_query(&mut self, query: impl Into<String>, items: &[BufferItem], options: MatchOptions) {
        self.query = query.into();
        self.cycle_index = None;
        self.refresh(items, options);
    }

    /// Recomputes matches after the lines changed.
    pub fn refresh(&mut self, items: &[BufferItem], options: MatchOptions) {
        self.matches = match_items(&self.query, items, options);
        let len = self.matches.len();
        self.cycle_index = self.cycle_index.filter(|&i| i < len);
    }

    /// Clears query and matches.
    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.cycle_index = None;
    }

    /// Index of the `count`-th match below `line`, wrapping around.
    pub fn index_after(&self, line: usize, count: usize) -> Option<usize> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        let first = self.matches.iter().position(|m| m.line > line).unwrap_or(0);
        Some((first + count.max(1) - 1) % len)
    }

    /// Index of the `count`-th match above `line`, wrapping around.
    pub fn index_before(&self, line: usize, count: usize) -> Option<usize> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        let first = self
            .matches
            .iter()
            .rposition(|m| m.line < line)
            .unwrap_or(len - 1);
        Some((first + len - (count.max(1) - 1) % len) % len)
    }

    /// Marks a match as current and returns its line.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        let line = self.matches.get(index)?.line;
        self.cycle_index = Some(index);
        Some(line)
    }
}
