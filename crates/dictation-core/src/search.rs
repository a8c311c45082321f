//! Text search helpers.
//!
//! All public inputs/outputs are **character offsets** (not byte offsets). Both helpers
//! only look at the text left of a limit (the selection start), and both return the **last**
//! match found there:
//!
//! - [`find_last_before`]: case-insensitive literal search; overlapping occurrences count,
//!   so the result is the rightmost start position.
//! - [`find_last_regex_before`]: regex search that prefers the span of the first capturing
//!   group over the whole match.

use regex::{Regex, RegexBuilder};

/// A match returned by the search APIs, expressed as a half-open character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Inclusive start character offset.
    pub start: usize,
    /// Exclusive end character offset.
    pub end: usize,
}

impl SearchMatch {
    /// Returns the length of the match in characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the match is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug)]
pub(crate) struct CharIndex {
    char_to_byte: Vec<usize>,
    text_len: usize,
}

impl CharIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(text.len());
        Self {
            char_to_byte,
            text_len: text.len(),
        }
    }

    pub(crate) fn char_count(&self) -> usize {
        self.char_to_byte.len().saturating_sub(1)
    }

    pub(crate) fn char_to_byte(&self, char_offset: usize) -> usize {
        let clamped = char_offset.min(self.char_count());
        self.char_to_byte
            .get(clamped)
            .cloned()
            .unwrap_or(self.text_len)
    }

    pub(crate) fn byte_to_char(&self, byte_offset: usize) -> usize {
        let clamped = byte_offset.min(self.text_len);
        match self.char_to_byte.binary_search(&clamped) {
            Ok(idx) => idx,
            Err(idx) => idx,
        }
    }
}

/// Find the last case-insensitive occurrence of `query` that ends at or before `limit_char`.
///
/// Returns `Ok(None)` if there is no such occurrence or if `query` is empty.
pub fn find_last_before(
    text: &str,
    query: &str,
    limit_char: usize,
) -> Result<Option<SearchMatch>, regex::Error> {
    if query.is_empty() {
        return Ok(None);
    }

    let re = RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()?;
    let index = CharIndex::new(text);
    let haystack = &text[..index.char_to_byte(limit_char)];

    let mut last: Option<SearchMatch> = None;
    let mut from_char = 0;
    while let Some(m) = re.find_at(haystack, index.char_to_byte(from_char)) {
        let start = index.byte_to_char(m.start());
        last = Some(SearchMatch {
            start,
            end: index.byte_to_char(m.end()),
        });
        from_char = start + 1;
        if from_char > index.char_count() {
            break;
        }
    }

    Ok(last)
}

/// Find the last match of `re` in the text left of `limit_char`.
///
/// If the pattern has capturing groups and the first group took part in the match, the
/// group's span is returned (it may be empty); otherwise the span of the whole match.
pub fn find_last_regex_before(text: &str, re: &Regex, limit_char: usize) -> Option<SearchMatch> {
    let index = CharIndex::new(text);
    let haystack = &text[..index.char_to_byte(limit_char)];

    re.captures_iter(haystack).last().and_then(|caps| {
        let m = caps.get(1).or_else(|| caps.get(0))?;
        Some(SearchMatch {
            start: index.byte_to_char(m.start()),
            end: index.byte_to_char(m.end()),
        })
    })
}
