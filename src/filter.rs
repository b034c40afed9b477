//! Bad-word filter
//!
//! Masks forbidden substrings in outgoing text with `*` runs.
//! Loaded once at server startup and shared for the server's lifetime;
//! `filter` itself is a pure function of its inputs.

use std::fs;
use std::io;
use std::path::Path;

/// Ordered list of forbidden terms
///
/// Matching is case-insensitive and substring-based (no word boundaries).
/// Each term is applied in list order; a match is replaced by a `*` run of
/// the same length as the matched term.
#[derive(Debug, Clone)]
pub struct WordFilter {
    words: Vec<String>,
}

impl WordFilter {
    /// Build a filter from an explicit word list
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    /// Load a filter from a file with one forbidden term per line
    ///
    /// Blank lines are skipped. Fails when the file is unreadable, which the
    /// server treats as a fatal startup configuration error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Parse a bad-word list from newline-separated text
    pub fn parse(content: &str) -> Self {
        let words = content
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { words }
    }

    /// Number of loaded terms
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the filter has no terms
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Mask every occurrence of every forbidden term in `text`
    pub fn filter(&self, text: &str) -> String {
        let mut chars: Vec<char> = text.chars().collect();
        for word in &self.words {
            mask_occurrences(&mut chars, word);
        }
        chars.into_iter().collect()
    }
}

/// Replace every case-insensitive occurrence of `word` in `chars` with `*`s
fn mask_occurrences(chars: &mut [char], word: &str) {
    let needle: Vec<char> = word.chars().collect();
    if needle.is_empty() || needle.len() > chars.len() {
        return;
    }
    let mut i = 0;
    while i + needle.len() <= chars.len() {
        let matched = chars[i..i + needle.len()]
            .iter()
            .zip(&needle)
            .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()));
        if matched {
            for c in &mut chars[i..i + needle.len()] {
                *c = '*';
            }
            i += needle.len();
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_of(words: &[&str]) -> WordFilter {
        WordFilter::new(words.iter().map(|w| w.to_string()).collect())
    }

    #[test]
    fn test_filter_masks_exact_length() {
        let f = filter_of(&["spam"]);
        assert_eq!(f.filter("buy spam today"), "buy **** today");
    }

    #[test]
    fn test_filter_case_insensitive() {
        let f = filter_of(&["spam"]);
        assert_eq!(f.filter("SPAM Spam sPaM"), "**** **** ****");
    }

    #[test]
    fn test_filter_substring_not_word_boundary() {
        let f = filter_of(&["ass"]);
        assert_eq!(f.filter("classic"), "cl***ic");
    }

    #[test]
    fn test_filter_multiple_words_in_order() {
        let f = filter_of(&["foo", "bar"]);
        assert_eq!(f.filter("foo bar foobar"), "*** *** ******");
    }

    #[test]
    fn test_filter_idempotent_on_masked_text() {
        let f = filter_of(&["spam", "junk"]);
        let once = f.filter("spam and JUNK mail");
        let twice = f.filter(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_no_match_unchanged() {
        let f = filter_of(&["spam"]);
        assert_eq!(f.filter("perfectly clean"), "perfectly clean");
    }

    #[test]
    fn test_filter_empty_list_unchanged() {
        let f = filter_of(&[]);
        assert!(f.is_empty());
        assert_eq!(f.filter("anything at all"), "anything at all");
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let f = WordFilter::parse("spam\n\njunk\r\n\n");
        assert_eq!(f.len(), 2);
        assert_eq!(f.filter("spam junk"), "**** ****");
    }
}
