//! Query keyword extraction.
//!
//! Turns free text into the ordered, deduplicated set of content-bearing
//! tokens used by the lexical candidate filter. Stopword lists for English
//! and Russian are compiled in from `assets/`.

use std::collections::HashSet;

const STOPWORDS_EN: &str = include_str!("../assets/stopwords_en.txt");
const STOPWORDS_RU: &str = include_str!("../assets/stopwords_ru.txt");

pub const DEFAULT_MIN_LEN: usize = 3;

/// Stateless apart from its stopword set; cheap to clone and share.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    stopwords: HashSet<String>,
    min_len: usize,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_LEN)
    }
}

impl KeywordExtractor {
    pub fn new(min_len: usize) -> Self {
        let stopwords = [STOPWORDS_EN, STOPWORDS_RU]
            .iter()
            .flat_map(|list| list.lines())
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .collect();
        Self { stopwords, min_len }
    }

    pub fn with_extra_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stopwords
            .extend(words.into_iter().map(|w| w.as_ref().trim().to_lowercase()));
        self
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Extract keywords from `text`.
    ///
    /// Tokens are lowercased and split on anything that is not alphanumeric,
    /// `_` or `-` (so `fw_ctl` and `cpstat-os` stay whole). Stopwords and
    /// tokens shorter than `min_len` characters are dropped. The first
    /// occurrence of each token decides its position.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();

        for raw in text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-')) {
            let token = raw.trim_matches(|c| c == '_' || c == '-').to_lowercase();
            if token.chars().count() < self.min_len || self.is_stopword(&token) {
                continue;
            }
            if seen.insert(token.clone()) {
                keywords.push(token);
            }
        }

        keywords
    }
}

/// Extract keywords with the built-in stopword lists.
pub fn extract_keywords(text: &str, min_len: usize) -> Vec<String> {
    KeywordExtractor::new(min_len).extract(text)
}
