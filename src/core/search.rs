//! Cross-file search over a corpus of diff texts.
//!
//! The index is rebuilt from scratch on every term or corpus change rather
//! than patched incrementally: a rebuild always sees the corpus that existed
//! at the moment of invocation, so a background refresh replacing diff text
//! mid-search can only produce a stale result set, never a torn one.

use crate::core::parse_diff_lines;

/// Direction for cursor movement through search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    /// Towards higher global indices, wrapping past the last result.
    Forward,
    /// Towards lower global indices, wrapping before the first result.
    Backward,
}

/// One substring occurrence within the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Position of the owning diff within the corpus snapshot.
    pub file_index: usize,
    /// Index into that file's parsed line sequence.
    pub line_index: usize,
    /// Ordinal of the occurrence within its line, left to right, 0-based.
    pub match_index: usize,
    /// Ordinal across the entire corpus: files in corpus order, lines in
    /// sequence order, occurrences left to right. The only ordering key that
    /// is meaningful to retain across a rebuild.
    pub global_index: usize,
    /// Matched line's content, for display.
    pub content: String,
    /// Owning diff's name, for display.
    pub file_name: String,
}

/// Flat, globally ordered search matches with a navigation cursor.
#[derive(Debug, Default)]
pub struct SearchIndex {
    term: String,
    results: Vec<SearchResult>,
    current: Option<usize>,
}

impl SearchIndex {
    /// An empty index with no term.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index for `term` over `corpus`, an ordered sequence of
    /// `(file_name, diff_text)` pairs whose order defines `file_index`.
    ///
    /// Matching is case-insensitive, non-overlapping substring. A blank term
    /// clears the index. A term change resets the cursor to the first result
    /// (the active navigation target); a corpus-only rebuild with the same
    /// term keeps the cursor when it is still within bounds.
    pub fn rebuild<'a, I>(&mut self, term: &str, corpus: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let _timer = crate::metrics::Timer::start("search_rebuild");

        let term_changed = self.term != term;
        self.term = term.to_string();

        if term.trim().is_empty() {
            self.results.clear();
            self.current = None;
            return;
        }

        let needle = term.to_lowercase();
        let mut results = Vec::new();
        let mut global_index = 0;

        for (file_index, (file_name, diff_text)) in corpus.into_iter().enumerate() {
            // Always a fresh parse: the index never assumes a cached
            // sequence still matches the corpus text.
            for (line_index, line) in parse_diff_lines(diff_text).iter().enumerate() {
                let haystack = line.content.to_lowercase();
                let mut cursor = 0;
                let mut match_index = 0;
                while let Some(found) = haystack[cursor..].find(&needle) {
                    results.push(SearchResult {
                        file_index,
                        line_index,
                        match_index,
                        global_index,
                        content: line.content.clone(),
                        file_name: file_name.to_string(),
                    });
                    global_index += 1;
                    match_index += 1;
                    // Skip the matched span entirely; matches never overlap.
                    cursor += found + needle.len();
                }
            }
        }

        self.results = results;
        self.current = if self.results.is_empty() {
            None
        } else if term_changed {
            Some(0)
        } else {
            match self.current {
                Some(i) if i < self.results.len() => Some(i),
                _ => Some(0),
            }
        };
    }

    /// Move the cursor one result in `direction`, wrapping circularly.
    /// With zero results this is a no-op returning None.
    pub fn advance(&mut self, direction: SearchDirection) -> Option<&SearchResult> {
        if self.results.is_empty() {
            return None;
        }
        let len = self.results.len();
        let current = self.current.unwrap_or(0);
        let next = match direction {
            SearchDirection::Forward => match self.current {
                None => 0,
                Some(i) => (i + 1) % len,
            },
            SearchDirection::Backward => {
                if current == 0 {
                    len - 1
                } else {
                    current - 1
                }
            }
        };
        self.current = Some(next);
        self.results.get(next)
    }

    /// The cursor's position among the results, when any result is active.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Total number of matches in the current snapshot.
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// The result under the cursor.
    #[must_use]
    pub fn active(&self) -> Option<&SearchResult> {
        self.current.and_then(|i| self.results.get(i))
    }

    /// All results in global order.
    #[must_use]
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    /// The term the index was last rebuilt for.
    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }
}
