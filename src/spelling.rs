//! Spelling dictionary.
//!
//! Words seen while indexing are counted; a suggestion for an unknown word
//! is the most frequent dictionary word within two edits of it, ties going
//! to the closer and then the alphabetically smaller word.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::util::levenshtein::distance_within;

/// Maximum edit distance for a suggestion.
pub const MAX_EDIT_DISTANCE: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpellingDictionary {
    words: BTreeMap<String, u64>,
}

impl SpellingDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_word(&mut self, word: &str, freq: u64) {
        if word.is_empty() {
            return;
        }
        *self.words.entry(word.to_string()).or_insert(0) += freq;
    }

    pub fn frequency(&self, word: &str) -> u64 {
        self.words.get(word).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Best correction for `word`, or `None` if it is already known or
    /// nothing is close enough.
    pub fn suggest(&self, word: &str) -> Option<String> {
        if word.chars().count() < 2 || self.words.contains_key(word) {
            return None;
        }

        self.words
            .iter()
            .filter_map(|(candidate, freq)| {
                distance_within(word, candidate, MAX_EDIT_DISTANCE)
                    .map(|d| (d, std::cmp::Reverse(*freq), candidate))
            })
            .min()
            .map(|(_, _, candidate)| candidate.clone())
    }
}
