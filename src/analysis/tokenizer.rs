use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// A normalized word and its position within the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub position: u32,
}

/// NFKC-normalize and lowercase a word.
pub fn normalize(word: &str) -> String {
    word.nfkc().collect::<String>().to_lowercase()
}

/// Split text into words on Unicode word boundaries (UAX #29).
///
/// Positions count from `start`, so consecutive fragments of one field can
/// continue where the previous fragment stopped.
pub fn tokenize_from(text: &str, start: u32) -> Vec<Token> {
    text.unicode_words()
        .map(normalize)
        .filter(|w| !w.is_empty())
        .enumerate()
        .map(|(i, text)| Token {
            text,
            position: start + i as u32,
        })
        .collect()
}

pub fn tokenize(text: &str) -> Vec<Token> {
    tokenize_from(text, 0)
}
