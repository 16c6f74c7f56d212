//! Stemming hook.
//!
//! No stemming algorithm ships with the crate. Engines hand out stemmers
//! per language and callers may register their own; any
//! `Fn(&str) -> String` is a stemmer.

/// Reduces a normalized word to its stem.
pub trait Stemmer: Send + Sync {
    fn stem(&self, word: &str) -> String;
}

impl<F> Stemmer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn stem(&self, word: &str) -> String {
        self(word)
    }
}

/// Term written for a stemmed word: `"Z" + prefix + stem`.
pub fn stemmed_term(prefix: &str, stem: &str) -> String {
    format!("Z{prefix}{stem}")
}
