//! Text analysis used at index and query time.
//!
//! ```text
//! Text → tokenize → normalized tokens → Stopper / Stemmer → terms
//! ```
//!
//! - [`tokenizer`]: Unicode word segmentation and normalization
//! - [`stopper`]: language stopword lists
//! - [`stemmer`]: the pluggable stemming hook
//! - [`cache`]: per-store memoization of stoppers and stemmers

pub mod cache;
pub mod stemmer;
pub mod stopper;
pub mod tokenizer;

pub use cache::LanguageCache;
pub use stemmer::Stemmer;
pub use stopper::{Stopper, WordListStopper};
pub use tokenizer::{Token, normalize, tokenize};
