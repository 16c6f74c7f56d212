//! The index engine contract.
//!
//! Everything below the query-construction layer (postings, weighting,
//! persistence, transactions) sits behind [`IndexEngine`]. An engine opens
//! two kinds of handle:
//!
//! - a [`Writer`], which adds, replaces and deletes documents and owns
//!   transaction boundaries
//! - a [`Reader`], which runs queries and only sees what the writer has
//!   flushed or committed as of its last [`Reader::reopen`]
//!
//! [`memory::MemoryEngine`] is the bundled implementation.

pub mod enquire;
pub mod memory;
pub mod predicate;
pub mod weight;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::{Stemmer, Stopper};
use crate::error::Result;

pub use enquire::{DocIdOrder, Enquire, Match, MatchSet, SortOrder};
pub use predicate::Predicate;

/// How a writable handle treats an existing index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Open an existing index; fail if there is none.
    Open,
    /// Open an existing index or create an empty one.
    #[default]
    CreateOrOpen,
    /// Discard any existing index and start empty.
    CreateOrOverwrite,
}

/// Occurrences of one term in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub wdf: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<u32>,
}

/// A document in the engine's terms: weighted terms, value slots and an
/// opaque data blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineDocument {
    pub terms: BTreeMap<String, Posting>,
    pub values: BTreeMap<u32, Vec<u8>>,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl EngineDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term without position information.
    pub fn add_term(&mut self, term: impl Into<String>, wdf_inc: u32) {
        self.terms.entry(term.into()).or_default().wdf += wdf_inc;
    }

    /// Add a term occurrence at `position`.
    pub fn add_posting(&mut self, term: impl Into<String>, position: u32, wdf_inc: u32) {
        let posting = self.terms.entry(term.into()).or_default();
        posting.wdf += wdf_inc;
        if let Err(idx) = posting.positions.binary_search(&position) {
            posting.positions.insert(idx, position);
        }
    }

    /// Add a term that does not contribute to document length.
    pub fn add_boolean_term(&mut self, term: impl Into<String>) {
        self.terms.entry(term.into()).or_default();
    }

    pub fn add_value(&mut self, slot: u32, value: Vec<u8>) {
        self.values.insert(slot, value);
    }

    pub fn value(&self, slot: u32) -> Option<&[u8]> {
        self.values.get(&slot).map(|v| v.as_slice())
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    /// Terms in ascending order.
    pub fn term_list(&self) -> Vec<String> {
        self.terms.keys().cloned().collect()
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// Sum of within-document frequencies.
    pub fn length(&self) -> u64 {
        self.terms.values().map(|p| p.wdf as u64).sum()
    }
}

/// Read access to an index.
pub trait Reader: Send + Sync {
    fn doc_count(&self) -> Result<u64>;

    /// Fails with `DocNotFound` if no document has this id.
    fn document(&self, id: u32) -> Result<EngineDocument>;

    /// Terms of a document in ascending order.
    fn term_list(&self, id: u32) -> Result<Vec<String>>;

    /// Number of documents containing `term`.
    fn term_freq(&self, term: &str) -> Result<u64>;

    /// Indexed terms starting with `prefix`, in ascending order.
    fn terms_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    fn synonyms(&self, term: &str) -> Result<Vec<String>>;

    fn spelling_suggestion(&self, word: &str) -> Result<Option<String>>;

    fn run_query(&self, enquire: &Enquire) -> Result<MatchSet>;

    /// Bring the handle up to date with the latest flushed state.
    fn reopen(&mut self) -> Result<()>;
}

/// Write access to an index.
///
/// Changes are visible to [`Reader`]s opened separately only after
/// [`Writer::flush`] or [`Writer::commit_transaction`].
pub trait Writer: Reader {
    fn add_document(&mut self, document: EngineDocument) -> Result<u32>;

    /// Store `document` under `id`, replacing any document already there.
    fn replace_document(&mut self, id: u32, document: EngineDocument) -> Result<()>;

    /// Fails with `DocNotFound` if no document has this id.
    fn delete_document(&mut self, id: u32) -> Result<()>;

    fn add_synonym(&mut self, term: &str, synonym: &str) -> Result<()>;

    fn add_spelling(&mut self, word: &str, freq_inc: u64) -> Result<()>;

    fn begin_transaction(&mut self) -> Result<()>;

    fn commit_transaction(&mut self) -> Result<()>;

    fn cancel_transaction(&mut self) -> Result<()>;

    fn in_transaction(&self) -> bool;

    fn flush(&mut self) -> Result<()>;

    /// A reader sharing this writer's live state, for engines where read
    /// and write handles are the same index (in-memory indexes).
    fn shared_reader(&self) -> Option<Box<dyn Reader>>;
}

/// Opens index handles and supplies language components.
pub trait IndexEngine: Send + Sync {
    fn open_read_write(&self, path: Option<&Path>, mode: OpenMode) -> Result<Box<dyn Writer>>;

    fn open_read_only(&self, path: &Path) -> Result<Box<dyn Reader>>;

    /// Fails with `UnsupportedLanguage` when no stopword data exists.
    fn stopper(&self, language: &str) -> Result<Arc<dyn Stopper>>;

    /// `Ok(None)` for a supported language without a stemmer.
    fn stemmer(&self, language: &str) -> Result<Option<Arc<dyn Stemmer>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_terms() {
        let mut doc = EngineDocument::new();
        doc.add_posting("cow", 0, 1);
        doc.add_posting("cow", 2, 1);
        doc.add_term("XSTATUSactive", 1);
        doc.add_boolean_term("XTAGred");

        assert_eq!(doc.terms["cow"].wdf, 2);
        assert_eq!(doc.terms["cow"].positions, vec![0, 2]);
        assert_eq!(doc.length(), 3);
        assert_eq!(doc.term_list(), vec!["XSTATUSactive", "XTAGred", "cow"]);
    }
}
