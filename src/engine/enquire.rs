//! Search requests to the engine and their results.

use std::collections::{BTreeMap, HashMap};

use crate::engine::predicate::Predicate;

/// How matches are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Descending weight.
    #[default]
    Relevance,
    /// Ascending slot bytes; descending when `reverse`.
    Value { slot: u32, reverse: bool },
}

/// Direction used to break ties between equally ranked documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocIdOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enquire {
    pub query: Predicate,
    pub offset: usize,
    pub limit: usize,
    /// Minimum number of candidates to examine before estimating totals
    /// and facet counts.
    pub check_at_least: usize,
    pub sort: SortOrder,
    pub docid_order: DocIdOrder,
    /// Keep only the best match per distinct non-empty value of this slot.
    pub collapse_slot: Option<u32>,
    /// Slots to count values of across the match set.
    pub facet_slots: Vec<u32>,
}

impl Enquire {
    pub fn new(query: Predicate) -> Self {
        Self {
            query,
            offset: 0,
            limit: 10,
            check_at_least: 0,
            sort: SortOrder::Relevance,
            docid_order: DocIdOrder::Ascending,
            collapse_slot: None,
            facet_slots: Vec::new(),
        }
    }

    pub fn with_range(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_docid_order(mut self, order: DocIdOrder) -> Self {
        self.docid_order = order;
        self
    }

    pub fn with_collapse(mut self, slot: u32) -> Self {
        self.collapse_slot = Some(slot);
        self
    }

    pub fn with_facets(mut self, slots: Vec<u32>) -> Self {
        self.facet_slots = slots;
        self
    }

    pub fn with_check_at_least(mut self, check_at_least: usize) -> Self {
        self.check_at_least = check_at_least;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub doc_id: u32,
    pub weight: f64,
}

/// One page of matches with whole-result statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSet {
    pub matches: Vec<Match>,
    pub estimated_total: u64,
    /// Per facet slot, the number of matching documents for each raw value.
    pub facet_counts: HashMap<u32, BTreeMap<Vec<u8>, u64>>,
}

impl MatchSet {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }
}
