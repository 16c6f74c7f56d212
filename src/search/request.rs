use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::FieldValue;
use crate::query::{DefaultOp, QueryFlags, StemStrategy};

/// What to match.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    /// A free-text query string.
    Text(String),
    /// Every document.
    MatchAll,
    /// No document.
    MatchNone,
}

impl From<&str> for SearchQuery {
    fn from(text: &str) -> Self {
        SearchQuery::Text(text.to_string())
    }
}

impl From<String> for SearchQuery {
    fn from(text: String) -> Self {
        SearchQuery::Text(text)
    }
}

/// Result ordering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// Descending relevance weight.
    #[default]
    Relevance,
    /// Document id.
    Id,
    /// Value of a field.
    Field(String),
}

impl From<&str> for Order {
    /// `"id"` orders by id; anything else names a field.
    fn from(name: &str) -> Self {
        match name {
            "id" => Order::Id,
            name => Order::Field(name.to_string()),
        }
    }
}

/// How many candidate matches the engine must examine before estimating
/// totals and facet counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckAtLeast {
    Count(usize),
    /// Every document in the index.
    All,
}

impl Default for CheckAtLeast {
    fn default() -> Self {
        CheckAtLeast::Count(0)
    }
}

/// A search request.
///
/// Options left as `None` take the store's
/// [`SearchDefaults`](crate::store::SearchDefaults).
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: SearchQuery,
    pub fields: Option<Vec<String>>,
    pub default_op: Option<DefaultOp>,
    pub flags: Option<QueryFlags>,
    pub stem_strategy: Option<StemStrategy>,
    pub spelling: Option<bool>,
    /// Filter values per field; see [`build_filter`](crate::query::build_filter).
    pub filters: BTreeMap<String, Vec<FieldValue>>,
    pub facets: Vec<String>,
    /// 1-based page number.
    pub page: u32,
    pub per_page: Option<u32>,
    pub order: Order,
    pub reverse: bool,
    /// Return one match per distinct value of this field.
    pub collapse: Option<String>,
    pub check_at_least: CheckAtLeast,
}

impl SearchRequest {
    pub fn new(query: impl Into<SearchQuery>) -> Self {
        Self {
            query: query.into(),
            fields: None,
            default_op: None,
            flags: None,
            stem_strategy: None,
            spelling: None,
            filters: BTreeMap::new(),
            facets: Vec::new(),
            page: 1,
            per_page: None,
            order: Order::default(),
            reverse: false,
            collapse: None,
            check_at_least: CheckAtLeast::default(),
        }
    }

    pub fn builder(query: impl Into<SearchQuery>) -> SearchRequestBuilder {
        SearchRequestBuilder {
            request: SearchRequest::new(query),
        }
    }
}

impl From<&str> for SearchRequest {
    fn from(text: &str) -> Self {
        SearchRequest::new(text)
    }
}

impl From<SearchQuery> for SearchRequest {
    fn from(query: SearchQuery) -> Self {
        SearchRequest::new(query)
    }
}

pub struct SearchRequestBuilder {
    request: SearchRequest,
}

impl SearchRequestBuilder {
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn default_op(mut self, op: DefaultOp) -> Self {
        self.request.default_op = Some(op);
        self
    }

    pub fn flags(mut self, flags: QueryFlags) -> Self {
        self.request.flags = Some(flags);
        self
    }

    pub fn stem_strategy(mut self, strategy: StemStrategy) -> Self {
        self.request.stem_strategy = Some(strategy);
        self
    }

    pub fn spelling(mut self, spelling: bool) -> Self {
        self.request.spelling = Some(spelling);
        self
    }

    /// Add one accepted value for a field filter.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.request
            .filters
            .entry(field.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn facet(mut self, field: impl Into<String>) -> Self {
        self.request.facets.push(field.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.request.page = page;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.request.per_page = Some(per_page);
        self
    }

    pub fn order(mut self, order: impl Into<Order>) -> Self {
        self.request.order = order.into();
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.request.reverse = reverse;
        self
    }

    pub fn collapse(mut self, field: impl Into<String>) -> Self {
        self.request.collapse = Some(field.into());
        self
    }

    pub fn check_at_least(mut self, check: CheckAtLeast) -> Self {
        self.request.check_at_least = check;
        self
    }

    pub fn build(self) -> SearchRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_from_name() {
        assert_eq!(Order::from("id"), Order::Id);
        assert_eq!(Order::from("age"), Order::Field("age".to_string()));
    }

    #[test]
    fn test_builder() {
        let request = SearchRequest::builder("cow")
            .filter("age", "30..40")
            .filter("age", 50)
            .facet("age")
            .page(3)
            .order("id")
            .reverse(true)
            .build();
        assert_eq!(request.query, SearchQuery::Text("cow".to_string()));
        assert_eq!(request.filters["age"].len(), 2);
        assert_eq!(request.page, 3);
        assert_eq!(request.per_page, None);
        assert_eq!(request.order, Order::Id);
        assert!(request.reverse);
        assert_eq!(request.check_at_least, CheckAtLeast::Count(0));
    }
}
