//! Search orchestration.
//!
//! A [`Searcher`] turns a [`SearchRequest`] into an engine [`Enquire`]:
//! the parsed query, restricted by any filters, with paging, ordering,
//! collapsing and facets applied. It then decodes the engine's match set
//! into a [`ResultPage`].

pub mod request;
pub mod result;

use std::collections::HashMap;
use std::sync::Arc;

use crate::analysis::{Stemmer, Stopper};
use crate::codec::{self, ID_ORDER_SLOT};
use crate::data::FieldValue;
use crate::document::Document;
use crate::engine::{DocIdOrder, Enquire, MatchSet, Predicate, Reader, SortOrder};
use crate::error::Result;
use crate::query::{ParsedQuery, QueryFlags, QueryParser, build_filter};
use crate::schema::{FieldType, Schema};
use crate::store::{SearchDefaults, Store};

pub use request::{CheckAtLeast, Order, SearchQuery, SearchRequest, SearchRequestBuilder};
pub use result::ResultPage;

/// Runs search requests against one read handle.
pub struct Searcher<'a> {
    schema: &'a Schema,
    reader: &'a dyn Reader,
    defaults: &'a SearchDefaults,
    stemmer: Option<Arc<dyn Stemmer>>,
    stopper: Option<Arc<dyn Stopper>>,
}

impl<'a> Searcher<'a> {
    pub fn new(schema: &'a Schema, reader: &'a dyn Reader, defaults: &'a SearchDefaults) -> Self {
        Self {
            schema,
            reader,
            defaults,
            stemmer: None,
            stopper: None,
        }
    }

    pub fn with_stemmer(mut self, stemmer: Option<Arc<dyn Stemmer>>) -> Self {
        self.stemmer = stemmer;
        self
    }

    pub fn with_stopper(mut self, stopper: Option<Arc<dyn Stopper>>) -> Self {
        self.stopper = stopper;
        self
    }

    /// Parse the request's query and apply its filters.
    pub fn predicate(&self, request: &SearchRequest) -> Result<ParsedQuery> {
        let mut parsed = match &request.query {
            SearchQuery::MatchAll => ParsedQuery {
                predicate: Predicate::MatchAll,
                corrected_query: None,
            },
            SearchQuery::MatchNone => ParsedQuery {
                predicate: Predicate::MatchNothing,
                corrected_query: None,
            },
            SearchQuery::Text(text) => self.parser(request).parse(text)?,
        };

        if let Some(filter) = build_filter(self.schema, &request.filters) {
            parsed.predicate = parsed.predicate.filter(filter);
        }
        Ok(parsed)
    }

    fn parser(&self, request: &SearchRequest) -> QueryParser<'a> {
        let mut flags = request.flags.unwrap_or(self.defaults.flags);
        if !request.spelling.unwrap_or(self.defaults.spelling) {
            flags.remove(QueryFlags::SPELLING_CORRECTION);
        }

        let mut parser = QueryParser::new(self.schema, self.reader)
            .with_default_op(request.default_op.unwrap_or(self.defaults.default_op))
            .with_flags(flags)
            .with_stem_strategy(request.stem_strategy.unwrap_or(self.defaults.stem_strategy))
            .with_stemmer(self.stemmer.clone())
            .with_stopper(self.stopper.clone());
        if let Some(fields) = request.fields.as_ref().or(self.defaults.fields.as_ref()) {
            parser = parser.with_fields(fields.iter().cloned());
        }
        parser
    }

    fn per_page(&self, request: &SearchRequest) -> u32 {
        request.per_page.unwrap_or(self.defaults.per_page).max(1)
    }

    /// The engine query for a request, given its predicate.
    pub fn enquire(&self, request: &SearchRequest, predicate: Predicate) -> Result<Enquire> {
        let page = request.page.max(1);
        let per_page = self.per_page(request);
        let offset = (page as usize - 1) * per_page as usize;

        let mut enquire = Enquire::new(predicate).with_range(offset, per_page as usize);

        enquire = match &request.order {
            Order::Relevance => enquire,
            Order::Id => enquire
                .with_sort(SortOrder::Value {
                    slot: ID_ORDER_SLOT,
                    reverse: request.reverse,
                })
                .with_docid_order(if request.reverse {
                    DocIdOrder::Descending
                } else {
                    DocIdOrder::Ascending
                }),
            Order::Field(name) => enquire.with_sort(SortOrder::Value {
                slot: Schema::slot(name),
                reverse: request.reverse,
            }),
        };

        if let Some(field) = &request.collapse {
            enquire = enquire.with_collapse(Schema::slot(field));
        }

        let facet_slots = self
            .facet_fields(request)
            .map(|(name, _)| Schema::slot(name))
            .collect();
        enquire = enquire.with_facets(facet_slots);

        let check_at_least = match request.check_at_least {
            CheckAtLeast::Count(n) => n,
            CheckAtLeast::All => self.reader.doc_count()? as usize,
        };
        Ok(enquire.with_check_at_least(check_at_least))
    }

    /// Requested facet fields that can be counted, with their types.
    fn facet_fields<'r>(
        &'r self,
        request: &'r SearchRequest,
    ) -> impl Iterator<Item = (&'r str, FieldType)> + 'r {
        request.facets.iter().filter_map(|name| {
            match self.schema.get(name).filter(|o| o.is_filterable()) {
                Some(option) => Some((name.as_str(), option.field_type)),
                None => {
                    log::warn!("ignoring facet on '{name}': field is neither sortable nor boolean");
                    None
                }
            }
        })
    }

    /// Run a request. Retrieved documents keep a handle to `store`.
    pub fn search(&self, request: &SearchRequest, store: Option<&Store>) -> Result<ResultPage> {
        let parsed = self.predicate(request)?;
        log::debug!("searching for {}", parsed.predicate);
        let enquire = self.enquire(request, parsed.predicate)?;
        let match_set = self.reader.run_query(&enquire)?;

        let facets = self.decode_facets(request, &match_set)?;
        let matches = match_set
            .matches
            .iter()
            .map(|m| {
                let record = self.reader.document(m.doc_id)?;
                Ok(Document::from_record(
                    m.doc_id,
                    Some(m.weight),
                    record,
                    self.schema,
                    store.cloned(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ResultPage {
            matches,
            current_page: request.page.max(1),
            per_page: self.per_page(request),
            estimated_total: match_set.estimated_total,
            corrected_query: parsed.corrected_query,
            facets,
        })
    }

    fn decode_facets(
        &self,
        request: &SearchRequest,
        match_set: &MatchSet,
    ) -> Result<HashMap<String, Vec<(FieldValue, u64)>>> {
        let mut facets = HashMap::new();
        for name in &request.facets {
            let Some(option) = self.schema.get(name).filter(|o| o.is_filterable()) else {
                continue;
            };
            let counts = match match_set.facet_counts.get(&Schema::slot(name)) {
                Some(counts) => counts
                    .iter()
                    .map(|(bytes, count)| Ok((codec::decode(option.field_type, bytes)?, *count)))
                    .collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            };
            facets.insert(name.clone(), counts);
        }
        Ok(facets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::MemoryEngine;
    use crate::engine::{IndexEngine, OpenMode, Writer};
    use crate::indexer::Indexer;

    fn setup(schema: &Schema, docs: &[Vec<(&str, FieldValue)>]) -> Box<dyn Writer> {
        let mut writer = MemoryEngine::new()
            .open_read_write(None, OpenMode::CreateOrOpen)
            .unwrap();
        for fields in docs {
            let fields = fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            let indexed = Indexer::new(schema).index(&fields, None).unwrap();
            writer.add_document(indexed.document).unwrap();
        }
        writer
    }

    fn schema() -> Schema {
        Schema::builder()
            .add_text_field("name")
            .add_sortable_field("age", FieldType::Integer)
            .add_text_field("notes")
            .build()
    }

    #[test]
    fn test_filter_is_applied_to_query() {
        let schema = schema();
        let writer = setup(&schema, &[]);
        let reader = writer.shared_reader().unwrap();
        let defaults = SearchDefaults::default();
        let searcher = Searcher::new(&schema, reader.as_ref(), &defaults);

        let request = SearchRequest::builder("john").filter("age", "30..").build();
        let parsed = searcher.predicate(&request).unwrap();
        assert!(matches!(parsed.predicate, Predicate::Filter(..)));

        let request = SearchRequest::new(SearchQuery::MatchNone);
        assert_eq!(searcher.predicate(&request).unwrap().predicate, Predicate::MatchNothing);
    }

    #[test]
    fn test_enquire_paging_and_order() {
        let schema = schema();
        let writer = setup(&schema, &[]);
        let reader = writer.shared_reader().unwrap();
        let defaults = SearchDefaults::default();
        let searcher = Searcher::new(&schema, reader.as_ref(), &defaults);

        let request = SearchRequest::builder(SearchQuery::MatchAll)
            .page(5)
            .per_page(18)
            .order("id")
            .reverse(true)
            .facet("age")
            .facet("notes")
            .build();
        let enquire = searcher.enquire(&request, Predicate::MatchAll).unwrap();
        assert_eq!(enquire.offset, 72);
        assert_eq!(enquire.limit, 18);
        assert_eq!(
            enquire.sort,
            SortOrder::Value {
                slot: ID_ORDER_SLOT,
                reverse: true
            }
        );
        assert_eq!(enquire.docid_order, DocIdOrder::Descending);
        assert_eq!(enquire.facet_slots, vec![Schema::slot("age")]);
    }

    #[test]
    fn test_facets_decoded_in_value_order() {
        let schema = schema();
        let docs: Vec<Vec<(&str, FieldValue)>> = [40, 30, 40, 35]
            .into_iter()
            .map(|age| vec![("name", "john".into()), ("age", age.into())])
            .collect();
        let writer = setup(&schema, &docs);
        let reader = writer.shared_reader().unwrap();
        let defaults = SearchDefaults::default();
        let searcher = Searcher::new(&schema, reader.as_ref(), &defaults);

        let request = SearchRequest::builder("john").facet("age").build();
        let page = searcher.search(&request, None).unwrap();
        assert_eq!(page.estimated_total, 4);
        assert_eq!(
            page.facets["age"],
            vec![
                (FieldValue::Integer(30), 1),
                (FieldValue::Integer(35), 1),
                (FieldValue::Integer(40), 2)
            ]
        );
    }
}
