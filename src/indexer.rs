//! Term generation.
//!
//! Turns a document's fields into an [`EngineDocument`] following the
//! schema: value slots for stored, sortable and boolean fields, exact
//! `X<FIELD><value>` terms for boolean fields, and tokenized terms for
//! indexed fields according to their [`IndexMode`](crate::schema::IndexMode).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::analysis::stemmer::stemmed_term;
use crate::analysis::tokenizer::tokenize_from;
use crate::analysis::{Stemmer, Stopper};
use crate::codec;
use crate::data::FieldValue;
use crate::engine::EngineDocument;
use crate::error::Result;
use crate::schema::Schema;

/// Position gap inserted between fields so phrases never span two fields.
pub const FIELD_POSITION_GAP: u32 = 100;

/// The engine document built for one document, plus the words to feed the
/// spelling dictionary.
#[derive(Debug, Clone, Default)]
pub struct IndexedDocument {
    pub document: EngineDocument,
    pub spellings: BTreeMap<String, u64>,
}

pub struct Indexer<'a> {
    schema: &'a Schema,
    stopper: Option<Arc<dyn Stopper>>,
    stemmer: Option<Arc<dyn Stemmer>>,
    index_positions: bool,
    spelling: bool,
}

impl<'a> Indexer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            stopper: None,
            stemmer: None,
            index_positions: true,
            spelling: false,
        }
    }

    pub fn with_stopper(mut self, stopper: Option<Arc<dyn Stopper>>) -> Self {
        self.stopper = stopper;
        self
    }

    pub fn with_stemmer(mut self, stemmer: Option<Arc<dyn Stemmer>>) -> Self {
        self.stemmer = stemmer;
        self
    }

    pub fn with_positions(mut self, index_positions: bool) -> Self {
        self.index_positions = index_positions;
        self
    }

    pub fn with_spelling(mut self, spelling: bool) -> Self {
        self.spelling = spelling;
        self
    }

    pub fn index(
        &self,
        fields: &HashMap<String, FieldValue>,
        data: Option<&[u8]>,
    ) -> Result<IndexedDocument> {
        let mut out = IndexedDocument::default();
        if let Some(data) = data {
            out.document.set_data(data.to_vec());
        }

        // Sorted so positions are stable across runs.
        let mut names: Vec<&String> = fields.keys().collect();
        names.sort();

        let mut position = 0u32;
        for name in names {
            let value = &fields[name];
            if value.is_null() {
                continue;
            }
            let option = self.schema.option_for(name);
            let value = codec::coerce(option.field_type, value)?;
            let prefix = Schema::prefix(name);

            if option.has_value_slot() {
                let bytes = codec::encode(option.field_type, &value)?;
                out.document.add_value(Schema::slot(name), bytes);
            }

            if option.boolean {
                for text in value.index_texts() {
                    out.document.add_boolean_term(format!("{prefix}{text}"));
                }
            }

            if option.indexed.term_copies() == 0 {
                continue;
            }

            for text in value.index_texts() {
                let tokens = tokenize_from(&text, position);
                if let Some(last) = tokens.last() {
                    position = last.position + 1;
                }
                for token in tokens {
                    self.add_token(&mut out, &token.text, token.position, &prefix, &option);
                }
            }
            position += FIELD_POSITION_GAP;
        }

        Ok(out)
    }

    fn add_token(
        &self,
        out: &mut IndexedDocument,
        word: &str,
        position: u32,
        prefix: &str,
        option: &crate::schema::FieldOption,
    ) {
        let wdf = option.weight;
        let doc = &mut out.document;
        let mut add = |term: String| {
            if self.index_positions {
                doc.add_posting(term, position, wdf);
            } else {
                doc.add_term(term, wdf);
            }
        };
        if option.indexed.unprefixed() {
            add(word.to_string());
        }
        if option.indexed.prefixed() {
            add(format!("{prefix}{word}"));
        }

        let stopword = self.stopper.as_ref().is_some_and(|s| s.is_stopword(word));
        if let Some(stemmer) = &self.stemmer
            && !stopword
        {
            let stem = stemmer.stem(word);
            if option.indexed.unprefixed() {
                doc.add_term(stemmed_term("", &stem), wdf);
            }
            if option.indexed.prefixed() {
                doc.add_term(stemmed_term(prefix, &stem), wdf);
            }
        }

        if self.spelling {
            *out.spellings.entry(word.to_string()).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::WordListStopper;
    use crate::schema::{FieldOption, FieldType, IndexMode};

    fn fields(pairs: &[(&str, FieldValue)]) -> HashMap<String, FieldValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_index_modes() {
        let schema = Schema::builder()
            .add_field("title", FieldOption::text())
            .add_field(
                "notes",
                FieldOption::text().indexed(IndexMode::WithFieldNameOnly),
            )
            .add_field(
                "body",
                FieldOption::text().indexed(IndexMode::WithoutFieldName),
            )
            .build();
        let indexed = Indexer::new(&schema)
            .index(
                &fields(&[
                    ("title", "Red".into()),
                    ("notes", "blue".into()),
                    ("body", "green".into()),
                ]),
                None,
            )
            .unwrap();
        let doc = indexed.document;

        assert!(doc.has_term("red"));
        assert!(doc.has_term("XTITLEred"));
        assert!(doc.has_term("XNOTESblue"));
        assert!(!doc.has_term("blue"));
        assert!(doc.has_term("green"));
        assert!(!doc.has_term("XBODYgreen"));
    }

    #[test]
    fn test_boolean_and_sortable_values() {
        let schema = Schema::builder()
            .add_boolean_field("status")
            .add_sortable_field("age", FieldType::Integer)
            .build();
        let indexed = Indexer::new(&schema)
            .index(
                &fields(&[("status", "active".into()), ("age", 35.into())]),
                None,
            )
            .unwrap();
        let doc = indexed.document;

        assert!(doc.has_term("XSTATUSactive"));
        assert!(!doc.has_term("active"));
        assert_eq!(
            doc.value(Schema::slot("age")).unwrap(),
            codec::encode(FieldType::Integer, &35.into()).unwrap()
        );
        assert!(doc.value(Schema::slot("status")).is_some());
        assert!(doc.has_term("35"));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let schema = Schema::builder()
            .add_sortable_field("n", FieldType::Integer)
            .build();
        let result = Indexer::new(&schema).index(
            &fields(&[("n", FieldValue::Integer(i64::MAX))]),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_stemming_skips_stopwords() {
        let schema = Schema::builder().add_text_field("content").build();
        let stemmer: Arc<dyn Stemmer> = Arc::new(|w: &str| w.trim_end_matches('s').to_string());
        let stopper: Arc<dyn Stopper> = Arc::new(WordListStopper::for_language("english").unwrap());
        let indexed = Indexer::new(&schema)
            .with_stemmer(Some(stemmer))
            .with_stopper(Some(stopper))
            .with_spelling(true)
            .index(&fields(&[("content", "the dogs".into())]), None)
            .unwrap();
        let doc = indexed.document;

        assert!(doc.has_term("Zdog"));
        assert!(doc.has_term("ZXCONTENTdog"));
        assert!(doc.has_term("the"));
        assert!(!doc.has_term("Zthe"));
        assert_eq!(indexed.spellings.get("dogs"), Some(&1));
    }

    #[test]
    fn test_positions_optional() {
        let schema = Schema::builder().add_text_field("content").build();
        let f = fields(&[("content", "cow dog".into())]);
        let with = Indexer::new(&schema).index(&f, None).unwrap().document;
        let without = Indexer::new(&schema)
            .with_positions(false)
            .index(&f, None)
            .unwrap()
            .document;
        assert_eq!(with.terms["dog"].positions, vec![1]);
        assert!(without.terms["dog"].positions.is_empty());
    }
}
