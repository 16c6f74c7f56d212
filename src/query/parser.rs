//! Free-text query parsing.
//!
//! A query string is split into groups and clauses by the pest grammar in
//! `query.pest`, then folded into a [`Predicate`] with this precedence,
//! loosest first:
//!
//! ```text
//! OR  <  XOR  <  AND, AND NOT, NOT  <  implicit sequence (default op)
//! ```
//!
//! Within a sequence, `+word` clauses are required, `-word` clauses are
//! excluded, and clauses on boolean fields or value ranges become filters
//! that restrict the match set without adding weight.
//!
//! A query that does not parse under the requested flags is reparsed as
//! plain words joined by the default operator.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::analysis::stemmer::stemmed_term;
use crate::analysis::{Stemmer, Stopper, normalize, tokenize};
use crate::codec;
use crate::data::FieldValue;
use crate::engine::{Predicate, Reader};
use crate::error::{Result, SorrelError};
use crate::query::flags::QueryFlags;
use crate::query::range::{match_marked_range, range_predicate, split_range};
use crate::schema::Schema;

#[derive(Parser)]
#[grammar = "query/query.pest"]
struct QueryGrammar;

/// Operator joining the clauses of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultOp {
    #[default]
    And,
    Or,
    /// Adjacent words form a phrase.
    Phrase,
    /// The first clause is required, the rest only add weight.
    AndMaybe,
}

/// Which query words are reduced to stemmed `Z` terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StemStrategy {
    None,
    /// Unquoted words that do not start with a capital letter.
    #[default]
    Some,
    /// Every unquoted word.
    All,
}

/// Result of parsing a query string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub predicate: Predicate,
    /// The query with misspelled words replaced, if any were found.
    pub corrected_query: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Love,
    Hate,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Clause {
    modifier: Option<Modifier>,
    field: Option<String>,
    text: String,
    quoted: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Group(Vec<Node>),
    Clause(Clause),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
    Xor,
    Not,
}

enum Token<'n> {
    Op(Op),
    Operand(&'n Node),
}

/// A scored clause.
struct Part {
    predicate: Predicate,
    stopword: bool,
    /// Unstemmed term to use when the sequence becomes a phrase.
    phrase_term: Option<String>,
}

impl Part {
    fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            stopword: false,
            phrase_term: None,
        }
    }
}

enum Parsed {
    Scored(Part),
    /// A filter belonging to the named field's OR group.
    Filter { group: String, predicate: Predicate },
}

/// Builds predicates from query strings against one index.
pub struct QueryParser<'a> {
    schema: &'a Schema,
    reader: &'a dyn Reader,
    fields: Option<HashSet<String>>,
    default_op: DefaultOp,
    flags: QueryFlags,
    stem_strategy: StemStrategy,
    stemmer: Option<Arc<dyn Stemmer>>,
    stopper: Option<Arc<dyn Stopper>>,
}

impl<'a> QueryParser<'a> {
    pub fn new(schema: &'a Schema, reader: &'a dyn Reader) -> Self {
        Self {
            schema,
            reader,
            fields: None,
            default_op: DefaultOp::default(),
            flags: QueryFlags::default(),
            stem_strategy: StemStrategy::default(),
            stemmer: None,
            stopper: None,
        }
    }

    /// Restrict `field:` prefixes to these fields instead of every schema field.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_default_op(mut self, op: DefaultOp) -> Self {
        self.default_op = op;
        self
    }

    pub fn with_flags(mut self, flags: QueryFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_stem_strategy(mut self, strategy: StemStrategy) -> Self {
        self.stem_strategy = strategy;
        self
    }

    pub fn with_stemmer(mut self, stemmer: Option<Arc<dyn Stemmer>>) -> Self {
        self.stemmer = stemmer;
        self
    }

    pub fn with_stopper(mut self, stopper: Option<Arc<dyn Stopper>>) -> Self {
        self.stopper = stopper;
        self
    }

    pub fn parse(&self, query: &str) -> Result<ParsedQuery> {
        let mut builder = Builder {
            parser: self,
            corrections: Vec::new(),
        };

        let predicate = match parse_nodes(query).and_then(|nodes| builder.build(&nodes)) {
            Ok(predicate) => predicate,
            Err(SorrelError::InvalidQuery(msg)) => {
                log::warn!("query {query:?} did not parse ({msg}); retrying as plain words");
                builder.corrections.clear();
                builder.build_plain(query)?
            }
            Err(e) => return Err(e),
        };

        Ok(ParsedQuery {
            predicate,
            corrected_query: corrected_query(query, &builder.corrections),
        })
    }
}

fn parse_nodes(query: &str) -> Result<Vec<Node>> {
    let mut pairs = QueryGrammar::parse(Rule::query, query)
        .map_err(|e| SorrelError::invalid_query(e.to_string()))?;
    Ok(pairs
        .next()
        .map(|root| root.into_inner().filter_map(to_node).collect())
        .unwrap_or_default())
}

fn to_node(pair: Pair<Rule>) -> Option<Node> {
    match pair.as_rule() {
        Rule::group => Some(Node::Group(pair.into_inner().filter_map(to_node).collect())),
        Rule::clause => {
            let mut clause = Clause::default();
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::modifier => {
                        clause.modifier = Some(if inner.as_str() == "+" {
                            Modifier::Love
                        } else {
                            Modifier::Hate
                        });
                    }
                    Rule::field_prefix => {
                        clause.field = inner.into_inner().next().map(|p| p.as_str().to_string());
                    }
                    Rule::phrase => {
                        clause.quoted = true;
                        clause.text = inner
                            .into_inner()
                            .next()
                            .map(|p| p.as_str().to_string())
                            .unwrap_or_default();
                    }
                    Rule::word => clause.text = inner.as_str().to_string(),
                    _ => {}
                }
            }
            Some(Node::Clause(clause))
        }
        _ => None,
    }
}

/// Replace each corrected word, matched case-insensitively on word
/// boundaries.
fn corrected_query(query: &str, corrections: &[(String, String)]) -> Option<String> {
    if corrections.is_empty() {
        return None;
    }
    let mut out = query.to_string();
    for (from, to) in corrections {
        if let Ok(re) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(from))) {
            out = re.replace_all(&out, NoExpand(to)).into_owned();
        }
    }
    (out != query).then_some(out)
}

struct Builder<'p, 'a> {
    parser: &'p QueryParser<'a>,
    corrections: Vec<(String, String)>,
}

impl Builder<'_, '_> {
    fn flag(&self, flag: QueryFlags) -> bool {
        self.parser.flags.contains(flag)
    }

    fn build(&mut self, nodes: &[Node]) -> Result<Predicate> {
        let tokens = self.classify(nodes);
        if tokens.is_empty() {
            return Ok(Predicate::MatchNothing);
        }
        let mut pos = 0;
        let predicate = self.parse_or(&tokens, &mut pos)?;
        if pos < tokens.len() {
            return Err(SorrelError::invalid_query("unexpected operator"));
        }
        Ok(predicate)
    }

    fn classify<'n>(&self, nodes: &'n [Node]) -> Vec<Token<'n>> {
        nodes
            .iter()
            .map(|node| match node {
                Node::Clause(c) if c.modifier.is_none() && c.field.is_none() && !c.quoted => {
                    self.operator(&c.text).map_or(Token::Operand(node), Token::Op)
                }
                _ => Token::Operand(node),
            })
            .collect()
    }

    fn operator(&self, word: &str) -> Option<Op> {
        if !self.flag(QueryFlags::BOOLEAN) {
            return None;
        }
        let word = if self.flag(QueryFlags::BOOLEAN_ANY_CASE) {
            word.to_uppercase()
        } else {
            word.to_string()
        };
        match word.as_str() {
            "AND" => Some(Op::And),
            "OR" => Some(Op::Or),
            "XOR" => Some(Op::Xor),
            "NOT" => Some(Op::Not),
            _ => None,
        }
    }

    fn parse_or(&mut self, tokens: &[Token], pos: &mut usize) -> Result<Predicate> {
        let mut items = vec![self.parse_xor(tokens, pos)?];
        while matches!(tokens.get(*pos), Some(Token::Op(Op::Or))) {
            *pos += 1;
            items.push(self.parse_xor(tokens, pos)?);
        }
        Ok(Predicate::or(items))
    }

    fn parse_xor(&mut self, tokens: &[Token], pos: &mut usize) -> Result<Predicate> {
        let mut items = vec![self.parse_and(tokens, pos)?];
        while matches!(tokens.get(*pos), Some(Token::Op(Op::Xor))) {
            *pos += 1;
            items.push(self.parse_and(tokens, pos)?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Predicate::Xor(items)
        })
    }

    fn parse_and(&mut self, tokens: &[Token], pos: &mut usize) -> Result<Predicate> {
        let mut left = if matches!(tokens.get(*pos), Some(Token::Op(Op::Not))) {
            if !self.flag(QueryFlags::PURE_NOT) {
                return Err(SorrelError::invalid_query("NOT without a positive clause"));
            }
            *pos += 1;
            Predicate::MatchAll.and_not(self.parse_seq(tokens, pos)?)
        } else {
            self.parse_seq(tokens, pos)?
        };

        loop {
            match tokens.get(*pos) {
                Some(Token::Op(Op::And)) => {
                    *pos += 1;
                    if matches!(tokens.get(*pos), Some(Token::Op(Op::Not))) {
                        *pos += 1;
                        left = left.and_not(self.parse_seq(tokens, pos)?);
                    } else {
                        left = Predicate::And(vec![left, self.parse_seq(tokens, pos)?]);
                    }
                }
                Some(Token::Op(Op::Not)) => {
                    *pos += 1;
                    left = left.and_not(self.parse_seq(tokens, pos)?);
                }
                _ => return Ok(left),
            }
        }
    }

    fn parse_seq(&mut self, tokens: &[Token], pos: &mut usize) -> Result<Predicate> {
        let mut operands = Vec::new();
        while let Some(Token::Operand(node)) = tokens.get(*pos) {
            operands.push(*node);
            *pos += 1;
        }
        if operands.is_empty() {
            return Err(SorrelError::invalid_query("expected a term"));
        }
        self.sequence(&operands)
    }

    fn sequence(&mut self, operands: &[&Node]) -> Result<Predicate> {
        let lovehate = self.flag(QueryFlags::LOVEHATE);
        let mut required = Vec::new();
        let mut optional = Vec::new();
        let mut excluded = Vec::new();
        let mut filters: BTreeMap<String, Vec<Predicate>> = BTreeMap::new();

        for node in operands {
            let (modifier, parsed) = match node {
                Node::Group(inner) => (None, Some(Parsed::Scored(Part::new(self.build(inner)?)))),
                Node::Clause(clause) => (
                    clause.modifier.filter(|_| lovehate),
                    self.clause(clause)?,
                ),
            };
            match (parsed, modifier) {
                (None, _) => {}
                (Some(Parsed::Scored(part)), Some(Modifier::Love)) => required.push(part.predicate),
                (Some(Parsed::Scored(part)), Some(Modifier::Hate)) => excluded.push(part.predicate),
                (Some(Parsed::Scored(part)), None) => optional.push(part),
                (Some(Parsed::Filter { predicate, .. }), Some(Modifier::Hate)) => {
                    excluded.push(predicate)
                }
                (Some(Parsed::Filter { group, predicate }), _) => {
                    filters.entry(group).or_default().push(predicate)
                }
            }
        }

        drop_stopwords(&mut optional, !required.is_empty());
        let plain = self.combine(optional);

        let positive = match (required.is_empty(), plain) {
            (true, plain) => plain,
            (false, None) => Some(Predicate::and(required)),
            (false, Some(plain)) => Some(match self.parser.default_op {
                DefaultOp::And | DefaultOp::Phrase => {
                    required.push(plain);
                    Predicate::and(required)
                }
                DefaultOp::Or | DefaultOp::AndMaybe => Predicate::and(required).and_maybe(plain),
            }),
        };

        let filter = (!filters.is_empty())
            .then(|| Predicate::and(filters.into_values().map(Predicate::or).collect()));

        let mut result = match (positive, &filter) {
            (Some(p), _) => p,
            (None, Some(_)) => Predicate::MatchAll,
            (None, None) if !excluded.is_empty() => {
                if !self.flag(QueryFlags::PURE_NOT) {
                    return Err(SorrelError::invalid_query("query has only excluded clauses"));
                }
                Predicate::MatchAll
            }
            (None, None) => return Ok(Predicate::MatchNothing),
        };
        if !excluded.is_empty() {
            result = result.and_not(Predicate::or(excluded));
        }
        if let Some(filter) = filter {
            result = result.filter(filter);
        }
        Ok(result)
    }

    fn combine(&self, parts: Vec<Part>) -> Option<Predicate> {
        if parts.is_empty() {
            return None;
        }
        let predicate = match self.parser.default_op {
            DefaultOp::And => Predicate::and(parts.into_iter().map(|p| p.predicate).collect()),
            DefaultOp::Or => Predicate::or(parts.into_iter().map(|p| p.predicate).collect()),
            DefaultOp::AndMaybe => {
                let mut iter = parts.into_iter().map(|p| p.predicate);
                let first = iter.next()?;
                let rest: Vec<Predicate> = iter.collect();
                if rest.is_empty() {
                    first
                } else {
                    first.and_maybe(Predicate::or(rest))
                }
            }
            DefaultOp::Phrase => {
                let terms: Option<Vec<String>> =
                    parts.iter().map(|p| p.phrase_term.clone()).collect();
                match terms {
                    Some(terms) if terms.len() > 1 => Predicate::Phrase {
                        terms,
                        window: None,
                    },
                    _ => Predicate::and(parts.into_iter().map(|p| p.predicate).collect()),
                }
            }
        };
        Some(predicate)
    }

    fn recognizes(&self, field: &str) -> bool {
        match &self.parser.fields {
            Some(fields) => fields.contains(field),
            None => self.parser.schema.contains(field),
        }
    }

    fn clause(&mut self, clause: &Clause) -> Result<Option<Parsed>> {
        let schema = self.parser.schema;

        if let Some(field) = &clause.field {
            if !self.recognizes(field) {
                return self.text(&format!("{field}:{}", clause.text), "", clause.quoted);
            }
            let option = schema.option_for(field);
            let prefix = Schema::prefix(field);
            if option.boolean {
                // Same exact tokens the indexer writes; raw text when the
                // value does not convert.
                let value = FieldValue::Text(clause.text.clone());
                let texts = codec::coerce(option.field_type, &value)
                    .map(|v| v.index_texts())
                    .unwrap_or_else(|_| vec![clause.text.clone()]);
                let predicate = Predicate::or(
                    texts
                        .iter()
                        .map(|t| Predicate::term(format!("{prefix}{t}")))
                        .collect(),
                );
                return Ok(Some(Parsed::Filter {
                    group: field.clone(),
                    predicate,
                }));
            }
            if option.sortable
                && !clause.quoted
                && let Some(bounds) = split_range(&clause.text)
                && let Ok(predicate) = range_predicate(field, &option, &bounds)
            {
                return Ok(Some(Parsed::Filter {
                    group: field.clone(),
                    predicate,
                }));
            }
            return self.text(&clause.text, &prefix, clause.quoted);
        }

        if !clause.quoted
            && let Some((field, bounds)) = match_marked_range(schema, &clause.text)
            && let Ok(predicate) = range_predicate(&field, &schema.option_for(&field), &bounds)
        {
            return Ok(Some(Parsed::Filter {
                group: field,
                predicate,
            }));
        }

        self.text(&clause.text, "", clause.quoted)
    }

    fn text(&mut self, text: &str, prefix: &str, quoted: bool) -> Result<Option<Parsed>> {
        if !quoted && self.flag(QueryFlags::WILDCARD) && text.len() > 1 && text.ends_with('*') {
            let stem = normalize(text.trim_end_matches('*'));
            if tokenize(&stem).len() == 1 {
                let expanded = self
                    .parser
                    .reader
                    .terms_with_prefix(&format!("{prefix}{stem}"))?;
                let predicate = Predicate::or(expanded.into_iter().map(Predicate::term).collect());
                return Ok(Some(Parsed::Scored(Part::new(predicate))));
            }
        }

        let tokens = tokenize(text);
        match tokens.len() {
            0 => Ok(None),
            1 if !quoted => {
                let capitalized = text.chars().next().is_some_and(char::is_uppercase);
                Ok(Some(Parsed::Scored(self.word(&tokens[0].text, prefix, capitalized)?)))
            }
            _ => {
                for token in &tokens {
                    self.check_spelling(&token.text, prefix)?;
                }
                let terms: Vec<String> = tokens
                    .iter()
                    .map(|t| format!("{prefix}{}", t.text))
                    .collect();
                let predicate = if terms.len() == 1 {
                    Predicate::term(terms[0].clone())
                } else if quoted && !self.flag(QueryFlags::PHRASE) {
                    Predicate::and(terms.into_iter().map(Predicate::term).collect())
                } else {
                    Predicate::phrase(terms)
                };
                Ok(Some(Parsed::Scored(Part::new(predicate))))
            }
        }
    }

    fn word(&mut self, word: &str, prefix: &str, capitalized: bool) -> Result<Part> {
        self.check_spelling(word, prefix)?;
        let parser = self.parser;

        let stopword = parser.stopper.as_ref().is_some_and(|s| s.is_stopword(word));
        let raw_term = format!("{prefix}{word}");
        let stem = match (parser.stem_strategy, &parser.stemmer) {
            (StemStrategy::Some, Some(stemmer)) if !capitalized && !stopword => {
                Some(stemmer.stem(word))
            }
            (StemStrategy::All, Some(stemmer)) if !stopword => Some(stemmer.stem(word)),
            _ => None,
        };
        let term = stem.map_or_else(|| raw_term.clone(), |stem| stemmed_term(prefix, &stem));

        let mut predicate = Predicate::term(term);
        if self.flag(QueryFlags::SYNONYM) {
            let synonyms = parser.reader.synonyms(word)?;
            if !synonyms.is_empty() {
                let mut group = vec![predicate];
                group.extend(
                    synonyms
                        .iter()
                        .map(|s| Predicate::term(format!("{prefix}{s}"))),
                );
                predicate = Predicate::Synonym(group);
            }
        }

        Ok(Part {
            predicate,
            stopword,
            phrase_term: Some(raw_term),
        })
    }

    fn check_spelling(&mut self, word: &str, prefix: &str) -> Result<()> {
        if !self.flag(QueryFlags::SPELLING_CORRECTION) {
            return Ok(());
        }
        let reader = self.parser.reader;
        if reader.term_freq(&format!("{prefix}{word}"))? > 0 {
            return Ok(());
        }
        if let Some(suggestion) = reader.spelling_suggestion(word)?
            && suggestion != word
        {
            self.corrections.push((word.to_string(), suggestion));
        }
        Ok(())
    }

    fn build_plain(&mut self, query: &str) -> Result<Predicate> {
        let mut parts = Vec::new();
        for token in tokenize(query) {
            parts.push(self.word(&token.text, "", false)?);
        }
        drop_stopwords(&mut parts, false);
        Ok(self.combine(parts).unwrap_or(Predicate::MatchNothing))
    }
}

/// Remove stopword clauses unless nothing else would remain.
fn drop_stopwords(parts: &mut Vec<Part>, has_required: bool) {
    if has_required || parts.iter().any(|p| !p.stopword) {
        parts.retain(|p| !p.stopword);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::analysis::WordListStopper;
    use crate::data::FieldValue;
    use crate::engine::memory::MemoryEngine;
    use crate::engine::{IndexEngine, OpenMode, Writer};
    use crate::indexer::Indexer;
    use crate::schema::{FieldOption, FieldType};

    fn schema() -> Schema {
        Schema::builder()
            .add_text_field("title")
            .add_text_field("content")
            .add_boolean_field("status")
            .add_field(
                "price",
                FieldOption::float().sortable(true).range_prefix("$"),
            )
            .add_sortable_field("age", FieldType::Integer)
            .build()
    }

    fn index(schema: &Schema, docs: &[&str]) -> (Box<dyn Writer>, Box<dyn Reader>) {
        let mut writer = MemoryEngine::new()
            .open_read_write(None, OpenMode::CreateOrOpen)
            .unwrap();
        for text in docs {
            let fields: HashMap<String, FieldValue> =
                [("content".to_string(), FieldValue::from(*text))].into_iter().collect();
            let indexed = Indexer::new(schema)
                .with_spelling(true)
                .index(&fields, None)
                .unwrap();
            writer.add_document(indexed.document).unwrap();
            for (word, freq) in indexed.spellings {
                writer.add_spelling(&word, freq).unwrap();
            }
        }
        let reader = writer.shared_reader().unwrap();
        (writer, reader)
    }

    fn parse_with(parser: QueryParser, query: &str) -> String {
        parser.parse(query).unwrap().predicate.to_string()
    }

    #[test]
    fn test_default_operators() {
        let schema = schema();
        let (_writer, reader) = index(&schema, &[]);
        let p = || QueryParser::new(&schema, reader.as_ref()).with_flags(QueryFlags::BOOLEAN);

        assert_eq!(parse_with(p(), "cow dog cat"), "(cow AND dog AND cat)");
        assert_eq!(
            parse_with(p().with_default_op(DefaultOp::Or), "cow dog cat"),
            "(cow OR dog OR cat)"
        );
        assert_eq!(
            parse_with(p().with_default_op(DefaultOp::Phrase), "red fox"),
            "(red PHRASE fox)"
        );
        assert_eq!(
            parse_with(p().with_default_op(DefaultOp::AndMaybe), "red fox den"),
            "(red AND_MAYBE (fox OR den))"
        );
    }

    #[test]
    fn test_boolean_operators() {
        let schema = schema();
        let (_writer, reader) = index(&schema, &[]);
        let p = || QueryParser::new(&schema, reader.as_ref());

        assert_eq!(parse_with(p(), "cow OR dog cat"), "(cow OR (dog AND cat))");
        assert_eq!(parse_with(p(), "cow or dog"), "(cow OR dog)");
        assert_eq!(parse_with(p(), "cow AND NOT dog"), "(cow AND_NOT dog)");
        assert_eq!(parse_with(p(), "cow NOT dog"), "(cow AND_NOT dog)");
        assert_eq!(parse_with(p(), "cow XOR dog"), "(cow XOR dog)");
        assert_eq!(parse_with(p(), "(cow OR dog) cat"), "((cow OR dog) AND cat)");

        let strict = p().with_flags(QueryFlags::BOOLEAN);
        assert_eq!(parse_with(strict, "cow or dog"), "(cow AND or AND dog)");
    }

    #[test]
    fn test_love_hate() {
        let schema = schema();
        let (_writer, reader) = index(&schema, &[]);
        let p = QueryParser::new(&schema, reader.as_ref()).with_default_op(DefaultOp::Or);
        assert_eq!(
            parse_with(p, "+cat mouse -dog"),
            "((cat AND_MAYBE mouse) AND_NOT dog)"
        );
    }

    #[test]
    fn test_pure_not() {
        let schema = schema();
        let (_writer, reader) = index(&schema, &[]);
        let p = || QueryParser::new(&schema, reader.as_ref());

        // Falls back to plain words.
        assert_eq!(parse_with(p(), "NOT dog"), "(not AND dog)");
        assert_eq!(
            parse_with(p().with_flags(QueryFlags::default() | QueryFlags::PURE_NOT), "NOT dog"),
            "(<alldocuments> AND_NOT dog)"
        );
    }

    #[test]
    fn test_field_prefixes() {
        let schema = schema();
        let (_writer, reader) = index(&schema, &[]);
        let p = || QueryParser::new(&schema, reader.as_ref());

        assert_eq!(parse_with(p(), "title:dog"), "XTITLEdog");
        // Unknown fields stay part of the word.
        assert_eq!(parse_with(p(), "author:smith"), "author:smith");
        assert_eq!(parse_with(p().with_fields(["content"]), "title:dog"), "title:dog");
        assert_eq!(
            parse_with(p(), "title:\"red fox\""),
            "(XTITLEred PHRASE XTITLEfox)"
        );
        assert_eq!(
            parse_with(p(), "cat status:active status:new"),
            "(cat FILTER (XSTATUSactive OR XSTATUSnew))"
        );
        assert_eq!(
            parse_with(p(), "status:active"),
            "(<alldocuments> FILTER XSTATUSactive)"
        );
    }

    #[test]
    fn test_typed_boolean_field() {
        let schema = Schema::builder()
            .add_text_field("content")
            .add_field("flag", FieldOption::boolean().with_type(FieldType::Boolean))
            .build();
        let (_writer, reader) = index(&schema, &[]);
        let p = || QueryParser::new(&schema, reader.as_ref());

        assert_eq!(parse_with(p(), "cow flag:yes"), "(cow FILTER XFLAGtrue)");
        assert_eq!(parse_with(p(), "cow flag:n"), "(cow FILTER XFLAGfalse)");
        // Values that do not convert are looked up as written.
        assert_eq!(parse_with(p(), "cow flag:maybe"), "(cow FILTER XFLAGmaybe)");
    }

    #[test]
    fn test_ranges() {
        let schema = schema();
        let (_writer, reader) = index(&schema, &[]);
        let p = || QueryParser::new(&schema, reader.as_ref());

        let parsed = p().parse("age:30..40").unwrap().predicate;
        let Predicate::Filter(base, range) = parsed else {
            panic!("expected a filter");
        };
        assert_eq!(*base, Predicate::MatchAll);
        assert!(matches!(*range, Predicate::ValueRange { lo: Some(_), hi: Some(_), .. }));

        let parsed = p().parse("cheap $10..").unwrap().predicate;
        let Predicate::Filter(base, range) = parsed else {
            panic!("expected a filter");
        };
        assert_eq!(*base, Predicate::term("cheap"));
        assert!(matches!(*range, Predicate::ValueRange { hi: None, .. }));

        // Unmatched ranges are text.
        assert_eq!(parse_with(p(), "10..50"), "(10 PHRASE 50)");
    }

    #[test]
    fn test_wildcards() {
        let schema = schema();
        let (_writer, reader) = index(&schema, &["fox foxes fog"]);
        let p = || QueryParser::new(&schema, reader.as_ref());

        assert_eq!(parse_with(p(), "fox*"), "(fox OR foxes)");
        assert_eq!(parse_with(p(), "zebra*"), "<nothing>");
        assert_eq!(parse_with(p(), "content:fo*"), "(XCONTENTfog OR XCONTENTfox OR XCONTENTfoxes)");
    }

    #[test]
    fn test_stopwords() {
        let schema = schema();
        let (_writer, reader) = index(&schema, &[]);
        let stopper: Arc<dyn Stopper> = Arc::new(WordListStopper::for_language("english").unwrap());
        let p = || QueryParser::new(&schema, reader.as_ref()).with_stopper(Some(stopper.clone()));

        assert_eq!(parse_with(p(), "the cat"), "cat");
        assert_eq!(parse_with(p(), "the"), "the");
        assert_eq!(parse_with(p(), "\"the cat\""), "(the PHRASE cat)");
    }

    #[test]
    fn test_stemming() {
        let schema = schema();
        let (_writer, reader) = index(&schema, &[]);
        let stemmer: Arc<dyn Stemmer> = Arc::new(|w: &str| w.trim_end_matches('s').to_string());
        let p = |strategy| {
            QueryParser::new(&schema, reader.as_ref())
                .with_stemmer(Some(stemmer.clone()))
                .with_stem_strategy(strategy)
        };

        assert_eq!(parse_with(p(StemStrategy::Some), "dogs Cats"), "(Zdog AND cats)");
        assert_eq!(parse_with(p(StemStrategy::All), "dogs Cats"), "(Zdog AND Zcat)");
        assert_eq!(parse_with(p(StemStrategy::None), "dogs"), "dogs");
        assert_eq!(parse_with(p(StemStrategy::Some), "\"dogs\""), "dogs");
    }

    #[test]
    fn test_spelling_correction() {
        let schema = schema();
        let (_writer, reader) = index(&schema, &["spelling is hard"]);
        let parsed = QueryParser::new(&schema, reader.as_ref())
            .parse("Speling is hard")
            .unwrap();
        assert_eq!(parsed.corrected_query.as_deref(), Some("spelling is hard"));

        let parsed = QueryParser::new(&schema, reader.as_ref())
            .parse("spelling")
            .unwrap();
        assert_eq!(parsed.corrected_query, None);
    }

    #[test]
    fn test_synonyms() {
        let schema = schema();
        let (mut writer, reader) = index(&schema, &["cattle"]);
        writer.add_synonym("cow", "cattle").unwrap();
        let p = QueryParser::new(&schema, reader.as_ref())
            .with_flags(QueryFlags::default() | QueryFlags::SYNONYM);
        assert_eq!(parse_with(p, "cow"), "(cow SYNONYM cattle)");
    }

    #[test]
    fn test_syntax_errors_fall_back() {
        let schema = schema();
        let (_writer, reader) = index(&schema, &[]);
        let p = || QueryParser::new(&schema, reader.as_ref());

        assert_eq!(parse_with(p(), "(cow dog"), "(cow AND dog)");
        assert_eq!(parse_with(p(), "cow AND"), "(cow AND and)");
        assert_eq!(parse_with(p(), ""), "<nothing>");
    }
}
