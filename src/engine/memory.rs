//! The bundled in-process engine.
//!
//! Documents live in memory and queries are evaluated exhaustively over
//! per-term posting sets. Without a path, the writer and every reader share
//! one live index. With a path, the writer persists a JSON snapshot
//! (`sorrel-index.json`) on flush and commit, and readers see only the
//! last snapshot they loaded.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::analysis::stopper::{WordListStopper, canonical_language, has_stopwords};
use crate::analysis::{Stemmer, Stopper};
use crate::engine::weight::{Bm25, CollectionStats};
use crate::engine::{
    DocIdOrder, EngineDocument, Enquire, IndexEngine, Match, MatchSet, OpenMode, Predicate,
    Reader, SortOrder, Writer,
};
use crate::error::{Result, SorrelError};
use crate::spelling::SpellingDictionary;

/// File name of the on-disk snapshot inside the index directory.
pub const SNAPSHOT_FILE: &str = "sorrel-index.json";

type Scores = BTreeMap<u32, f64>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct MemoryIndex {
    documents: BTreeMap<u32, EngineDocument>,
    last_id: u32,
    synonyms: BTreeMap<String, BTreeSet<String>>,
    spelling: SpellingDictionary,
    #[serde(skip)]
    postings: BTreeMap<String, BTreeSet<u32>>,
    #[serde(skip)]
    total_length: u64,
}

impl MemoryIndex {
    fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SNAPSHOT_FILE);
        if !path.exists() {
            return Err(SorrelError::engine(format!(
                "no index found at {}",
                dir.display()
            )));
        }
        let file = fs::File::open(&path)?;
        let mut index: MemoryIndex = serde_json::from_reader(BufReader::new(file))?;
        index.rebuild();
        Ok(index)
    }

    fn save(&self, dir: &Path) -> Result<()> {
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(dir.join(SNAPSHOT_FILE))
            .map_err(|e| SorrelError::Io(e.error))?;
        Ok(())
    }

    fn rebuild(&mut self) {
        self.postings.clear();
        self.total_length = 0;
        for (id, doc) in &self.documents {
            for term in doc.terms.keys() {
                self.postings.entry(term.clone()).or_default().insert(*id);
            }
            self.total_length += doc.length();
        }
    }

    fn insert(&mut self, id: u32, doc: EngineDocument) {
        self.remove(id);
        for term in doc.terms.keys() {
            self.postings.entry(term.clone()).or_default().insert(id);
        }
        self.total_length += doc.length();
        self.last_id = self.last_id.max(id);
        self.documents.insert(id, doc);
    }

    fn add_synonym(&mut self, term: &str, synonym: &str) {
        self.synonyms
            .entry(term.to_string())
            .or_default()
            .insert(synonym.to_string());
    }

    fn remove(&mut self, id: u32) -> Option<EngineDocument> {
        let doc = self.documents.remove(&id)?;
        for term in doc.terms.keys() {
            if let Some(ids) = self.postings.get_mut(term) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
        self.total_length -= doc.length();
        Some(doc)
    }

    fn stats(&self) -> CollectionStats {
        let doc_count = self.documents.len() as u64;
        CollectionStats {
            doc_count,
            avg_length: if doc_count == 0 {
                0.0
            } else {
                self.total_length as f64 / doc_count as f64
            },
        }
    }

    fn term_freq(&self, term: &str) -> u64 {
        self.postings.get(term).map_or(0, |ids| ids.len() as u64)
    }

    fn terms_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.postings
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(term, _)| term.starts_with(prefix))
            .map(|(term, _)| term.clone())
            .collect()
    }

    fn document(&self, id: u32) -> Result<&EngineDocument> {
        self.documents.get(&id).ok_or(SorrelError::DocNotFound(id))
    }

    fn term_scores(&self, term: &str, wqf: u32, stats: &CollectionStats, bm25: &Bm25) -> Scores {
        let Some(ids) = self.postings.get(term) else {
            return Scores::new();
        };
        let df = ids.len() as u64;
        ids.iter()
            .filter_map(|id| {
                let doc = self.documents.get(id)?;
                let wdf = doc.terms.get(term).map_or(0, |p| p.wdf);
                Some((*id, bm25.weight(stats, df, wdf, doc.length(), wqf)))
            })
            .collect()
    }

    fn evaluate(&self, predicate: &Predicate, stats: &CollectionStats, bm25: &Bm25) -> Scores {
        match predicate {
            Predicate::MatchAll => self.documents.keys().map(|id| (*id, 0.0)).collect(),
            Predicate::MatchNothing => Scores::new(),
            Predicate::Term { term, wqf } => self.term_scores(term, *wqf, stats, bm25),
            Predicate::Phrase { terms, window } => {
                let items: Vec<Predicate> = terms.iter().map(Predicate::term).collect();
                let mut scores = intersect(self.evaluate_all(&items, stats, bm25));
                let window = window.unwrap_or(terms.len() as u32);
                scores.retain(|id, _| {
                    self.documents
                        .get(id)
                        .is_some_and(|doc| phrase_matches(doc, terms, window))
                });
                scores
            }
            Predicate::And(items) => intersect(self.evaluate_all(items, stats, bm25)),
            Predicate::Or(items) => {
                let mut out = Scores::new();
                for scores in self.evaluate_all(items, stats, bm25) {
                    for (id, w) in scores {
                        *out.entry(id).or_insert(0.0) += w;
                    }
                }
                out
            }
            Predicate::Xor(items) => {
                let mut hits: BTreeMap<u32, (usize, f64)> = BTreeMap::new();
                for scores in self.evaluate_all(items, stats, bm25) {
                    for (id, w) in scores {
                        let hit = hits.entry(id).or_insert((0, 0.0));
                        hit.0 += 1;
                        hit.1 += w;
                    }
                }
                hits.into_iter()
                    .filter(|(_, (count, _))| count % 2 == 1)
                    .map(|(id, (_, w))| (id, w))
                    .collect()
            }
            Predicate::AndNot(left, right) => {
                let mut out = self.evaluate(left, stats, bm25);
                let excluded = self.evaluate(right, stats, bm25);
                out.retain(|id, _| !excluded.contains_key(id));
                out
            }
            Predicate::AndMaybe(left, right) => {
                let mut out = self.evaluate(left, stats, bm25);
                let optional = self.evaluate(right, stats, bm25);
                for (id, w) in out.iter_mut() {
                    if let Some(extra) = optional.get(id) {
                        *w += extra;
                    }
                }
                out
            }
            Predicate::Filter(left, right) => {
                let mut out = self.evaluate(left, stats, bm25);
                let allowed = self.evaluate(right, stats, bm25);
                out.retain(|id, _| allowed.contains_key(id));
                out
            }
            Predicate::Synonym(items) => {
                let mut out = Scores::new();
                for scores in self.evaluate_all(items, stats, bm25) {
                    for (id, w) in scores {
                        let entry = out.entry(id).or_insert(0.0);
                        *entry = entry.max(w);
                    }
                }
                out
            }
            Predicate::ValueRange { slot, lo, hi } => self
                .documents
                .iter()
                .filter(|(_, doc)| {
                    doc.value(*slot).is_some_and(|v| {
                        !v.is_empty()
                            && lo.as_deref().is_none_or(|lo| v >= lo)
                            && hi.as_deref().is_none_or(|hi| v <= hi)
                    })
                })
                .map(|(id, _)| (*id, 0.0))
                .collect(),
        }
    }

    fn evaluate_all(&self, items: &[Predicate], stats: &CollectionStats, bm25: &Bm25) -> Vec<Scores> {
        items.iter().map(|p| self.evaluate(p, stats, bm25)).collect()
    }

    fn run(&self, enquire: &Enquire, bm25: &Bm25) -> MatchSet {
        let stats = self.stats();
        let scores = self.evaluate(&enquire.query, &stats, bm25);

        let mut ranked: Vec<Match> = scores
            .into_iter()
            .map(|(doc_id, weight)| Match { doc_id, weight })
            .collect();

        let docid_cmp = |a: u32, b: u32| match enquire.docid_order {
            DocIdOrder::Ascending => a.cmp(&b),
            DocIdOrder::Descending => b.cmp(&a),
        };
        match enquire.sort {
            SortOrder::Relevance => ranked.sort_by(|a, b| {
                b.weight
                    .total_cmp(&a.weight)
                    .then_with(|| docid_cmp(a.doc_id, b.doc_id))
            }),
            SortOrder::Value { slot, reverse } => {
                let key = |id: u32| {
                    self.documents
                        .get(&id)
                        .and_then(|doc| doc.value(slot))
                        .unwrap_or_default()
                };
                ranked.sort_by(|a, b| {
                    let by_value = key(a.doc_id).cmp(key(b.doc_id));
                    let by_value = if reverse { by_value.reverse() } else { by_value };
                    by_value.then_with(|| docid_cmp(a.doc_id, b.doc_id))
                });
            }
        }

        if let Some(slot) = enquire.collapse_slot {
            let mut seen: BTreeSet<Vec<u8>> = BTreeSet::new();
            ranked.retain(|m| {
                match self.documents.get(&m.doc_id).and_then(|d| d.value(slot)) {
                    Some(v) if !v.is_empty() => seen.insert(v.to_vec()),
                    _ => true,
                }
            });
        }

        let mut facet_counts = std::collections::HashMap::new();
        for slot in &enquire.facet_slots {
            let mut counts: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
            for m in &ranked {
                if let Some(v) = self.documents.get(&m.doc_id).and_then(|d| d.value(*slot))
                    && !v.is_empty()
                {
                    *counts.entry(v.to_vec()).or_insert(0) += 1;
                }
            }
            facet_counts.insert(*slot, counts);
        }

        let estimated_total = ranked.len() as u64;
        let matches = ranked
            .into_iter()
            .skip(enquire.offset)
            .take(enquire.limit)
            .collect();

        MatchSet {
            matches,
            estimated_total,
            facet_counts,
        }
    }
}

fn intersect(mut sets: Vec<Scores>) -> Scores {
    if sets.is_empty() {
        return Scores::new();
    }
    sets.sort_by_key(|s| s.len());
    let mut iter = sets.into_iter();
    let mut out = iter.next().unwrap_or_default();
    for scores in iter {
        out.retain(|id, w| match scores.get(id) {
            Some(extra) => {
                *w += extra;
                true
            }
            None => false,
        });
    }
    out
}

/// Whether `terms` occur in order with every term within `window`
/// positions of the first one.
///
/// Documents indexed without positions match whenever they hold all terms.
fn phrase_matches(doc: &EngineDocument, terms: &[String], window: u32) -> bool {
    let lists: Vec<&[u32]> = terms
        .iter()
        .map(|t| doc.terms.get(t).map_or(&[][..], |p| p.positions.as_slice()))
        .collect();
    if lists.iter().any(|positions| positions.is_empty()) {
        return true;
    }
    let window = window.max(terms.len() as u32);
    lists[0].iter().any(|&start| {
        let mut prev = start;
        lists[1..].iter().all(|positions| {
            match positions.iter().find(|&&p| p > prev) {
                Some(&p) if p < start + window => {
                    prev = p;
                    true
                }
                _ => false,
            }
        })
    })
}

/// A read handle.
pub struct MemoryReader {
    index: Arc<RwLock<MemoryIndex>>,
    path: Option<PathBuf>,
    bm25: Bm25,
}

impl Reader for MemoryReader {
    fn doc_count(&self) -> Result<u64> {
        Ok(self.index.read().documents.len() as u64)
    }

    fn document(&self, id: u32) -> Result<EngineDocument> {
        self.index.read().document(id).cloned()
    }

    fn term_list(&self, id: u32) -> Result<Vec<String>> {
        Ok(self.index.read().document(id)?.term_list())
    }

    fn term_freq(&self, term: &str) -> Result<u64> {
        Ok(self.index.read().term_freq(term))
    }

    fn terms_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self.index.read().terms_with_prefix(prefix))
    }

    fn synonyms(&self, term: &str) -> Result<Vec<String>> {
        Ok(self
            .index
            .read()
            .synonyms
            .get(term)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn spelling_suggestion(&self, word: &str) -> Result<Option<String>> {
        Ok(self.index.read().spelling.suggest(word))
    }

    fn run_query(&self, enquire: &Enquire) -> Result<MatchSet> {
        Ok(self.index.read().run(enquire, &self.bm25))
    }

    fn reopen(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            let fresh = MemoryIndex::load(path)?;
            *self.index.write() = fresh;
            log::debug!("reopened index snapshot at {}", path.display());
        }
        Ok(())
    }
}

enum Op {
    Put(u32, EngineDocument),
    Delete(u32),
    Synonym(String, String),
    Spelling(String, u64),
}

struct Transaction {
    ops: Vec<Op>,
    next_id: u32,
}

/// A write handle.
pub struct MemoryWriter {
    reader: MemoryReader,
    transaction: Option<Transaction>,
}

impl MemoryWriter {
    fn exists_pending(&self, txn: &Transaction, id: u32) -> bool {
        let mut exists = self.reader.index.read().documents.contains_key(&id);
        for op in &txn.ops {
            match op {
                Op::Put(op_id, _) if *op_id == id => exists = true,
                Op::Delete(op_id) if *op_id == id => exists = false,
                _ => {}
            }
        }
        exists
    }

    fn persist(&self) -> Result<()> {
        if let Some(path) = &self.reader.path {
            self.reader.index.read().save(path)?;
            log::debug!("wrote index snapshot to {}", path.display());
        }
        Ok(())
    }
}

impl Reader for MemoryWriter {
    fn doc_count(&self) -> Result<u64> {
        self.reader.doc_count()
    }

    fn document(&self, id: u32) -> Result<EngineDocument> {
        self.reader.document(id)
    }

    fn term_list(&self, id: u32) -> Result<Vec<String>> {
        self.reader.term_list(id)
    }

    fn term_freq(&self, term: &str) -> Result<u64> {
        self.reader.term_freq(term)
    }

    fn terms_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.reader.terms_with_prefix(prefix)
    }

    fn synonyms(&self, term: &str) -> Result<Vec<String>> {
        self.reader.synonyms(term)
    }

    fn spelling_suggestion(&self, word: &str) -> Result<Option<String>> {
        self.reader.spelling_suggestion(word)
    }

    fn run_query(&self, enquire: &Enquire) -> Result<MatchSet> {
        self.reader.run_query(enquire)
    }

    fn reopen(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Writer for MemoryWriter {
    fn add_document(&mut self, document: EngineDocument) -> Result<u32> {
        if let Some(txn) = self.transaction.as_mut() {
            let id = txn.next_id;
            txn.next_id += 1;
            txn.ops.push(Op::Put(id, document));
            return Ok(id);
        }
        let mut index = self.reader.index.write();
        let id = index
            .last_id
            .checked_add(1)
            .ok_or_else(|| SorrelError::engine("document ids exhausted"))?;
        index.insert(id, document);
        Ok(id)
    }

    fn replace_document(&mut self, id: u32, document: EngineDocument) -> Result<()> {
        if id == 0 {
            return Err(SorrelError::invalid_argument("document id 0 is invalid"));
        }
        if let Some(txn) = self.transaction.as_mut() {
            txn.next_id = txn.next_id.max(id.saturating_add(1));
            txn.ops.push(Op::Put(id, document));
            return Ok(());
        }
        self.reader.index.write().insert(id, document);
        Ok(())
    }

    fn delete_document(&mut self, id: u32) -> Result<()> {
        if let Some(txn) = self.transaction.take() {
            let exists = self.exists_pending(&txn, id);
            let txn = self.transaction.insert(txn);
            if !exists {
                return Err(SorrelError::DocNotFound(id));
            }
            txn.ops.push(Op::Delete(id));
            return Ok(());
        }
        self.reader
            .index
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or(SorrelError::DocNotFound(id))
    }

    fn add_synonym(&mut self, term: &str, synonym: &str) -> Result<()> {
        if let Some(txn) = self.transaction.as_mut() {
            txn.ops.push(Op::Synonym(term.to_string(), synonym.to_string()));
            return Ok(());
        }
        self.reader.index.write().add_synonym(term, synonym);
        Ok(())
    }

    fn add_spelling(&mut self, word: &str, freq_inc: u64) -> Result<()> {
        if let Some(txn) = self.transaction.as_mut() {
            txn.ops.push(Op::Spelling(word.to_string(), freq_inc));
            return Ok(());
        }
        self.reader.index.write().spelling.add_word(word, freq_inc);
        Ok(())
    }

    fn begin_transaction(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Err(SorrelError::invalid_operation(
                "a transaction is already in progress",
            ));
        }
        let next_id = self.reader.index.read().last_id.saturating_add(1);
        self.transaction = Some(Transaction {
            ops: Vec::new(),
            next_id,
        });
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<()> {
        let txn = self
            .transaction
            .take()
            .ok_or_else(|| SorrelError::invalid_operation("no transaction in progress"))?;
        {
            let mut index = self.reader.index.write();
            for op in txn.ops {
                match op {
                    Op::Put(id, doc) => index.insert(id, doc),
                    Op::Delete(id) => {
                        index.remove(id);
                    }
                    Op::Synonym(term, synonym) => index.add_synonym(&term, &synonym),
                    Op::Spelling(word, freq) => index.spelling.add_word(&word, freq),
                }
            }
        }
        self.persist()
    }

    fn cancel_transaction(&mut self) -> Result<()> {
        self.transaction
            .take()
            .map(|txn| log::debug!("discarded {} pending operations", txn.ops.len()))
            .ok_or_else(|| SorrelError::invalid_operation("no transaction in progress"))
    }

    fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    fn flush(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Err(SorrelError::concurrency(
                "cannot flush while a transaction is in progress",
            ));
        }
        self.persist()
    }

    fn shared_reader(&self) -> Option<Box<dyn Reader>> {
        if self.reader.path.is_some() {
            return None;
        }
        Some(Box::new(MemoryReader {
            index: self.reader.index.clone(),
            path: None,
            bm25: self.reader.bm25,
        }))
    }
}

/// Engine keeping indexes in process memory, optionally snapshotted to disk.
pub struct MemoryEngine {
    bm25: Bm25,
    stemmers: AHashMap<String, Arc<dyn Stemmer>>,
    stoppers: AHashMap<String, Arc<dyn Stopper>>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            bm25: Bm25::default(),
            stemmers: AHashMap::new(),
            stoppers: AHashMap::new(),
        }
    }

    pub fn with_bm25(mut self, bm25: Bm25) -> Self {
        self.bm25 = bm25;
        self
    }

    /// Register a stemmer for a language.
    pub fn with_stemmer(mut self, language: &str, stemmer: impl Stemmer + 'static) -> Self {
        self.stemmers
            .insert(canonical_language(language), Arc::new(stemmer));
        self
    }

    /// Register a stopper for a language, replacing the bundled list.
    pub fn with_stopper(mut self, language: &str, stopper: impl Stopper + 'static) -> Self {
        self.stoppers
            .insert(canonical_language(language), Arc::new(stopper));
        self
    }

    fn supports(&self, language: &str) -> bool {
        has_stopwords(language)
            || self.stoppers.contains_key(language)
            || self.stemmers.contains_key(language)
    }
}

impl IndexEngine for MemoryEngine {
    fn open_read_write(&self, path: Option<&Path>, mode: OpenMode) -> Result<Box<dyn Writer>> {
        let index = match path {
            None => MemoryIndex::default(),
            Some(dir) => {
                let exists = dir.join(SNAPSHOT_FILE).exists();
                match mode {
                    OpenMode::Open => MemoryIndex::load(dir)?,
                    OpenMode::CreateOrOpen if exists => MemoryIndex::load(dir)?,
                    OpenMode::CreateOrOpen | OpenMode::CreateOrOverwrite => {
                        fs::create_dir_all(dir)?;
                        let index = MemoryIndex::default();
                        index.save(dir)?;
                        index
                    }
                }
            }
        };
        log::debug!(
            "opened writable index ({})",
            path.map_or("in memory".to_string(), |p| p.display().to_string())
        );
        Ok(Box::new(MemoryWriter {
            reader: MemoryReader {
                index: Arc::new(RwLock::new(index)),
                path: path.map(Path::to_path_buf),
                bm25: self.bm25,
            },
            transaction: None,
        }))
    }

    fn open_read_only(&self, path: &Path) -> Result<Box<dyn Reader>> {
        let index = MemoryIndex::load(path)?;
        log::debug!("opened read-only index at {}", path.display());
        Ok(Box::new(MemoryReader {
            index: Arc::new(RwLock::new(index)),
            path: Some(path.to_path_buf()),
            bm25: self.bm25,
        }))
    }

    fn stopper(&self, language: &str) -> Result<Arc<dyn Stopper>> {
        let language = canonical_language(language);
        if let Some(stopper) = self.stoppers.get(&language) {
            return Ok(stopper.clone());
        }
        Ok(Arc::new(WordListStopper::for_language(&language)?))
    }

    fn stemmer(&self, language: &str) -> Result<Option<Arc<dyn Stemmer>>> {
        let language = canonical_language(language);
        if let Some(stemmer) = self.stemmers.get(&language) {
            return Ok(Some(stemmer.clone()));
        }
        if self.supports(&language) {
            Ok(None)
        } else {
            Err(SorrelError::unsupported_language(language))
        }
    }
}
