//! The document store.
//!
//! A [`Store`] owns the schema, the language components and two engine
//! handles: a writer for additions, deletions and transactions, and a
//! reader for lookups and searches. The reader only sees what has been
//! flushed or committed as of its last [`Store::reopen`]; `flush` and
//! transaction commits reopen it before returning. Stores without a path
//! share one live index between both handles.
//!
//! ```text
//! Unopened --open--> Open --close--> Closed
//! ```
//!
//! The writer is opened on the transition to `Open`, the reader on first
//! use.

pub mod config;

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock, RwLockWriteGuard};

use crate::analysis::{LanguageCache, Stemmer, Stopper, normalize};
use crate::codec::ID_ORDER_SLOT;
use crate::document::Document;
use crate::engine::memory::MemoryEngine;
use crate::engine::{
    DocIdOrder, Enquire, IndexEngine, Predicate, Reader, SortOrder, Writer,
};
use crate::error::{Result, SorrelError};
use crate::indexer::Indexer;
use crate::schema::Schema;
use crate::search::{ResultPage, SearchRequest, Searcher};

pub use config::{SearchDefaults, StoreConfig, StoreConfigBuilder};

/// Lifecycle state of a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Unopened,
    Open,
    Closed,
}

/// A handle to a document store. Clones share the same store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    config: StoreConfig,
    schema: Schema,
    languages: LanguageCache,
    engine: Arc<dyn IndexEngine>,
    state: RwLock<StoreState>,
    writer: Mutex<Option<Box<dyn Writer>>>,
    reader: RwLock<Option<Box<dyn Reader>>>,
    transaction_lock: ReentrantMutex<()>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.inner.config.path)
            .field("state", &*self.inner.state.read())
            .field("fields", &self.inner.schema.len())
            .finish()
    }
}

fn closed() -> SorrelError {
    SorrelError::invalid_operation("store is closed")
}

impl Store {
    /// Open a store backed by the bundled [`MemoryEngine`].
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::open_with_engine(config, Arc::new(MemoryEngine::new()))
    }

    pub fn open_with_engine(config: StoreConfig, engine: Arc<dyn IndexEngine>) -> Result<Self> {
        let store = Self::new(config, engine)?;
        store.connect()?;
        Ok(store)
    }

    /// Create an unopened store.
    ///
    /// Fails with `Config` for an unusable field declaration, and with
    /// `UnsupportedLanguage` if the configured stemmer or stopper language
    /// is unknown to the engine.
    pub fn new(config: StoreConfig, engine: Arc<dyn IndexEngine>) -> Result<Self> {
        let schema = Schema::resolve(&config.fields);
        schema.validate()?;

        let languages = LanguageCache::new(engine.clone());
        if let Some(language) = config.stemmer_language() {
            languages.stemmer(language)?;
        }
        if let Some(language) = config.stopper_language() {
            languages.stopper(language)?;
        }

        Ok(Self {
            inner: Arc::new(StoreInner {
                config,
                schema,
                languages,
                engine,
                state: RwLock::new(StoreState::Unopened),
                writer: Mutex::new(None),
                reader: RwLock::new(None),
                transaction_lock: ReentrantMutex::new(()),
            }),
        })
    }

    /// Open the writable handle. A no-op on an open store.
    pub fn connect(&self) -> Result<()> {
        let mut state = self.inner.state.write();
        match *state {
            StoreState::Open => return Ok(()),
            StoreState::Closed => return Err(closed()),
            StoreState::Unopened => {}
        }
        let config = &self.inner.config;
        let writer = self
            .inner
            .engine
            .open_read_write(config.path.as_deref(), config.mode)?;
        *self.inner.writer.lock() = Some(writer);
        *state = StoreState::Open;
        log::debug!("store opened ({:?})", config.path);
        Ok(())
    }

    pub fn state(&self) -> StoreState {
        *self.inner.state.read()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state() {
            StoreState::Open => Ok(()),
            StoreState::Unopened => self.connect(),
            StoreState::Closed => Err(closed()),
        }
    }

    fn with_writer<T>(&self, f: impl FnOnce(&mut dyn Writer) -> Result<T>) -> Result<T> {
        self.ensure_open()?;
        let mut guard = self.inner.writer.lock();
        let writer = guard.as_mut().ok_or_else(closed)?;
        f(writer.as_mut())
    }

    fn with_reader<T>(&self, f: impl FnOnce(&dyn Reader) -> Result<T>) -> Result<T> {
        self.ensure_open()?;
        {
            let guard = self.inner.reader.read();
            if let Some(reader) = guard.as_ref() {
                return f(reader.as_ref());
            }
        }

        let mut guard = self.inner.reader.write();
        if guard.is_none() {
            *guard = Some(self.open_reader()?);
        }
        let guard = RwLockWriteGuard::downgrade(guard);
        let reader = guard.as_ref().ok_or_else(closed)?;
        f(reader.as_ref())
    }

    fn open_reader(&self) -> Result<Box<dyn Reader>> {
        let shared = self
            .inner
            .writer
            .lock()
            .as_ref()
            .and_then(|writer| writer.shared_reader());
        if let Some(reader) = shared {
            return Ok(reader);
        }
        match &self.inner.config.path {
            Some(path) => {
                log::debug!("opening read-only handle at {}", path.display());
                self.inner.engine.open_read_only(path)
            }
            None => Err(SorrelError::engine(
                "engine provides no reader for an in-memory index",
            )),
        }
    }

    fn stemmer(&self) -> Result<Option<Arc<dyn Stemmer>>> {
        match self.inner.config.stemmer_language() {
            Some(language) => self.inner.languages.stemmer(language),
            None => Ok(None),
        }
    }

    fn stopper(&self) -> Result<Option<Arc<dyn Stopper>>> {
        self.inner
            .config
            .stopper_language()
            .map(|language| self.inner.languages.stopper(language))
            .transpose()
    }

    fn indexer(&self) -> Result<Indexer<'_>> {
        let config = &self.inner.config;
        Ok(Indexer::new(&self.inner.schema)
            .with_stemmer(self.stemmer()?)
            .with_stopper(self.stopper()?)
            .with_positions(config.index_positions)
            .with_spelling(config.spelling))
    }

    /// Index `doc`, adding it under a fresh id or replacing the document
    /// at its id. Sets the document's id and store handle.
    pub fn add(&self, doc: &mut Document) -> Result<u32> {
        let indexed = self.indexer()?.index(&doc.fields, doc.data())?;
        let spelling = self.inner.config.spelling;
        let explicit_id = doc.id;

        let id = self.with_writer(|writer| {
            let id = match explicit_id {
                Some(id) => {
                    writer.replace_document(id, indexed.document)?;
                    id
                }
                None => writer.add_document(indexed.document)?,
            };
            if spelling {
                for (word, freq) in &indexed.spellings {
                    writer.add_spelling(word, *freq)?;
                }
            }
            Ok(id)
        })?;

        doc.attach(id, self.clone());
        Ok(id)
    }

    /// Fails with `DocNotFound` for an unknown id.
    pub fn find(&self, id: u32) -> Result<Document> {
        self.with_reader(|reader| {
            let record = reader.document(id)?;
            Ok(Document::from_record(
                id,
                None,
                record,
                &self.inner.schema,
                Some(self.clone()),
            ))
        })
    }

    /// Like [`find`](Store::find), with `None` for an unknown id.
    pub fn get(&self, id: u32) -> Result<Option<Document>> {
        match self.find(id) {
            Ok(doc) => Ok(Some(doc)),
            Err(SorrelError::DocNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete a document. Returns the id if it existed.
    pub fn delete(&self, id: u32) -> Result<Option<u32>> {
        self.with_writer(|writer| match writer.delete_document(id) {
            Ok(()) => Ok(Some(id)),
            Err(SorrelError::DocNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        })
    }

    /// Number of documents visible to the reader.
    pub fn size(&self) -> Result<u64> {
        self.with_reader(|reader| reader.doc_count())
    }

    pub(crate) fn term_list(&self, id: u32) -> Result<Vec<String>> {
        self.with_reader(|reader| reader.term_list(id))
    }

    /// Persist pending writes and reopen the reader.
    ///
    /// Fails with `Concurrency` while a transaction is in progress.
    pub fn flush(&self) -> Result<()> {
        if self.inner.transaction_lock.is_locked() {
            return Err(SorrelError::concurrency(
                "cannot flush while a transaction is in progress",
            ));
        }
        self.with_writer(|writer| writer.flush())?;
        log::debug!("store flushed");
        self.reopen()
    }

    /// Bring the reader up to date with the last flush or commit.
    pub fn reopen(&self) -> Result<()> {
        self.ensure_open()?;
        if let Some(reader) = self.inner.reader.write().as_mut() {
            reader.reopen()?;
        }
        Ok(())
    }

    /// Run `f` inside a write transaction.
    ///
    /// Only one transaction runs at a time per store; other threads block
    /// until it finishes. If `f` returns an error the transaction is
    /// cancelled, the reader reopened, and the error returned. Otherwise
    /// the transaction is committed and the reader reopened.
    pub fn transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Store) -> std::result::Result<T, E>,
        E: From<SorrelError>,
    {
        let _guard = self.inner.transaction_lock.lock();
        self.with_writer(|writer| writer.begin_transaction())?;

        match f(self) {
            Ok(value) => {
                self.with_writer(|writer| writer.commit_transaction())?;
                log::debug!("transaction committed");
                self.reopen()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(cancel) = self.with_writer(|writer| writer.cancel_transaction()) {
                    log::warn!("failed to cancel transaction: {cancel}");
                }
                if let Err(reopen) = self.reopen() {
                    log::warn!("failed to reopen reader after rollback: {reopen}");
                }
                log::debug!("transaction rolled back");
                Err(e)
            }
        }
    }

    /// Flush and release both handles. Further operations fail.
    pub fn close(&self) -> Result<()> {
        let mut state = self.inner.state.write();
        if *state == StoreState::Closed {
            return Ok(());
        }
        let writer = self.inner.writer.lock().take();
        let flushed = match writer {
            Some(mut writer) if !writer.in_transaction() => writer.flush(),
            _ => Ok(()),
        };
        self.inner.reader.write().take();
        *state = StoreState::Closed;
        log::debug!("store closed");
        flushed
    }

    /// Register `synonym` as an alternative for `term` in queries.
    pub fn add_synonym(&self, term: &str, synonym: &str) -> Result<()> {
        self.with_writer(|writer| writer.add_synonym(&normalize(term), &normalize(synonym)))
    }

    /// The document with the highest id.
    pub fn max_by_id(&self) -> Result<Option<Document>> {
        let enquire = Enquire::new(Predicate::MatchAll)
            .with_range(0, 1)
            .with_sort(SortOrder::Value {
                slot: ID_ORDER_SLOT,
                reverse: true,
            })
            .with_docid_order(DocIdOrder::Descending);
        self.first_match(&enquire)
    }

    /// The document with the highest value in a sortable field.
    pub fn max_by_value(&self, field: &str) -> Result<Option<Document>> {
        if !self.inner.schema.get(field).is_some_and(|o| o.sortable) {
            return Err(SorrelError::invalid_argument(format!(
                "field '{field}' is not sortable"
            )));
        }
        let enquire = Enquire::new(Predicate::MatchAll)
            .with_range(0, 1)
            .with_sort(SortOrder::Value {
                slot: Schema::slot(field),
                reverse: true,
            })
            .with_docid_order(DocIdOrder::Descending);
        self.first_match(&enquire)
    }

    fn first_match(&self, enquire: &Enquire) -> Result<Option<Document>> {
        self.with_reader(|reader| {
            let matches = reader.run_query(enquire)?;
            matches
                .matches
                .first()
                .map(|m| {
                    let record = reader.document(m.doc_id)?;
                    Ok(Document::from_record(
                        m.doc_id,
                        None,
                        record,
                        &self.inner.schema,
                        Some(self.clone()),
                    ))
                })
                .transpose()
        })
    }

    pub fn search(&self, request: impl Into<SearchRequest>) -> Result<ResultPage> {
        let request = request.into();
        let stemmer = self.stemmer()?;
        let stopper = self.stopper()?;
        self.with_reader(|reader| {
            Searcher::new(
                &self.inner.schema,
                reader,
                &self.inner.config.default_search,
            )
            .with_stemmer(stemmer)
            .with_stopper(stopper)
            .search(&request, Some(self))
        })
    }
}
