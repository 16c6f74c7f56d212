//! Per-store memoization of language components.
//!
//! Engines may build stoppers and stemmers lazily and expensively; a
//! [`LanguageCache`] keeps the ones already handed out for as long as the
//! store that owns it lives.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::analysis::stemmer::Stemmer;
use crate::analysis::stopper::{Stopper, canonical_language};
use crate::engine::IndexEngine;
use crate::error::Result;

pub struct LanguageCache {
    engine: Arc<dyn IndexEngine>,
    stoppers: Mutex<AHashMap<String, Arc<dyn Stopper>>>,
    stemmers: Mutex<AHashMap<String, Option<Arc<dyn Stemmer>>>>,
}

impl std::fmt::Debug for LanguageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageCache")
            .field("stoppers", &self.stoppers.lock().keys().collect::<Vec<_>>())
            .field("stemmers", &self.stemmers.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LanguageCache {
    pub fn new(engine: Arc<dyn IndexEngine>) -> Self {
        Self {
            engine,
            stoppers: Mutex::new(AHashMap::new()),
            stemmers: Mutex::new(AHashMap::new()),
        }
    }

    pub fn stopper(&self, language: &str) -> Result<Arc<dyn Stopper>> {
        let key = canonical_language(language);
        let mut stoppers = self.stoppers.lock();
        if let Some(stopper) = stoppers.get(&key) {
            return Ok(stopper.clone());
        }
        let stopper = self.engine.stopper(&key)?;
        log::debug!("loaded stopper for '{key}'");
        stoppers.insert(key, stopper.clone());
        Ok(stopper)
    }

    /// The engine's stemmer for a language, if it has one.
    pub fn stemmer(&self, language: &str) -> Result<Option<Arc<dyn Stemmer>>> {
        let key = canonical_language(language);
        let mut stemmers = self.stemmers.lock();
        if let Some(stemmer) = stemmers.get(&key) {
            return Ok(stemmer.clone());
        }
        let stemmer = self.engine.stemmer(&key)?;
        log::debug!(
            "loaded stemmer for '{key}' ({})",
            if stemmer.is_some() { "present" } else { "none" }
        );
        stemmers.insert(key, stemmer.clone());
        Ok(stemmer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::MemoryEngine;
    use crate::error::SorrelError;

    #[test]
    fn test_cache_returns_same_instance() {
        let cache = LanguageCache::new(Arc::new(MemoryEngine::new()));
        let a = cache.stopper("english").unwrap();
        let b = cache.stopper("en").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(cache.stemmer("english").unwrap().is_none());
    }

    #[test]
    fn test_unsupported_language() {
        let cache = LanguageCache::new(Arc::new(MemoryEngine::new()));
        assert!(matches!(
            cache.stopper("klingon"),
            Err(SorrelError::UnsupportedLanguage(_))
        ));
    }
}
