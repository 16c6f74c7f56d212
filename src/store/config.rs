use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::engine::OpenMode;
use crate::query::{DefaultOp, QueryFlags, StemStrategy};
use crate::schema::SchemaDefinition;

/// Language used when none is configured.
pub const DEFAULT_LANGUAGE: &str = "english";

/// Value of `stemmer`/`stopper` that disables the component.
pub const DISABLED: &str = "none";

/// Configuration for a [`Store`](crate::store::Store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Index directory. Without one the store lives in memory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub mode: OpenMode,

    /// Field declarations, as a list of names or a map of options.
    #[serde(default)]
    pub fields: SchemaDefinition,

    /// Language of the default stemmer and stopper.
    #[serde(default = "default_language")]
    pub language: String,

    /// Stemmer language, overriding `language`; `"none"` disables stemming.
    #[serde(default)]
    pub stemmer: Option<String>,

    /// Stopper language, overriding `language`; `"none"` disables stopwords.
    #[serde(default)]
    pub stopper: Option<String>,

    /// Feed indexed words to the spelling dictionary.
    #[serde(default = "default_true")]
    pub spelling: bool,

    /// Record term positions. Phrase queries need them.
    #[serde(default = "default_true")]
    pub index_positions: bool,

    #[serde(default)]
    pub default_search: SearchDefaults,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            mode: OpenMode::default(),
            fields: SchemaDefinition::default(),
            language: default_language(),
            stemmer: None,
            stopper: None,
            spelling: true,
            index_positions: true,
            default_search: SearchDefaults::default(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Language the stemmer is looked up for, or `None` when disabled.
    pub fn stemmer_language(&self) -> Option<&str> {
        enabled(self.stemmer.as_deref().unwrap_or(&self.language))
    }

    /// Language the stopper is looked up for, or `None` when disabled.
    pub fn stopper_language(&self) -> Option<&str> {
        enabled(self.stopper.as_deref().unwrap_or(&self.language))
    }
}

fn enabled(language: &str) -> Option<&str> {
    (!language.eq_ignore_ascii_case(DISABLED) && !language.is_empty()).then_some(language)
}

/// Query defaults applied when a search request leaves them unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchDefaults {
    pub default_op: DefaultOp,
    pub flags: QueryFlags,
    pub stem_strategy: StemStrategy,
    /// Fields recognized as `field:` prefixes; every schema field when unset.
    pub fields: Option<Vec<String>>,
    pub per_page: u32,
    /// Report spelling corrections for searches.
    pub spelling: bool,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            default_op: DefaultOp::default(),
            flags: QueryFlags::default(),
            stem_strategy: StemStrategy::default(),
            fields: None,
            per_page: 10,
            spelling: true,
        }
    }
}

#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = Some(path.into());
        self
    }

    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn fields(mut self, fields: impl Into<SchemaDefinition>) -> Self {
        self.config.fields = fields.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn stemmer(mut self, language: impl Into<String>) -> Self {
        self.config.stemmer = Some(language.into());
        self
    }

    pub fn stopper(mut self, language: impl Into<String>) -> Self {
        self.config.stopper = Some(language.into());
        self
    }

    pub fn spelling(mut self, spelling: bool) -> Self {
        self.config.spelling = spelling;
        self
    }

    pub fn index_positions(mut self, index_positions: bool) -> Self {
        self.config.index_positions = index_positions;
        self
    }

    pub fn default_search(mut self, defaults: SearchDefaults) -> Self {
        self.config.default_search = defaults;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
