//! Per-field configuration.
//!
//! A [`FieldOption`] is the resolved policy for one field: how its values
//! are typed, whether they are kept in a value slot, and which terms the
//! indexer generates for it. [`FieldSpec`] is the configuration-file form,
//! where every flag is optional so that explicit overrides can be told
//! apart from defaults.

use serde::{Deserialize, Serialize};

/// The declared type of a field's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Integer,
    Float,
    Date,
    DateTime,
    /// A UTC instant, stored as sortable epoch seconds.
    Time,
    Boolean,
    /// Anything else; stored as JSON.
    Opaque,
}

impl FieldType {
    /// Parse a type name as written in configuration.
    ///
    /// Unknown names fall back to [`FieldType::Opaque`].
    pub fn parse(name: &str) -> FieldType {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" | "string" | "str" => FieldType::Text,
            "integer" | "int" | "fixnum" | "bignum" => FieldType::Integer,
            "float" | "double" | "number" => FieldType::Float,
            "date" => FieldType::Date,
            "datetime" | "date_time" => FieldType::DateTime,
            "time" | "timestamp" => FieldType::Time,
            "boolean" | "bool" => FieldType::Boolean,
            "opaque" | "json" => FieldType::Opaque,
            other => {
                log::warn!("unknown field type '{other}', treating values as opaque");
                FieldType::Opaque
            }
        }
    }

    /// Whether values of this type use the sortable float encoding.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float | FieldType::Time)
    }
}

/// Which text terms are generated for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    /// Both `field:term` and bare `term` are searchable.
    ///
    /// Every token is indexed twice, so the field costs roughly double the
    /// index space of the other modes.
    #[default]
    Full,
    /// Only prefixed terms: `field:term` matches, bare `term` does not.
    WithFieldNameOnly,
    /// Only bare terms: `term` matches, `field:term` does not.
    WithoutFieldName,
    /// No text terms.
    None,
}

impl IndexMode {
    pub fn prefixed(&self) -> bool {
        matches!(self, IndexMode::Full | IndexMode::WithFieldNameOnly)
    }

    pub fn unprefixed(&self) -> bool {
        matches!(self, IndexMode::Full | IndexMode::WithoutFieldName)
    }

    /// Number of terms written per token.
    pub fn term_copies(&self) -> usize {
        self.prefixed() as usize + self.unprefixed() as usize
    }
}

/// Resolved options for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub field_type: FieldType,
    /// The value is returned with retrieved documents.
    pub stored: bool,
    /// The value is kept in sortable form and can be ranged, sorted and faceted.
    pub sortable: bool,
    /// The value is indexed as a single exact token and excluded from scoring.
    pub boolean: bool,
    pub indexed: IndexMode,
    /// Marker that selects this field for `lo..hi` ranges in query strings, e.g. `$`.
    pub range_prefix: Option<String>,
    /// Marker after the range bounds, e.g. `kg` in `5..10kg`.
    pub range_postfix: Option<String>,
    /// Within-document frequency increment for each token.
    pub weight: u32,
}

impl Default for FieldOption {
    fn default() -> Self {
        Self {
            field_type: FieldType::Text,
            stored: true,
            sortable: false,
            boolean: false,
            indexed: IndexMode::Full,
            range_prefix: None,
            range_postfix: None,
            weight: 1,
        }
    }
}

impl FieldOption {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            ..Default::default()
        }
    }

    pub fn text() -> Self {
        Self::new(FieldType::Text)
    }

    pub fn integer() -> Self {
        Self::new(FieldType::Integer)
    }

    pub fn float() -> Self {
        Self::new(FieldType::Float)
    }

    /// A boolean (exact-token) field: not stored and not text-indexed.
    pub fn boolean() -> Self {
        Self {
            boolean: true,
            stored: false,
            indexed: IndexMode::None,
            ..Default::default()
        }
    }

    /// Options for fields that appear in documents but not in the schema.
    pub fn undeclared() -> Self {
        Self {
            stored: false,
            ..Default::default()
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn stored(mut self, stored: bool) -> Self {
        self.stored = stored;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn indexed(mut self, mode: IndexMode) -> Self {
        self.indexed = mode;
        self
    }

    pub fn range_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.range_prefix = Some(prefix.into());
        self
    }

    pub fn range_postfix(mut self, postfix: impl Into<String>) -> Self {
        self.range_postfix = Some(postfix.into());
        self
    }

    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Whether the field's value is written to its value slot.
    pub fn has_value_slot(&self) -> bool {
        self.stored || self.sortable || self.boolean
    }

    /// Whether filters and facets may reference this field.
    pub fn is_filterable(&self) -> bool {
        self.sortable || self.boolean
    }
}

/// `index` as written in configuration: a flag or an explicit mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexSpec {
    Flag(bool),
    Mode(IndexMode),
}

impl IndexSpec {
    fn mode(self) -> IndexMode {
        match self {
            IndexSpec::Flag(true) => IndexMode::Full,
            IndexSpec::Flag(false) => IndexMode::None,
            IndexSpec::Mode(mode) => mode,
        }
    }
}

/// Field options as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub stored: Option<bool>,
    pub sortable: Option<bool>,
    pub boolean: Option<bool>,
    pub index: Option<IndexSpec>,
    pub range_prefix: Option<String>,
    pub range_postfix: Option<String>,
    pub weight: Option<u32>,
}

impl FieldSpec {
    /// Apply defaults to produce a [`FieldOption`].
    ///
    /// A boolean field defaults to `stored = false` and no text indexing;
    /// explicit `stored` or `index` settings override that.
    pub fn resolve(&self) -> FieldOption {
        let boolean = self.boolean.unwrap_or(false);
        let base = if boolean {
            FieldOption::boolean()
        } else {
            FieldOption::default()
        };

        FieldOption {
            field_type: self
                .field_type
                .as_deref()
                .map(FieldType::parse)
                .unwrap_or(base.field_type),
            stored: self.stored.unwrap_or(base.stored),
            sortable: self.sortable.unwrap_or(base.sortable),
            boolean,
            indexed: self.index.map(IndexSpec::mode).unwrap_or(base.indexed),
            range_prefix: self.range_prefix.clone(),
            range_postfix: self.range_postfix.clone(),
            weight: self.weight.unwrap_or(base.weight).max(1),
        }
    }
}
