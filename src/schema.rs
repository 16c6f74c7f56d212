//! Declarative field schema.
//!
//! The schema maps field names to [`FieldOption`]s and owns the two
//! naming conventions the rest of the crate relies on:
//!
//! - the term prefix of a field, `"X" + UPPER(name)`
//! - the value slot of a field, the CRC32 of its UTF-8 name
//!
//! Both are part of the on-disk contract: changing either invalidates
//! existing indexes.

pub mod field;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{Result, SorrelError};

pub use field::{FieldOption, FieldSpec, FieldType, IndexMode, IndexSpec};

/// Schema as written in configuration.
///
/// Either a flat list of names (each a stored, fully indexed text field) or
/// a map from name to [`FieldSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaDefinition {
    Names(Vec<String>),
    Fields(HashMap<String, FieldSpec>),
}

impl Default for SchemaDefinition {
    fn default() -> Self {
        SchemaDefinition::Names(Vec::new())
    }
}

impl From<Vec<String>> for SchemaDefinition {
    fn from(names: Vec<String>) -> Self {
        SchemaDefinition::Names(names)
    }
}

impl From<Vec<&str>> for SchemaDefinition {
    fn from(names: Vec<&str>) -> Self {
        SchemaDefinition::Names(names.into_iter().map(String::from).collect())
    }
}

impl From<HashMap<String, FieldSpec>> for SchemaDefinition {
    fn from(fields: HashMap<String, FieldSpec>) -> Self {
        SchemaDefinition::Fields(fields)
    }
}

/// Resolved schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    fields: HashMap<String, FieldOption>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Resolve a configuration-file definition into a schema.
    pub fn resolve(definition: &SchemaDefinition) -> Self {
        let fields: HashMap<String, FieldOption> = match definition {
            SchemaDefinition::Names(names) => names
                .iter()
                .map(|name| (name.clone(), FieldOption::default()))
                .collect(),
            SchemaDefinition::Fields(specs) => specs
                .iter()
                .map(|(name, spec)| (name.clone(), spec.resolve()))
                .collect(),
        };

        for (name, option) in &fields {
            if option.indexed == IndexMode::Full {
                log::debug!("field '{name}' is indexed with and without its prefix");
            }
        }

        Self { fields }
    }

    /// Check declarations that would otherwise be silently unusable.
    ///
    /// Fails with `Config` for an empty field name, or for a range marker
    /// on a field that is not sortable.
    pub fn validate(&self) -> Result<()> {
        for (name, option) in self.iter() {
            if name.trim().is_empty() {
                return Err(SorrelError::config("field names must not be empty"));
            }
            if !option.sortable && (option.range_prefix.is_some() || option.range_postfix.is_some())
            {
                return Err(SorrelError::config(format!(
                    "field '{name}' has a range marker but is not sortable"
                )));
            }
        }
        Ok(())
    }

    /// Options for a declared field.
    pub fn get(&self, name: &str) -> Option<&FieldOption> {
        self.fields.get(name)
    }

    /// Options for any field, falling back to [`FieldOption::undeclared`].
    pub fn option_for(&self, name: &str) -> FieldOption {
        self.fields
            .get(name)
            .cloned()
            .unwrap_or_else(FieldOption::undeclared)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldOption)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fields whose values are returned with retrieved documents.
    pub fn stored_fields(&self) -> impl Iterator<Item = (&str, &FieldOption)> {
        self.iter().filter(|(_, opt)| opt.stored)
    }

    /// Fields that `lo..hi` ranges in query strings may refer to.
    pub fn range_fields(&self) -> impl Iterator<Item = (&str, &FieldOption)> {
        self.iter().filter(|(_, opt)| opt.sortable)
    }

    /// Term prefix for a field.
    pub fn prefix(name: &str) -> String {
        format!("X{}", name.to_uppercase())
    }

    /// Value slot for a field.
    pub fn slot(name: &str) -> u32 {
        codec::slot_for(name)
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: HashMap<String, FieldOption>,
}

impl SchemaBuilder {
    pub fn add_field(mut self, name: impl Into<String>, option: FieldOption) -> Self {
        self.fields.insert(name.into(), option);
        self
    }

    pub fn add_text_field(self, name: impl Into<String>) -> Self {
        self.add_field(name, FieldOption::text())
    }

    pub fn add_sortable_field(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.add_field(name, FieldOption::new(field_type).sortable(true))
    }

    pub fn add_boolean_field(self, name: impl Into<String>) -> Self {
        self.add_field(name, FieldOption::boolean())
    }

    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_names() {
        let schema = Schema::resolve(&SchemaDefinition::Names(vec![
            "title".to_string(),
            "body".to_string(),
        ]));
        let title = schema.get("title").unwrap();
        assert!(title.stored);
        assert_eq!(title.indexed, IndexMode::Full);
        assert_eq!(title.field_type, FieldType::Text);
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_resolve_from_json() {
        let definition: SchemaDefinition = serde_json::from_str(
            r#"{
                "name": { "index": true },
                "age": { "type": "integer", "sortable": true, "stored": false },
                "status": { "boolean": true },
                "price": { "type": "float", "sortable": true, "range_prefix": "$" },
                "notes": { "index": "with_field_name_only" }
            }"#,
        )
        .unwrap();
        let schema = Schema::resolve(&definition);

        let age = schema.get("age").unwrap();
        assert_eq!(age.field_type, FieldType::Integer);
        assert!(age.sortable);
        assert!(!age.stored);

        let status = schema.get("status").unwrap();
        assert!(status.boolean);
        assert_eq!(status.indexed, IndexMode::None);

        assert_eq!(
            schema.get("price").unwrap().range_prefix.as_deref(),
            Some("$")
        );
        assert_eq!(
            schema.get("notes").unwrap().indexed,
            IndexMode::WithFieldNameOnly
        );
    }

    #[test]
    fn test_undeclared_fields_are_not_stored() {
        let schema = Schema::builder().add_text_field("title").build();
        let opt = schema.option_for("author");
        assert!(!opt.stored);
        assert_eq!(opt.indexed, IndexMode::Full);
    }

    #[test]
    fn test_validate() {
        let schema = Schema::builder()
            .add_field("price", FieldOption::float().sortable(true).range_prefix("$"))
            .build();
        assert!(schema.validate().is_ok());

        let schema = Schema::builder()
            .add_field("weight", FieldOption::float().range_postfix("kg"))
            .build();
        assert!(matches!(schema.validate(), Err(SorrelError::Config(_))));

        let schema = Schema::builder().add_text_field(" ").build();
        assert!(matches!(schema.validate(), Err(SorrelError::Config(_))));
    }

    #[test]
    fn test_prefix_and_slot() {
        assert_eq!(Schema::prefix("title"), "XTITLE");
        assert_eq!(Schema::slot("age"), Schema::slot("age"));
        assert_ne!(Schema::slot("age"), Schema::slot("height"));
    }
}
