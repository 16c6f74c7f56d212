//! Documents as seen by callers.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec;
use crate::data::FieldValue;
use crate::engine::EngineDocument;
use crate::error::{Result, SorrelError};
use crate::schema::Schema;
use crate::store::Store;

/// Field holding the text of [`Document::from_text`].
pub const CONTENT_FIELD: &str = "content";

/// Field that sets the id when passed to [`Document::from_fields`].
pub const ID_FIELD: &str = "id";

/// A document's fields, identity and auxiliary data.
///
/// New documents have no id until saved; documents read back from a store
/// carry their id, their search weight when they came from a search, and
/// a handle to the store for [`terms`](Document::terms) and
/// [`get_value`](Document::get_value).
#[derive(Clone, Default)]
pub struct Document {
    pub id: Option<u32>,
    pub fields: HashMap<String, FieldValue>,
    data: Option<Vec<u8>>,
    weight: Option<f64>,
    values: BTreeMap<u32, Vec<u8>>,
    store: Option<Store>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("weight", &self.weight)
            .field("data_len", &self.data.as_ref().map(Vec::len))
            .finish()
    }
}

/// Documents are equal when their ids are.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_id(id: u32) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Build a document from a field mapping.
    ///
    /// An integer `id` field becomes the document id instead of a field.
    pub fn from_fields(mut fields: HashMap<String, FieldValue>) -> Result<Self> {
        let id = match fields.remove(ID_FIELD) {
            None | Some(FieldValue::Null) => None,
            Some(value) => {
                let id = value
                    .as_integer()
                    .or_else(|| value.as_text().and_then(|s| s.parse().ok()))
                    .and_then(|i| u32::try_from(i).ok())
                    .filter(|i| *i > 0)
                    .ok_or_else(|| {
                        SorrelError::invalid_argument(format!("invalid document id {value}"))
                    })?;
                Some(id)
            }
        };
        Ok(Self {
            id,
            fields,
            ..Self::default()
        })
    }

    /// A document with one `content` field.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new().add_field(CONTENT_FIELD, FieldValue::Text(text.into()))
    }

    /// Rebuild a document from an engine record.
    ///
    /// Stored fields are decoded from their value slots; fields without a
    /// stored value are left out.
    pub fn from_record(
        id: u32,
        weight: Option<f64>,
        record: EngineDocument,
        schema: &Schema,
        store: Option<Store>,
    ) -> Self {
        let mut fields = HashMap::new();
        for (name, option) in schema.stored_fields() {
            let Some(bytes) = record.value(Schema::slot(name)) else {
                continue;
            };
            match codec::decode(option.field_type, bytes) {
                Ok(value) => {
                    fields.insert(name.to_string(), value);
                }
                Err(e) => log::warn!("document {id}: cannot decode field '{name}': {e}"),
            }
        }
        Self {
            id: Some(id),
            fields,
            data: (!record.data.is_empty()).then_some(record.data),
            weight,
            values: record.values,
            store,
        }
    }

    pub fn add_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_data<T: Serialize>(mut self, data: &T) -> Result<Self> {
        self.set_data(data)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Relevance weight; only set on documents returned by a search.
    pub fn weight(&self) -> Option<f64> {
        self.weight
    }

    /// The raw auxiliary data blob.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Store `data` as the auxiliary blob, serialized as JSON.
    pub fn set_data<T: Serialize>(&mut self, data: &T) -> Result<()> {
        self.data = Some(serde_json::to_vec(data)?);
        Ok(())
    }

    /// Decode the auxiliary blob.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.data
            .as_deref()
            .map(|bytes| serde_json::from_slice(bytes).map_err(SorrelError::from))
            .transpose()
    }

    /// The store this document was saved to or read from.
    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    pub(crate) fn attach(&mut self, id: u32, store: Store) {
        self.id = Some(id);
        self.store = Some(store);
    }

    /// Save to `store`: added with a fresh id when the document has none,
    /// replaced at its id otherwise.
    pub fn save(&mut self, store: &Store) -> Result<u32> {
        store.add(self)
    }

    /// Indexed terms of the saved document.
    pub fn terms(&self) -> Result<Vec<String>> {
        let (id, store) = self.backing()?;
        store.term_list(id)
    }

    /// Decode the value slot of a field using the store's schema.
    ///
    /// Missing values decode to the type's zero value.
    pub fn get_value(&self, field: &str) -> Result<FieldValue> {
        let (_, store) = self.backing()?;
        let option = store.schema().option_for(field);
        let bytes = self
            .values
            .get(&Schema::slot(field))
            .map_or(&[][..], Vec::as_slice);
        codec::decode(option.field_type, bytes)
    }

    fn backing(&self) -> Result<(u32, &Store)> {
        match (self.id, &self.store) {
            (Some(id), Some(store)) => Ok((id, store)),
            _ => Err(SorrelError::DocNotSet),
        }
    }
}
