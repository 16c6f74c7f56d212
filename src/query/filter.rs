//! Structured filters.
//!
//! Values of one field are ORed together and the per-field groups are
//! ANDed. Sortable fields filter on their value slot, by exact value or by
//! `lo..hi`, `..hi` and `lo..` ranges; boolean fields filter on their exact
//! `X<FIELD><value>` terms. Fields that are neither are ignored with a
//! warning.

use std::collections::BTreeMap;

use crate::codec;
use crate::data::FieldValue;
use crate::engine::Predicate;
use crate::query::range::{exact_predicate, range_predicate, split_range};
use crate::schema::{FieldOption, Schema};

/// Build the combined filter predicate, or `None` if nothing applies.
pub fn build_filter(schema: &Schema, filters: &BTreeMap<String, Vec<FieldValue>>) -> Option<Predicate> {
    let groups: Vec<Predicate> = filters
        .iter()
        .filter_map(|(name, values)| field_filter(schema, name, values))
        .collect();
    (!groups.is_empty()).then(|| Predicate::and(groups))
}

fn field_filter(schema: &Schema, name: &str, values: &[FieldValue]) -> Option<Predicate> {
    let Some(option) = schema.get(name).filter(|o| o.is_filterable()) else {
        log::warn!("ignoring filter on '{name}': field is neither sortable nor boolean");
        return None;
    };

    let alternatives: Vec<Predicate> = values
        .iter()
        .flat_map(|value| value_filter(name, option, value))
        .collect();
    (!alternatives.is_empty()).then(|| Predicate::or(alternatives))
}

fn value_filter(name: &str, option: &FieldOption, value: &FieldValue) -> Vec<Predicate> {
    let text = value.to_string();

    let result = if option.sortable
        && let Some(bounds) = split_range(&text)
    {
        range_predicate(name, option, &bounds).map(|p| vec![p])
    } else if option.boolean {
        let prefix = Schema::prefix(name);
        codec::coerce(option.field_type, value).map(|v| {
            v.index_texts()
                .into_iter()
                .map(|t| Predicate::term(format!("{prefix}{t}")))
                .collect()
        })
    } else {
        exact_predicate(name, option, &text).map(|p| vec![p])
    };

    result.unwrap_or_else(|e| {
        log::warn!("ignoring filter value '{text}' for '{name}': {e}");
        Vec::new()
    })
}
