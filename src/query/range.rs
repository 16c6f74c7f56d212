//! `lo..hi` value ranges.

use crate::codec;
use crate::engine::Predicate;
use crate::error::Result;
use crate::schema::{FieldOption, Schema};

/// Bounds of a range; `None` is open-ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeBounds {
    pub lo: Option<String>,
    pub hi: Option<String>,
}

/// Split `lo..hi`, `..hi` or `lo..`. `..` alone is not a range.
pub fn split_range(text: &str) -> Option<RangeBounds> {
    let (lo, hi) = text.split_once("..")?;
    let bound = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    let bounds = RangeBounds {
        lo: bound(lo),
        hi: bound(hi),
    };
    if bounds.lo.is_none() && bounds.hi.is_none() {
        return None;
    }
    Some(bounds)
}

/// Value-range predicate on a field's slot, with bounds parsed as the
/// field's type.
pub fn range_predicate(name: &str, option: &FieldOption, bounds: &RangeBounds) -> Result<Predicate> {
    let encode = |bound: &Option<String>| {
        bound
            .as_deref()
            .map(|text| codec::encode_text(option.field_type, text))
            .transpose()
    };
    Ok(Predicate::ValueRange {
        slot: Schema::slot(name),
        lo: encode(&bounds.lo)?,
        hi: encode(&bounds.hi)?,
    })
}

/// Predicate matching exactly one value of a field.
pub fn exact_predicate(name: &str, option: &FieldOption, text: &str) -> Result<Predicate> {
    let bytes = codec::encode_text(option.field_type, text)?;
    Ok(Predicate::ValueRange {
        slot: Schema::slot(name),
        lo: Some(bytes.clone()),
        hi: Some(bytes),
    })
}

/// Match a bare word against the range prefixes and postfixes of the
/// schema's sortable fields, e.g. `$10..50` or `5..10kg`.
///
/// Returns the field name and the bounds with markers stripped.
pub fn match_marked_range(schema: &Schema, word: &str) -> Option<(String, RangeBounds)> {
    let mut fields: Vec<(&str, &FieldOption)> = schema.range_fields().collect();
    fields.sort_by_key(|(name, _)| *name);

    for (name, option) in fields {
        if let Some(prefix) = option.range_prefix.as_deref().filter(|p| !p.is_empty())
            && let Some(rest) = word.strip_prefix(prefix)
            && let Some(mut bounds) = split_range(rest)
        {
            bounds.hi = bounds
                .hi
                .map(|hi| hi.strip_prefix(prefix).unwrap_or(hi.as_str()).to_string());
            return Some((name.to_string(), bounds));
        }
        if let Some(postfix) = option.range_postfix.as_deref().filter(|p| !p.is_empty())
            && let Some(rest) = word.strip_suffix(postfix)
            && let Some(mut bounds) = split_range(rest)
        {
            bounds.lo = bounds
                .lo
                .map(|lo| lo.strip_suffix(postfix).unwrap_or(lo.as_str()).to_string());
            return Some((name.to_string(), bounds));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    #[test]
    fn test_split_range() {
        assert_eq!(
            split_range("10..50"),
            Some(RangeBounds {
                lo: Some("10".to_string()),
                hi: Some("50".to_string())
            })
        );
        assert_eq!(split_range("..50").unwrap().lo, None);
        assert_eq!(split_range("10..").unwrap().hi, None);
        assert_eq!(split_range(".."), None);
        assert_eq!(split_range("cat"), None);
    }

    #[test]
    fn test_marked_ranges() {
        let schema = Schema::builder()
            .add_field(
                "price",
                FieldOption::float().sortable(true).range_prefix("$"),
            )
            .add_field(
                "weight",
                FieldOption::float().sortable(true).range_postfix("kg"),
            )
            .build();

        let (field, bounds) = match_marked_range(&schema, "$10..$50").unwrap();
        assert_eq!(field, "price");
        assert_eq!(bounds.lo.as_deref(), Some("10"));
        assert_eq!(bounds.hi.as_deref(), Some("50"));

        let (field, bounds) = match_marked_range(&schema, "5..10kg").unwrap();
        assert_eq!(field, "weight");
        assert_eq!(bounds.lo.as_deref(), Some("5"));
        assert_eq!(bounds.hi.as_deref(), Some("10"));

        assert!(match_marked_range(&schema, "10..50").is_none());
    }

    #[test]
    fn test_range_bounds_use_field_type() {
        let option = FieldOption::new(FieldType::Integer).sortable(true);
        let bounds = split_range("10..").unwrap();
        let p = range_predicate("age", &option, &bounds).unwrap();
        assert_eq!(
            p,
            Predicate::ValueRange {
                slot: Schema::slot("age"),
                lo: Some(codec::sortable_serialise(10.0).to_vec()),
                hi: None,
            }
        );
        assert!(range_predicate("age", &option, &split_range("a..b").unwrap()).is_err());
    }
}
