use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format used when dates are written as index text or stored values.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Format used when date-times are written as index text or stored values.
pub const DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// The value type for fields in a document.
///
/// Each variant corresponds to a [`FieldType`](crate::schema::FieldType);
/// the value codec converts between variants when a field's declared type
/// differs from the value it is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Calendar date without a time zone.
    Date(NaiveDate),
    /// Date and wall-clock time without a time zone.
    DateTime(NaiveDateTime),
    /// An instant in UTC.
    Time(DateTime<Utc>),
    /// Structured data (including lists) carried as JSON.
    Opaque(serde_json::Value),
}

impl FieldValue {
    /// Returns the text value if this is a Text variant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value if this is an Integer variant.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float value if this is a Float variant.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a Boolean variant.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&serde_json::Value> {
        match self {
            FieldValue::Opaque(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Text fragments fed to the tokenizer when this value is indexed.
    ///
    /// Lists contribute one fragment per element; everything else is a
    /// single fragment in its display form.
    pub fn index_texts(&self) -> Vec<String> {
        match self {
            FieldValue::Null => Vec::new(),
            FieldValue::Opaque(serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| FieldValue::Opaque(item.clone()).to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            other => vec![other.to_string()],
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            FieldValue::Time(t) => write!(f, "{}", t.format(DATETIME_FORMAT)),
            FieldValue::Opaque(serde_json::Value::Null) => Ok(()),
            FieldValue::Opaque(serde_json::Value::String(s)) => f.write_str(s),
            FieldValue::Opaque(v) => write!(f, "{v}"),
        }
    }
}

// --- Conversions ---

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(v as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Integer(v as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(dt: NaiveDateTime) -> Self {
        FieldValue::DateTime(dt)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Time(t)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        FieldValue::Opaque(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::Opaque(serde_json::Value::Array(
            v.into_iter().map(serde_json::Value::String).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        let date = NaiveDate::from_ymd_opt(2009, 3, 7).unwrap();
        assert_eq!(FieldValue::Date(date).to_string(), "20090307");

        let dt = date.and_hms_opt(13, 5, 9).unwrap();
        assert_eq!(FieldValue::DateTime(dt).to_string(), "20090307130509");
        assert_eq!(FieldValue::Time(dt.and_utc()).to_string(), "20090307130509");

        assert_eq!(FieldValue::Integer(57).to_string(), "57");
        assert_eq!(FieldValue::Boolean(true).to_string(), "true");
        assert_eq!(FieldValue::Null.to_string(), "");
    }

    #[test]
    fn test_list_index_texts() {
        let tags = FieldValue::from(vec!["red fox".to_string(), "lazy dog".to_string()]);
        assert_eq!(tags.index_texts(), vec!["red fox", "lazy dog"]);
        assert!(FieldValue::Null.index_texts().is_empty());
    }
}
