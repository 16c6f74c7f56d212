//! Type-directed value codec.
//!
//! Values are written to value slots in a form whose bytewise order equals
//! the natural order of the type, so the engine can sort and range over
//! raw bytes:
//!
//! | type | encoding |
//! |---|---|
//! | Integer, Float, Time | 8-byte big-endian sortable float |
//! | Date | `YYYYMMDD` |
//! | DateTime | `YYYYMMDDHHMMSS` |
//! | Boolean | one byte, `0` or `1` |
//! | Text | UTF-8 |
//! | Opaque | JSON |
//!
//! Empty bytes decode to the zero value of the type.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::data::{DATE_FORMAT, DATETIME_FORMAT, FieldValue};
use crate::error::{Result, SorrelError};
use crate::schema::FieldType;

/// Slot reserved for ordering by document id.
pub const ID_ORDER_SLOT: u32 = u32::MAX;

/// Largest integer magnitude a sortable float represents exactly.
pub const MAX_EXACT_INTEGER: i64 = 1 << 53;

const SIGN_BIT: u64 = 1 << 63;

/// Value slot for a field name: CRC32 (IEEE) of its UTF-8 bytes.
///
/// The result never collides with [`ID_ORDER_SLOT`].
pub fn slot_for(name: &str) -> u32 {
    crc32fast::hash(name.as_bytes()).min(ID_ORDER_SLOT - 1)
}

/// Encode a float so that unsigned bytewise comparison matches numeric order.
pub fn sortable_serialise(value: f64) -> [u8; 8] {
    // -0.0 and 0.0 must share one encoding.
    let value = if value == 0.0 { 0.0 } else { value };
    let bits = value.to_bits();
    let key = if bits & SIGN_BIT == 0 {
        bits | SIGN_BIT
    } else {
        !bits
    };
    key.to_be_bytes()
}

/// Inverse of [`sortable_serialise`].
pub fn sortable_unserialise(bytes: &[u8]) -> Result<f64> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        SorrelError::codec(format!(
            "sortable value must be 8 bytes, got {}",
            bytes.len()
        ))
    })?;
    let key = u64::from_be_bytes(raw);
    let bits = if key & SIGN_BIT != 0 {
        key & !SIGN_BIT
    } else {
        !key
    };
    Ok(f64::from_bits(bits))
}

/// Encode a value for a field of the given type.
///
/// The value is first coerced to the type; `Null` encodes as empty bytes.
pub fn encode(field_type: FieldType, value: &FieldValue) -> Result<Vec<u8>> {
    let value = coerce(field_type, value)?;
    match value {
        FieldValue::Null => Ok(Vec::new()),
        FieldValue::Integer(i) => {
            if i.unsigned_abs() > MAX_EXACT_INTEGER as u64 {
                return Err(SorrelError::value_out_of_bounds(format!(
                    "integer {i} exceeds ±2^53"
                )));
            }
            Ok(sortable_serialise(i as f64).to_vec())
        }
        FieldValue::Float(f) => {
            if f.is_nan() {
                return Err(SorrelError::value_out_of_bounds("NaN is not sortable"));
            }
            Ok(sortable_serialise(f).to_vec())
        }
        FieldValue::Time(t) => Ok(sortable_serialise(epoch_seconds(&t)).to_vec()),
        FieldValue::Date(d) => Ok(d.format(DATE_FORMAT).to_string().into_bytes()),
        FieldValue::DateTime(dt) => Ok(dt.format(DATETIME_FORMAT).to_string().into_bytes()),
        FieldValue::Boolean(b) => Ok(vec![b as u8]),
        FieldValue::Text(s) => Ok(s.into_bytes()),
        FieldValue::Opaque(v) => Ok(serde_json::to_vec(&v)?),
    }
}

/// Decode bytes written by [`encode`] for the same type.
pub fn decode(field_type: FieldType, bytes: &[u8]) -> Result<FieldValue> {
    if bytes.is_empty() {
        return Ok(zero_value(field_type));
    }
    match field_type {
        FieldType::Integer => Ok(FieldValue::Integer(sortable_unserialise(bytes)?.round() as i64)),
        FieldType::Float => Ok(FieldValue::Float(sortable_unserialise(bytes)?)),
        FieldType::Time => {
            let secs = sortable_unserialise(bytes)?;
            from_epoch_seconds(secs).map(FieldValue::Time)
        }
        FieldType::Date => {
            let s = utf8(bytes)?;
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(FieldValue::Date)
                .map_err(|e| SorrelError::codec(format!("bad date '{s}': {e}")))
        }
        FieldType::DateTime => {
            let s = utf8(bytes)?;
            NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                .map(FieldValue::DateTime)
                .map_err(|e| SorrelError::codec(format!("bad datetime '{s}': {e}")))
        }
        FieldType::Boolean => Ok(FieldValue::Boolean(bytes[0] != 0)),
        FieldType::Text => Ok(FieldValue::Text(utf8(bytes)?.to_string())),
        FieldType::Opaque => Ok(FieldValue::Opaque(serde_json::from_slice(bytes)?)),
    }
}

/// Zero value returned for missing stored bytes.
pub fn zero_value(field_type: FieldType) -> FieldValue {
    match field_type {
        FieldType::Text => FieldValue::Text(String::new()),
        FieldType::Integer => FieldValue::Integer(0),
        FieldType::Float => FieldValue::Float(0.0),
        FieldType::Boolean => FieldValue::Boolean(false),
        FieldType::Date | FieldType::DateTime | FieldType::Time | FieldType::Opaque => {
            FieldValue::Null
        }
    }
}

/// Parse query or filter text as a value of the given type.
pub fn parse_value(field_type: FieldType, text: &str) -> Result<FieldValue> {
    coerce(field_type, &FieldValue::Text(text.trim().to_string()))
}

/// Encode query or filter text as slot bytes for the given type.
pub fn encode_text(field_type: FieldType, text: &str) -> Result<Vec<u8>> {
    encode(field_type, &parse_value(field_type, text)?)
}

/// Convert a value to the declared field type.
pub fn coerce(field_type: FieldType, value: &FieldValue) -> Result<FieldValue> {
    if value.is_null() {
        return Ok(FieldValue::Null);
    }
    let mismatch = || {
        SorrelError::type_mismatch(format!("cannot convert {value:?} to {field_type:?}"))
    };

    let coerced = match (field_type, value) {
        (FieldType::Text, FieldValue::Text(_)) => value.clone(),
        (FieldType::Text, other) => FieldValue::Text(other.to_string()),

        (FieldType::Integer, FieldValue::Integer(_)) => value.clone(),
        (FieldType::Integer, FieldValue::Float(f)) if f.fract() == 0.0 => {
            FieldValue::Integer(*f as i64)
        }
        (FieldType::Integer, FieldValue::Boolean(b)) => FieldValue::Integer(*b as i64),
        (FieldType::Integer, FieldValue::Text(s)) => match s.parse::<i64>() {
            Ok(i) => FieldValue::Integer(i),
            Err(_) => match s.parse::<f64>() {
                Ok(f) if f.fract() == 0.0 => FieldValue::Integer(f as i64),
                _ => return Err(mismatch()),
            },
        },

        (FieldType::Float, FieldValue::Float(_)) => value.clone(),
        (FieldType::Float, FieldValue::Integer(i)) => FieldValue::Float(*i as f64),
        (FieldType::Float, FieldValue::Text(s)) => {
            FieldValue::Float(s.parse::<f64>().map_err(|_| mismatch())?)
        }

        (FieldType::Boolean, FieldValue::Boolean(_)) => value.clone(),
        (FieldType::Boolean, FieldValue::Integer(i)) => FieldValue::Boolean(*i != 0),
        (FieldType::Boolean, FieldValue::Text(s)) => {
            match s.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => FieldValue::Boolean(true),
                "false" | "f" | "no" | "n" | "0" | "" => FieldValue::Boolean(false),
                _ => return Err(mismatch()),
            }
        }

        (FieldType::Date, FieldValue::Date(_)) => value.clone(),
        (FieldType::Date, FieldValue::DateTime(dt)) => FieldValue::Date(dt.date()),
        (FieldType::Date, FieldValue::Time(t)) => FieldValue::Date(t.date_naive()),
        (FieldType::Date, FieldValue::Text(s)) => {
            FieldValue::Date(parse_date(s).ok_or_else(mismatch)?)
        }

        (FieldType::DateTime, FieldValue::DateTime(_)) => value.clone(),
        (FieldType::DateTime, FieldValue::Date(d)) => {
            FieldValue::DateTime(d.and_time(NaiveTime::MIN))
        }
        (FieldType::DateTime, FieldValue::Time(t)) => FieldValue::DateTime(t.naive_utc()),
        (FieldType::DateTime, FieldValue::Text(s)) => {
            FieldValue::DateTime(parse_datetime(s).ok_or_else(mismatch)?)
        }

        (FieldType::Time, FieldValue::Time(_)) => value.clone(),
        (FieldType::Time, FieldValue::DateTime(dt)) => FieldValue::Time(dt.and_utc()),
        (FieldType::Time, FieldValue::Date(d)) => {
            FieldValue::Time(d.and_time(NaiveTime::MIN).and_utc())
        }
        (FieldType::Time, FieldValue::Integer(i)) => {
            FieldValue::Time(from_epoch_seconds(*i as f64)?)
        }
        (FieldType::Time, FieldValue::Float(f)) if f.is_finite() => {
            FieldValue::Time(from_epoch_seconds(*f)?)
        }
        (FieldType::Time, FieldValue::Text(s)) => {
            let time = DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .ok()
                .or_else(|| parse_datetime(s).map(|dt| dt.and_utc()))
                .ok_or_else(mismatch)?;
            FieldValue::Time(time)
        }

        (FieldType::Opaque, FieldValue::Opaque(_)) => value.clone(),
        (FieldType::Opaque, other) => FieldValue::Opaque(to_json(other)),

        _ => return Err(mismatch()),
    };
    Ok(coerced)
}

fn to_json(value: &FieldValue) -> serde_json::Value {
    match value {
        FieldValue::Null => serde_json::Value::Null,
        FieldValue::Integer(i) => serde_json::Value::from(*i),
        FieldValue::Float(f) => serde_json::Value::from(*f),
        FieldValue::Boolean(b) => serde_json::Value::Bool(*b),
        FieldValue::Opaque(v) => v.clone(),
        other => serde_json::Value::String(other.to_string()),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    [
        DATETIME_FORMAT,
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .or_else(|| parse_date(s).map(|d| d.and_time(NaiveTime::MIN)))
}

fn epoch_seconds(t: &DateTime<Utc>) -> f64 {
    t.timestamp() as f64 + t.timestamp_subsec_nanos() as f64 / 1e9
}

fn from_epoch_seconds(secs: f64) -> Result<DateTime<Utc>> {
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
        .ok_or_else(|| SorrelError::value_out_of_bounds(format!("{secs} is not a valid time")))
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| SorrelError::codec(e.to_string()))
}
