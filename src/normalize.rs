//! Record Normalizer
//!
//! Maps raw stored documents into the canonical [`Record`] shape. Every
//! document read from either collection goes through [`normalize_document`], so the
//! comparator can use plain equality without per-field special cases.
//!
//! Stored shape:
//!
//! ```json
//! {
//!   "certNumber": "12345678",
//!   "cardData": { "cardName": "...", "brand": "...", "grade": "10", "totalPopulation": 42 },
//!   "lastUpdated": { "seconds": 1700000000, "nanoseconds": 0 },
//!   "accessCount": 3
//! }
//! ```
//!
//! Card fields missing from `cardData` fall back to the same top-level key.
//! Normalization is read-only: writes copy the stored body, never a rendered record.

use crate::error::StorageError;
use crate::types::{CollectionId, Record, UNKNOWN};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

const FIELD_CERT_NUMBER: &str = "certNumber";
const FIELD_CARD_DATA: &str = "cardData";
const FIELD_CARD_NAME: &str = "cardName";
const FIELD_BRAND: &str = "brand";
const FIELD_GRADE: &str = "grade";
const FIELD_TOTAL_POPULATION: &str = "totalPopulation";
const FIELD_LAST_UPDATED: &str = "lastUpdated";
const FIELD_ACCESS_COUNT: &str = "accessCount";

/// Top-level keys consumed by the normalizer; everything else lands in `Record::extra`.
const KNOWN_FIELDS: [&str; 8] = [
    FIELD_CERT_NUMBER,
    FIELD_CARD_DATA,
    FIELD_CARD_NAME,
    FIELD_BRAND,
    FIELD_GRADE,
    FIELD_TOTAL_POPULATION,
    FIELD_LAST_UPDATED,
    FIELD_ACCESS_COUNT,
];

/// Normalize a raw document stored under `key` in `collection`.
///
/// The key always wins over any `certNumber` field inside the document.
pub fn normalize_document(
    collection: &CollectionId,
    key: &str,
    document: &Value,
) -> Result<Record, StorageError> {
    let Some(body) = document.as_object() else {
        return Err(StorageError::InvalidDocument {
            collection: collection.to_string(),
            key: key.to_string(),
            reason: format!("expected a JSON object, found {}", value_kind(document)),
        });
    };

    let card_data = body.get(FIELD_CARD_DATA).and_then(Value::as_object);
    let card_field = |name: &str| card_value(body, card_data, name);

    let last_updated = match body.get(FIELD_LAST_UPDATED) {
        None | Some(Value::Null) => None,
        Some(raw) => {
            let coerced = coerce_timestamp(raw);
            if coerced.is_none() {
                debug!(
                    collection = %collection,
                    key,
                    "Unrecognised lastUpdated representation, treating as absent"
                );
            }
            coerced
        }
    };

    let extra: Map<String, Value> = body
        .iter()
        .filter(|(name, _)| !KNOWN_FIELDS.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    Ok(Record {
        cert_number: key.to_string(),
        card_name: coerce_text(card_field(FIELD_CARD_NAME)),
        brand: coerce_text(card_field(FIELD_BRAND)),
        grade: coerce_text(card_field(FIELD_GRADE)),
        total_population: coerce_count(card_field(FIELD_TOTAL_POPULATION)),
        access_count: coerce_count(body.get(FIELD_ACCESS_COUNT)),
        last_updated,
        origin: collection.clone(),
        extra,
    })
}

/// Coerce a stored timestamp into `DateTime<Utc>`.
///
/// Accepts an epoch-seconds wrapper (`{seconds, nanoseconds}` or the underscored
/// `{_seconds, _nanoseconds}` variant), an RFC 3339 string, or a bare epoch-seconds
/// number.
pub fn coerce_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Object(wrapper) => {
            let seconds = wrapper
                .get("seconds")
                .or_else(|| wrapper.get("_seconds"))
                .and_then(as_i64_lossy)?;
            let nanos = wrapper
                .get("nanoseconds")
                .or_else(|| wrapper.get("_nanoseconds"))
                .and_then(as_i64_lossy)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).ok()?;
            DateTime::from_timestamp(seconds, nanos)
        }
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        Value::Number(n) => {
            if let Some(seconds) = n.as_i64() {
                DateTime::from_timestamp(seconds, 0)
            } else {
                let secs = n.as_f64()?;
                let whole = secs.floor();
                let nanos = ((secs - whole) * 1e9).round() as u32;
                DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
            }
        }
        _ => None,
    }
}

fn card_value<'a>(
    body: &'a Map<String, Value>,
    card_data: Option<&'a Map<String, Value>>,
    name: &str,
) -> Option<&'a Value> {
    card_data
        .and_then(|data| data.get(name))
        .filter(|v| !v.is_null())
        .or_else(|| body.get(name).filter(|v| !v.is_null()))
}

fn coerce_text(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

fn coerce_count(raw: Option<&Value>) -> u64 {
    match raw {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn as_i64_lossy(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
