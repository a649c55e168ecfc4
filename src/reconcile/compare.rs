//! Conflict Comparator: exact field-level differences between two same-keyed records.

use crate::types::Record;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields compared between the two copies of a duplicate, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    CardName,
    Brand,
    Grade,
    TotalPopulation,
    LastUpdated,
    AccessCount,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::CardName,
        Field::Brand,
        Field::Grade,
        Field::TotalPopulation,
        Field::LastUpdated,
        Field::AccessCount,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::CardName => "cardName",
            Field::Brand => "brand",
            Field::Grade => "grade",
            Field::TotalPopulation => "totalPopulation",
            Field::LastUpdated => "lastUpdated",
            Field::AccessCount => "accessCount",
        }
    }

    /// Value of this field on `record`.
    pub fn value_of(self, record: &Record) -> FieldValue {
        match self {
            Field::CardName => FieldValue::Text(record.card_name.clone()),
            Field::Brand => FieldValue::Text(record.brand.clone()),
            Field::Grade => FieldValue::Text(record.grade.clone()),
            Field::TotalPopulation => FieldValue::Count(record.total_population),
            Field::LastUpdated => FieldValue::Timestamp(record.last_updated),
            Field::AccessCount => FieldValue::Count(record.access_count),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Count(u64),
    Timestamp(Option<DateTime<Utc>>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Count(n) => write!(f, "{}", n),
            FieldValue::Timestamp(Some(ts)) => {
                f.write_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            FieldValue::Timestamp(None) => f.write_str("-"),
        }
    }
}

/// One attribute where the primary and secondary copies disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDiff {
    pub field: Field,
    pub value_in_a: FieldValue,
    pub value_in_b: FieldValue,
}

/// Compare two records field by field.
///
/// Exact-value comparison on normalized records; no fuzzy matching.
pub fn compare_records(record_a: &Record, record_b: &Record) -> Vec<FieldDiff> {
    Field::ALL
        .iter()
        .filter_map(|&field| {
            let value_in_a = field.value_of(record_a);
            let value_in_b = field.value_of(record_b);
            (value_in_a != value_in_b).then_some(FieldDiff {
                field,
                value_in_a,
                value_in_b,
            })
        })
        .collect()
}
