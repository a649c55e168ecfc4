//! Event schema for the merge journal.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EVENT_RUN_STARTED: &str = "run_started";
pub const EVENT_RECORD_MOVED: &str = "record_moved";
pub const EVENT_RECORD_FAILED: &str = "record_failed";
pub const EVENT_RUN_ENDED: &str = "run_ended";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEvent {
    pub ts: String,
    pub run: String,
    pub seq: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

impl JournalEvent {
    pub fn with_now(run: impl Into<String>, seq: u64, event_type: impl Into<String>, data: Value) -> Self {
        Self {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            run: run.into(),
            seq,
            event_type: event_type.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStartedData {
    pub source: String,
    pub dest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEventData {
    pub cert_number: String,
    pub is_unique: bool,
    pub current: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEndedData {
    pub status: String,
    pub processed: usize,
    pub uniques_moved: usize,
    pub duplicates_overwritten: usize,
    pub errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
