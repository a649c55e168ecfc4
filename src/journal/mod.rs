//! Merge run journal: durable history of bulk merges and their per-record events.

pub mod event;
pub mod store;

pub use event::{JournalEvent, RecordEventData, RunEndedData, RunStartedData};
pub use store::{new_run_id, now_millis, MergeJournal, RunRecord, RunStatus, RunWriter};
