//! Durable sled-backed merge journal.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sled::{Db, Tree};

use crate::error::StorageError;
use crate::journal::event::{
    JournalEvent, RecordEventData, RunEndedData, RunStartedData, EVENT_RECORD_FAILED,
    EVENT_RECORD_MOVED, EVENT_RUN_ENDED, EVENT_RUN_STARTED,
};
use crate::reconcile::{MergeProgress, MergeResult};
use crate::types::CollectionId;

const TREE_RUNS: &str = "journal_runs";
const TREE_EVENTS: &str = "journal_events";
const EVENT_KEY_PAD: usize = 20;

static RUN_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Active,
    Completed,
    PartialFailure,
    Cancelled,
    Failed,
    Interrupted,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Active => "active",
            RunStatus::Completed => "completed",
            RunStatus::PartialFailure => "partial_failure",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Interrupted => "interrupted",
        }
    }

    pub fn is_finished(self) -> bool {
        !matches!(self, RunStatus::Active)
    }

    /// Status of a run that returned `result`.
    pub fn from_result(result: &MergeResult) -> Self {
        if result.cancelled {
            RunStatus::Cancelled
        } else if result.success {
            RunStatus::Completed
        } else {
            RunStatus::PartialFailure
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub source: CollectionId,
    pub dest: CollectionId,
    pub started_at_ms: u64,
    pub ended_at_ms: Option<u64>,
    pub status: RunStatus,
    pub total_processed: usize,
    pub uniques_moved: usize,
    pub duplicates_overwritten: usize,
    pub error_count: usize,
    pub error: Option<String>,
}

/// Journal of merge runs and their per-record events.
#[derive(Clone)]
pub struct MergeJournal {
    db: Db,
    runs: Tree,
    events: Tree,
}

impl MergeJournal {
    pub fn new(db: Db) -> Result<Self, StorageError> {
        let runs = db.open_tree(TREE_RUNS).map_err(to_storage_io)?;
        let events = db.open_tree(TREE_EVENTS).map_err(to_storage_io)?;
        Ok(Self { db, runs, events })
    }

    /// Record the start of a run and return a writer for its events.
    pub fn start_run(&self, source: &CollectionId, dest: &CollectionId) -> Result<RunWriter<'_>, StorageError> {
        let record = RunRecord {
            run_id: new_run_id(),
            source: source.clone(),
            dest: dest.clone(),
            started_at_ms: now_millis(),
            ended_at_ms: None,
            status: RunStatus::Active,
            total_processed: 0,
            uniques_moved: 0,
            duplicates_overwritten: 0,
            error_count: 0,
            error: None,
        };
        self.put_run(&record)?;

        let mut writer = RunWriter {
            journal: self,
            record,
            next_seq: 1,
        };
        let data = RunStartedData {
            source: source.to_string(),
            dest: dest.to_string(),
        };
        writer.append(EVENT_RUN_STARTED, serde_json::to_value(data).map_err(to_storage_data)?)?;
        self.flush()?;
        Ok(writer)
    }

    pub fn put_run(&self, record: &RunRecord) -> Result<(), StorageError> {
        let value = serde_json::to_vec(record).map_err(to_storage_data)?;
        self.runs
            .insert(record.run_id.as_bytes(), value)
            .map_err(to_storage_io)?;
        Ok(())
    }

    pub fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>, StorageError> {
        let Some(raw) = self.runs.get(run_id.as_bytes()).map_err(to_storage_io)? else {
            return Ok(None);
        };
        let parsed = serde_json::from_slice(&raw).map_err(to_storage_data)?;
        Ok(Some(parsed))
    }

    /// All runs, newest first.
    pub fn list_runs(&self) -> Result<Vec<RunRecord>, StorageError> {
        let mut out = Vec::new();
        for result in self.runs.iter() {
            let (_, value) = result.map_err(to_storage_io)?;
            let rec: RunRecord = serde_json::from_slice(&value).map_err(to_storage_data)?;
            out.push(rec);
        }
        out.sort_by_key(|r| std::cmp::Reverse(r.started_at_ms));
        Ok(out)
    }

    pub fn append_event(&self, event: &JournalEvent) -> Result<(), StorageError> {
        let key = encode_event_key(&event.run, event.seq);
        let value = serde_json::to_vec(event).map_err(to_storage_data)?;
        self.events
            .insert(key.as_bytes(), value)
            .map_err(to_storage_io)?;
        Ok(())
    }

    pub fn read_events(&self, run_id: &str) -> Result<Vec<JournalEvent>, StorageError> {
        let prefix = format!("{run_id}:");
        let mut out = Vec::new();
        for result in self.events.scan_prefix(prefix.as_bytes()) {
            let (_, value) = result.map_err(to_storage_io)?;
            let parsed: JournalEvent = serde_json::from_slice(&value).map_err(to_storage_data)?;
            out.push(parsed);
        }
        out.sort_by_key(|e| e.seq);
        Ok(out)
    }

    /// Runs still `Active` belong to a process that died mid-merge.
    pub fn mark_interrupted_runs(&self) -> Result<usize, StorageError> {
        let mut changed = 0usize;
        for mut run in self.list_runs()? {
            if run.status == RunStatus::Active {
                run.status = RunStatus::Interrupted;
                run.ended_at_ms = Some(now_millis());
                self.put_run(&run)?;
                changed += 1;
            }
        }
        if changed > 0 {
            self.flush()?;
        }
        Ok(changed)
    }

    /// Keep the newest `max_finished` finished runs; delete the rest with their events.
    pub fn prune(&self, max_finished: usize) -> Result<usize, StorageError> {
        let finished: Vec<RunRecord> = self
            .list_runs()?
            .into_iter()
            .filter(|r| r.status.is_finished())
            .collect();
        let mut removed = 0usize;
        for run in finished.iter().skip(max_finished) {
            self.delete_run(&run.run_id)?;
            removed += 1;
        }
        Ok(removed)
    }

    pub fn delete_run(&self, run_id: &str) -> Result<(), StorageError> {
        self.runs.remove(run_id.as_bytes()).map_err(to_storage_io)?;
        let prefix = format!("{run_id}:");
        let keys: Vec<Vec<u8>> = self
            .events
            .scan_prefix(prefix.as_bytes())
            .filter_map(|r| r.ok().map(|(k, _)| k.to_vec()))
            .collect();
        for key in keys {
            self.events.remove(key).map_err(to_storage_io)?;
        }
        Ok(())
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush().map_err(to_storage_io)?;
        Ok(())
    }
}

/// Event writer for one in-flight run.
pub struct RunWriter<'j> {
    journal: &'j MergeJournal,
    record: RunRecord,
    next_seq: u64,
}

impl<'j> RunWriter<'j> {
    pub fn run_id(&self) -> &str {
        &self.record.run_id
    }

    /// Journal one executor progress notification.
    pub fn record_progress(&mut self, progress: &MergeProgress<'_>) -> Result<(), StorageError> {
        let event_type = if progress.error.is_some() {
            EVENT_RECORD_FAILED
        } else {
            EVENT_RECORD_MOVED
        };
        let data = RecordEventData {
            cert_number: progress.cert_number.to_string(),
            is_unique: progress.is_unique,
            current: progress.current,
            total: progress.total,
            error: progress.error.map(str::to_string),
        };
        self.append(event_type, serde_json::to_value(data).map_err(to_storage_data)?)
    }

    /// Close the run with the executor's outcome. `Err` marks the run failed.
    pub fn finish(mut self, outcome: Result<&MergeResult, String>) -> Result<RunRecord, StorageError> {
        match outcome {
            Ok(result) => {
                self.record.status = RunStatus::from_result(result);
                self.record.total_processed = result.total_processed;
                self.record.uniques_moved = result.uniques_moved;
                self.record.duplicates_overwritten = result.duplicates_overwritten;
                self.record.error_count = result.errors.len();
            }
            Err(message) => {
                self.record.status = RunStatus::Failed;
                self.record.error = Some(message);
            }
        }
        self.record.ended_at_ms = Some(now_millis());

        let data = RunEndedData {
            status: self.record.status.as_str().to_string(),
            processed: self.record.total_processed,
            uniques_moved: self.record.uniques_moved,
            duplicates_overwritten: self.record.duplicates_overwritten,
            errors: self.record.error_count,
            error: self.record.error.clone(),
        };
        self.append(EVENT_RUN_ENDED, serde_json::to_value(data).map_err(to_storage_data)?)?;
        self.journal.put_run(&self.record)?;
        self.journal.flush()?;
        Ok(self.record)
    }

    fn append(&mut self, event_type: &str, data: serde_json::Value) -> Result<(), StorageError> {
        let event = JournalEvent::with_now(self.record.run_id.clone(), self.next_seq, event_type, data);
        self.journal.append_event(&event)?;
        self.next_seq += 1;
        Ok(())
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn new_run_id() -> String {
    let ts = now_millis();
    let pid = std::process::id();
    let seq = RUN_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("run-{ts}-{pid}-{seq}")
}

fn encode_event_key(run_id: &str, seq: u64) -> String {
    format!("{run_id}:{seq:0EVENT_KEY_PAD$}")
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::Other, err.to_string()))
}

fn to_storage_data(err: serde_json::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
}
