//! certmerge: duplicate-record reconciliation for certified-card collections
//!
//! Two collections hold certified-card metadata keyed by certification number. Over
//! time the same card can land in both. This crate finds those duplicates, shows
//! where they disagree, previews and executes a bulk merge of one collection into
//! the other, and applies single-pair resolutions chosen by an operator.

pub mod cli;
pub mod config;
pub mod error;
pub mod journal;
pub mod logging;
pub mod normalize;
pub mod reconcile;
pub mod store;
pub mod types;

pub use error::{ApiError, StorageError};
pub use reconcile::{
    CancelToken, DuplicatePair, MergePreview, MergeProgress, MergeResult, Reconciler,
    ResolutionAction,
};
pub use store::{DocumentStore, PermissionPolicy, StoreAccessor};
pub use types::{CollectionId, CollectionPair, Record};
