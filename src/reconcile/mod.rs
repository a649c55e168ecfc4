//! Duplicate reconciliation engine.
//!
//! [`Reconciler`] ties the components together over one [`StoreAccessor`] and the
//! configured primary/secondary collection pair:
//!
//! - [`detect`]: keys present in both collections
//! - [`compare`]: field-level differences of a duplicate
//! - [`plan`]: read-only merge preview
//! - [`execute`]: bulk merge with progress and per-record failure isolation
//! - [`resolve`]: single-pair operator actions

pub mod compare;
pub mod detect;
pub mod execute;
pub mod plan;
pub mod resolve;

pub use compare::{compare_records, Field, FieldDiff, FieldValue};
pub use detect::{detect_duplicates, find_duplicates, DuplicatePair};
pub use execute::{CancelToken, MergeExecutor, MergeProgress, MergeResult, RecordError};
pub use plan::{plan_merge, preview_merge, MergePreview};
pub use resolve::{apply_resolution, PairState, ResolutionAction, ResolutionOutcome};

use crate::error::ApiError;
use crate::store::StoreAccessor;
use crate::types::{CollectionId, CollectionPair};

/// Engine facade over a store accessor and a collection pair.
#[derive(Clone)]
pub struct Reconciler {
    accessor: StoreAccessor,
    collections: CollectionPair,
    atomic_moves: bool,
}

impl Reconciler {
    pub fn new(accessor: StoreAccessor, collections: CollectionPair) -> Self {
        Self {
            accessor,
            collections,
            atomic_moves: false,
        }
    }

    /// Prefer the backend's atomic per-record transfer during bulk merges.
    pub fn with_atomic_moves(mut self, enabled: bool) -> Self {
        self.atomic_moves = enabled;
        self
    }

    pub fn accessor(&self) -> &StoreAccessor {
        &self.accessor
    }

    pub fn collections(&self) -> &CollectionPair {
        &self.collections
    }

    /// Current duplicate pairs with their field conflicts, in primary listing order.
    pub fn conflicts(&self) -> Result<Vec<DuplicatePair>, ApiError> {
        let primary = self.accessor.list_all(&self.collections.primary)?;
        let secondary = self.accessor.list_all(&self.collections.secondary)?;
        Ok(detect_duplicates(&primary, &secondary))
    }

    pub fn preview(&self, source: &CollectionId, dest: &CollectionId) -> Result<MergePreview, ApiError> {
        preview_merge(&self.accessor, source, dest)
    }

    /// An executor for `source` → `dest`, configured from this reconciler. Attach
    /// progress or cancellation before calling [`MergeExecutor::run`].
    pub fn executor(&self) -> MergeExecutor<'_> {
        MergeExecutor::new(&self.accessor).atomic_moves(self.atomic_moves)
    }

    /// Run a bulk merge without progress reporting.
    pub fn execute(&self, source: &CollectionId, dest: &CollectionId) -> Result<MergeResult, ApiError> {
        self.executor().run(source, dest)
    }

    pub fn resolve(&self, cert_number: &str, action: ResolutionAction) -> Result<ResolutionOutcome, ApiError> {
        apply_resolution(&self.accessor, &self.collections, cert_number, action)
    }

    /// Whether `cert_number` is currently a duplicate.
    pub fn pair_state(&self, cert_number: &str) -> Result<PairState, ApiError> {
        let in_primary = self.accessor.get(&self.collections.primary, cert_number)?;
        let in_secondary = self.accessor.get(&self.collections.secondary, cert_number)?;
        Ok(match (in_primary, in_secondary) {
            (Some(_), Some(_)) => PairState::Unresolved,
            _ => PairState::Resolved,
        })
    }
}
