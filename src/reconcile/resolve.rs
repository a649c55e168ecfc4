//! Resolution Applier: operator-chosen action on a single duplicate pair.

use crate::error::ApiError;
use crate::store::StoreAccessor;
use crate::types::CollectionPair;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// How to resolve one duplicate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionAction {
    /// Delete the secondary copy; primary untouched.
    KeepPrimary,
    /// Delete the primary copy; secondary untouched.
    KeepSecondary,
    /// Overwrite primary with the secondary copy, then delete the secondary copy.
    MergeToPrimary,
}

impl ResolutionAction {
    pub const ALL: [ResolutionAction; 3] = [
        ResolutionAction::KeepPrimary,
        ResolutionAction::KeepSecondary,
        ResolutionAction::MergeToPrimary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionAction::KeepPrimary => "keep-primary",
            ResolutionAction::KeepSecondary => "keep-secondary",
            ResolutionAction::MergeToPrimary => "merge-to-primary",
        }
    }
}

impl fmt::Display for ResolutionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionAction {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResolutionAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s.trim())
            .ok_or_else(|| ApiError::InvalidResolution(s.to_string()))
    }
}

/// Lifecycle of a duplicate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairState {
    /// The key is present in both collections.
    Unresolved,
    /// The key is present in at most one collection.
    Resolved,
}

/// Result of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionOutcome {
    pub cert_number: String,
    pub action: ResolutionAction,
    pub state: PairState,
}

/// Apply `action` to the duplicate keyed by `cert_number`.
///
/// The key must currently exist in both collections; otherwise nothing is written
/// and [`ApiError::NotADuplicate`] is returned. Store errors propagate.
pub fn apply_resolution(
    accessor: &StoreAccessor,
    collections: &CollectionPair,
    cert_number: &str,
    action: ResolutionAction,
) -> Result<ResolutionOutcome, ApiError> {
    let primary = accessor.get(&collections.primary, cert_number)?;
    let secondary = accessor.fetch(&collections.secondary, cert_number)?;
    let (Some(_), Some(secondary)) = (primary, secondary) else {
        return Err(ApiError::NotADuplicate(cert_number.to_string()));
    };

    match action {
        ResolutionAction::KeepPrimary => {
            accessor.delete(&collections.secondary, cert_number)?;
        }
        ResolutionAction::KeepSecondary => {
            accessor.delete(&collections.primary, cert_number)?;
        }
        ResolutionAction::MergeToPrimary => {
            accessor.put(&collections.primary, &secondary.document())?;
            accessor.delete(&collections.secondary, cert_number)?;
        }
    }

    info!(cert_number, action = %action, "Duplicate resolved");
    Ok(ResolutionOutcome {
        cert_number: cert_number.to_string(),
        action,
        state: PairState::Resolved,
    })
}
