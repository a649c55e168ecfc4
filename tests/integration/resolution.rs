//! Single-pair resolution through the reconciler facade.

use certmerge::reconcile::{PairState, ResolutionAction};
use certmerge::ApiError;
use serde_json::json;

use super::support::{card, Fixture};

fn divergent_pair() -> Fixture {
    let fx = Fixture::new();
    fx.seed_primary("777", card("777", "Jordan", "8", 100));
    fx.seed_secondary("777", card("777", "Jordan", "10", 200));
    fx
}

#[test]
fn test_conflicts_report_field_differences() {
    let fx = divergent_pair();
    let pairs = fx.reconciler.conflicts().unwrap();
    assert_eq!(pairs.len(), 1);
    let fields: Vec<String> = pairs[0]
        .conflicts
        .iter()
        .map(|d| d.field.to_string())
        .collect();
    assert!(fields.contains(&"grade".to_string()));
    assert!(fields.contains(&"lastUpdated".to_string()));
    assert_eq!(pairs[0].record_a.grade, "8");
    assert_eq!(pairs[0].record_b.grade, "10");
}

#[test]
fn test_keep_primary_removes_secondary_copy_only() {
    let fx = divergent_pair();
    fx.reconciler
        .resolve("777", ResolutionAction::KeepPrimary)
        .unwrap();
    assert_eq!(fx.primary_keys(), vec!["777".to_string()]);
    assert!(fx.secondary_keys().is_empty());
    assert!(fx.reconciler.conflicts().unwrap().is_empty());
    assert_eq!(fx.reconciler.pair_state("777").unwrap(), PairState::Resolved);
}

#[test]
fn test_merge_to_primary_takes_secondary_values() {
    let fx = divergent_pair();
    fx.reconciler
        .resolve("777", "merge-to-primary".parse().unwrap())
        .unwrap();
    let kept = fx
        .reconciler
        .accessor()
        .require(&fx.pair.primary, "777")
        .unwrap();
    assert_eq!(kept.grade, "10");
    assert_eq!(kept.origin, fx.pair.primary);
    assert!(fx.secondary_keys().is_empty());
}

#[test]
fn test_merge_to_primary_keeps_nested_fields() {
    let fx = divergent_pair();
    let mut doc = card("777", "Jordan", "10", 200);
    doc["cardData"]["year"] = json!("1986");
    fx.seed_secondary("777", doc.clone());

    fx.reconciler
        .resolve("777", ResolutionAction::MergeToPrimary)
        .unwrap();
    let raw = fx.store.raw(&fx.pair.primary, "777").unwrap();
    assert_eq!(raw, doc);
    assert_eq!(raw["cardData"]["certNumber"], "777");
}

#[test]
fn test_resolving_a_resolved_key_is_rejected() {
    let fx = divergent_pair();
    fx.reconciler
        .resolve("777", ResolutionAction::KeepSecondary)
        .unwrap();
    let err = fx
        .reconciler
        .resolve("777", ResolutionAction::KeepSecondary)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotADuplicate(ref c) if c == "777"));
    assert_eq!(fx.secondary_keys(), vec!["777".to_string()]);
}

#[test]
fn test_denied_delete_propagates() {
    let fx = divergent_pair();
    fx.store.faults().deny_writes(&fx.pair.secondary);
    let err = fx
        .reconciler
        .resolve("777", ResolutionAction::KeepPrimary)
        .unwrap_err();
    assert!(matches!(err, ApiError::StorageError(ref e) if e.is_permission_denied()));
    assert_eq!(fx.reconciler.pair_state("777").unwrap(), PairState::Unresolved);
}

#[test]
fn test_reintroduced_key_becomes_unresolved_again() {
    let fx = divergent_pair();
    fx.reconciler
        .resolve("777", ResolutionAction::KeepPrimary)
        .unwrap();
    fx.seed_secondary("777", card("777", "Jordan", "9", 300));
    assert_eq!(fx.reconciler.pair_state("777").unwrap(), PairState::Unresolved);
}
