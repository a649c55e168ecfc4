//! Partial failures, re-runs and permission policy during bulk merges.

use certmerge::reconcile::{CancelToken, MergeProgress};
use certmerge::store::PermissionPolicy;
use certmerge::ApiError;

use super::support::{card, Fixture};

#[test]
fn test_failed_delete_leaves_duplicate_until_rerun() {
    let fx = Fixture::new();
    fx.seed_secondary("111", card("111", "Jordan", "10", 10));
    fx.seed_secondary("222", card("222", "Pippen", "9", 5));
    fx.store
        .faults()
        .fail_delete_times(&fx.pair.secondary, "111", 1);

    let first = fx
        .reconciler
        .execute(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();
    assert!(!first.success);
    assert_eq!(first.total_processed, 2);
    assert_eq!(first.uniques_moved, 1);
    assert_eq!(first.errors.len(), 1);
    assert_eq!(first.errors[0].cert_number, "111");

    // Written to primary but not removed from secondary: a duplicate again.
    let pairs = fx.reconciler.conflicts().unwrap();
    assert_eq!(pairs.len(), 1);
    assert!(!pairs[0].is_divergent());

    let second = fx
        .reconciler
        .execute(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();
    assert!(second.success);
    assert_eq!(second.total_processed, 1);
    assert_eq!(second.duplicates_overwritten, 1);
    assert!(fx.secondary_keys().is_empty());
    assert_eq!(fx.primary_keys(), vec!["111".to_string(), "222".to_string()]);
}

#[test]
fn test_one_failing_record_does_not_stop_the_run() {
    let fx = Fixture::new();
    for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
        fx.seed_secondary(key, card(key, "X", "9", 100 - i as i64));
    }
    fx.store.faults().fail_put(&fx.pair.primary, "b");

    let result = fx
        .reconciler
        .execute(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();
    assert_eq!(result.total_processed, 4);
    assert_eq!(result.uniques_moved, 3);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(fx.secondary_keys(), vec!["b".to_string()]);
}

#[test]
fn test_denied_destination_writes_fail_per_record() {
    let fx = Fixture::new();
    fx.seed_secondary("1", card("1", "A", "9", 1));
    fx.seed_secondary("2", card("2", "B", "9", 2));
    fx.store.faults().deny_writes(&fx.pair.primary);

    let result = fx
        .reconciler
        .execute(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.uniques_moved + result.duplicates_overwritten, 0);
    assert_eq!(fx.secondary_keys().len(), 2);
}

#[test]
fn test_unreadable_source_fails_whole_run_under_propagate() {
    let fx = Fixture::with_policy(PermissionPolicy::Propagate);
    fx.seed_secondary("1", card("1", "A", "9", 1));
    fx.store.faults().deny_reads(&fx.pair.secondary);

    let err = fx
        .reconciler
        .execute(&fx.pair.secondary, &fx.pair.primary)
        .unwrap_err();
    assert!(matches!(err, ApiError::StorageError(ref e) if e.is_permission_denied()));
}

#[test]
fn test_unreadable_source_is_empty_under_treat_as_empty() {
    let fx = Fixture::new();
    fx.seed_secondary("1", card("1", "A", "9", 1));
    fx.store.faults().deny_reads(&fx.pair.secondary);

    let result = fx
        .reconciler
        .execute(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();
    assert_eq!(result.total_processed, 0);
    assert!(result.success);
}

#[test]
fn test_cancelled_run_resumes_on_rerun() {
    let fx = Fixture::new();
    for (i, key) in ["a", "b", "c"].iter().enumerate() {
        fx.seed_secondary(key, card(key, "X", "9", 100 - i as i64));
    }
    let token = CancelToken::new();
    let trigger = token.clone();

    let partial = fx
        .reconciler
        .executor()
        .with_cancel(token)
        .on_progress(move |p: &MergeProgress<'_>| {
            if p.current == 1 {
                trigger.cancel();
            }
        })
        .run(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();
    assert!(partial.cancelled);
    assert_eq!(partial.total_processed, 1);
    assert_eq!(fx.secondary_keys().len(), 2);

    let rest = fx
        .reconciler
        .execute(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();
    assert!(!rest.cancelled);
    assert_eq!(rest.uniques_moved, 2);
    assert_eq!(fx.primary_keys().len(), 3);
}
