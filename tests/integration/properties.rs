//! Property-based tests for planner, detector and executor guarantees

use std::collections::BTreeSet;
use std::sync::Arc;

use certmerge::reconcile::{find_duplicates, plan_merge};
use certmerge::store::{MemoryDocumentStore, PermissionPolicy, StoreAccessor};
use certmerge::types::{CollectionId, CollectionPair, Record};
use certmerge::Reconciler;
use proptest::prelude::*;
use serde_json::json;

fn key_sets() -> impl Strategy<Value = (BTreeSet<u16>, BTreeSet<u16>)> {
    (
        prop::collection::btree_set(0u16..64, 0..24),
        prop::collection::btree_set(0u16..64, 0..24),
    )
}

fn records(keys: &BTreeSet<u16>, origin: &CollectionId) -> Vec<Record> {
    keys.iter()
        .map(|k| Record::new(k.to_string(), origin.clone()))
        .collect()
}

/// Every source record is either unique or a duplicate, and only uniques grow the destination
#[test]
fn test_preview_conservation_and_final_count() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let a = CollectionId::new("A");
    let b = CollectionId::new("B");

    runner
        .run(&key_sets(), |(source_keys, dest_keys)| {
            let source = records(&source_keys, &a);
            let dest = records(&dest_keys, &b);
            let preview = plan_merge(&a, &b, &source, &dest);

            prop_assert_eq!(
                preview.unique_to_move.len() + preview.duplicates_to_overwrite.len(),
                preview.total_in_source
            );
            prop_assert_eq!(
                preview.projected_final_count,
                preview.total_in_dest + preview.unique_to_move.len()
            );
            prop_assert_eq!(
                preview.projected_final_count,
                source_keys.union(&dest_keys).count()
            );
            Ok(())
        })
        .unwrap();
}

/// Detection reports the same keys regardless of argument order, with records swapped
#[test]
fn test_detection_symmetry() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let a = CollectionId::new("A");
    let b = CollectionId::new("B");

    runner
        .run(&key_sets(), |(a_keys, b_keys)| {
            let ra = records(&a_keys, &a);
            let rb = records(&b_keys, &b);
            let forward = find_duplicates(&ra, &rb);
            let backward = find_duplicates(&rb, &ra);

            let forward_keys: BTreeSet<&str> =
                forward.iter().map(|p| p.cert_number.as_str()).collect();
            let backward_keys: BTreeSet<&str> =
                backward.iter().map(|p| p.cert_number.as_str()).collect();
            prop_assert_eq!(&forward_keys, &backward_keys);
            prop_assert_eq!(forward_keys.len(), a_keys.intersection(&b_keys).count());

            for pair in &forward {
                let mirrored = backward
                    .iter()
                    .find(|p| p.cert_number == pair.cert_number)
                    .unwrap();
                prop_assert_eq!(&pair.record_a, &mirrored.record_b);
                prop_assert_eq!(&pair.record_b, &mirrored.record_a);
            }
            Ok(())
        })
        .unwrap();
}

/// A clean merge empties the source and lands exactly at the projected count
#[test]
fn test_execute_matches_preview() {
    let mut runner = proptest::test_runner::TestRunner::new(proptest::test_runner::Config {
        cases: 64,
        ..proptest::test_runner::Config::default()
    });

    runner
        .run(&key_sets(), |(source_keys, dest_keys)| {
            let store = Arc::new(MemoryDocumentStore::new());
            let pair = CollectionPair::new("psa_cards", "psaCards");
            for k in &source_keys {
                store.seed(&pair.secondary, &k.to_string(), json!({ "grade": "10" }));
            }
            for k in &dest_keys {
                store.seed(&pair.primary, &k.to_string(), json!({ "grade": "9" }));
            }
            let reconciler = Reconciler::new(
                StoreAccessor::new(store.clone(), PermissionPolicy::TreatAsEmpty),
                pair.clone(),
            );

            let preview = reconciler.preview(&pair.secondary, &pair.primary).unwrap();
            let result = reconciler.execute(&pair.secondary, &pair.primary).unwrap();

            prop_assert!(result.success);
            prop_assert_eq!(result.total_processed, source_keys.len());
            prop_assert_eq!(result.uniques_moved, preview.unique_to_move.len());
            prop_assert_eq!(
                result.duplicates_overwritten,
                preview.duplicates_to_overwrite.len()
            );
            prop_assert!(store.is_empty(&pair.secondary));
            prop_assert_eq!(store.len(&pair.primary), preview.projected_final_count);

            let rerun = reconciler.execute(&pair.secondary, &pair.primary).unwrap();
            prop_assert_eq!(rerun.total_processed, 0);
            Ok(())
        })
        .unwrap();
}
