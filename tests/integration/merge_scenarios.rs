//! End-to-end merge behavior over the in-memory backend.

use std::cell::RefCell;

use certmerge::reconcile::{MergeProgress, ResolutionAction};
use certmerge::types::CollectionId;
use serde_json::json;

use super::support::{card, Fixture};

#[test]
fn test_preview_then_execute_concrete_scenario() {
    let fx = Fixture::new();
    let a = CollectionId::new("A");
    let b = CollectionId::new("B");
    fx.store.seed(&a, "111", json!({ "grade": "9" }));
    fx.store.seed(&a, "222", json!({ "grade": "10" }));
    fx.store.seed(&b, "222", json!({ "grade": "8" }));

    let preview = fx.reconciler.preview(&a, &b).unwrap();
    assert_eq!(preview.unique_to_move, vec!["111".to_string()]);
    assert_eq!(preview.duplicates_to_overwrite, vec!["222".to_string()]);
    assert_eq!(preview.projected_final_count, 2);

    let result = fx.reconciler.execute(&a, &b).unwrap();
    assert!(result.success);
    assert_eq!(result.uniques_moved, 1);
    assert_eq!(result.duplicates_overwritten, 1);

    assert!(fx.store.is_empty(&a));
    assert_eq!(fx.store.keys(&b), vec!["111".to_string(), "222".to_string()]);
    let accessor = fx.reconciler.accessor();
    assert_eq!(accessor.require(&b, "111").unwrap().grade, "9");
    assert_eq!(accessor.require(&b, "222").unwrap().grade, "10");
}

#[test]
fn test_preview_performs_no_writes() {
    let fx = Fixture::new();
    fx.seed_primary("111", card("111", "Jordan", "9", 100));
    fx.seed_secondary("111", card("111", "Jordan", "10", 200));
    fx.seed_secondary("333", card("333", "Pippen", "8", 50));

    for _ in 0..3 {
        fx.reconciler
            .preview(&fx.pair.secondary, &fx.pair.primary)
            .unwrap();
    }
    assert_eq!(fx.primary_keys(), vec!["111".to_string()]);
    assert_eq!(fx.secondary_keys(), vec!["111".to_string(), "333".to_string()]);
}

#[test]
fn test_post_merge_sizes_and_idempotent_rerun() {
    let fx = Fixture::new();
    fx.seed_primary("100", card("100", "Bird", "9", 10));
    fx.seed_primary("200", card("200", "Magic", "9", 20));
    fx.seed_secondary("200", card("200", "Magic", "10", 30));
    fx.seed_secondary("300", card("300", "Ewing", "7", 40));
    fx.seed_secondary("400", card("400", "Barkley", "8", 50));

    let preview = fx
        .reconciler
        .preview(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();
    let result = fx
        .reconciler
        .execute(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();
    assert!(result.success);
    assert!(fx.secondary_keys().is_empty());
    assert_eq!(
        fx.primary_keys().len(),
        preview.total_in_dest + preview.unique_to_move.len()
    );

    let second = fx
        .reconciler
        .execute(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();
    assert_eq!(second.total_processed, 0);
    assert!(second.success);
}

#[test]
fn test_progress_follows_newest_first_snapshot_order() {
    let fx = Fixture::new();
    fx.seed_secondary("old", card("old", "A", "9", 100));
    fx.seed_secondary("new", card("new", "B", "9", 300));
    fx.seed_secondary("mid", card("mid", "C", "9", 200));
    fx.seed_primary("mid", card("mid", "C", "8", 50));

    let seen = RefCell::new(Vec::new());
    let result = fx
        .reconciler
        .executor()
        .on_progress(|p: &MergeProgress<'_>| {
            seen.borrow_mut()
                .push((p.current, p.total, p.cert_number.to_string(), p.is_unique));
        })
        .run(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();

    assert_eq!(result.total_processed, 3);
    assert_eq!(
        seen.into_inner(),
        vec![
            (1, 3, "new".to_string(), true),
            (2, 3, "mid".to_string(), false),
            (3, 3, "old".to_string(), true),
        ]
    );
}

#[test]
fn test_extra_fields_survive_a_move() {
    let fx = Fixture::new();
    let mut doc = card("555", "Kobe", "10", 10);
    doc["imageUrl"] = json!("https://img.example/555.png");
    doc["cardData"]["year"] = json!("1996");
    fx.seed_secondary("555", doc.clone());
    let sparse = json!({ "cardData": { "certNumber": "556", "grade": "9" } });
    fx.seed_secondary("556", sparse.clone());

    fx.reconciler
        .execute(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();

    let raw = fx.store.raw(&fx.pair.primary, "555").unwrap();
    assert_eq!(raw, doc);
    assert_eq!(raw["cardData"]["certNumber"], "555");
    assert_eq!(raw["cardData"]["year"], "1996");

    // Absent fields stay absent rather than being filled with defaults.
    assert_eq!(fx.store.raw(&fx.pair.primary, "556").unwrap(), sparse);
}

#[test]
fn test_merged_keys_are_no_longer_duplicates() {
    let fx = Fixture::new();
    fx.seed_primary("1", card("1", "A", "9", 1));
    fx.seed_secondary("1", card("1", "A", "10", 2));
    fx.seed_primary("2", card("2", "B", "9", 1));
    fx.seed_secondary("2", card("2", "B", "9", 1));

    assert_eq!(fx.reconciler.conflicts().unwrap().len(), 2);
    fx.reconciler
        .resolve("2", ResolutionAction::KeepPrimary)
        .unwrap();
    fx.reconciler
        .execute(&fx.pair.secondary, &fx.pair.primary)
        .unwrap();
    assert!(fx.reconciler.conflicts().unwrap().is_empty());
}
