//! Merges against the sled backend, with and without atomic per-record moves.

use std::sync::Arc;

use certmerge::journal::{MergeJournal, RunStatus};
use certmerge::reconcile::MergeProgress;
use certmerge::store::{Document, DocumentStore, PermissionPolicy, SledDocumentStore, StoreAccessor};
use certmerge::types::{CollectionId, CollectionPair};
use certmerge::Reconciler;
use serde_json::Value;
use tempfile::TempDir;

use super::support::card;

fn sled_reconciler(dir: &TempDir, atomic: bool) -> (Arc<SledDocumentStore>, Reconciler) {
    let store = Arc::new(SledDocumentStore::new(dir.path().join("store")).unwrap());
    let reconciler = Reconciler::new(
        StoreAccessor::new(store.clone(), PermissionPolicy::TreatAsEmpty),
        CollectionPair::new("psa_cards", "psaCards"),
    )
    .with_atomic_moves(atomic);
    (store, reconciler)
}

fn seed(store: &SledDocumentStore, reconciler: &Reconciler) {
    let pair = reconciler.collections();
    let put = |col: &CollectionId, key: &str, body: Value| {
        store.put(col, &Document::new(key, body)).unwrap()
    };
    put(&pair.primary, "111", card("111", "Jordan", "9", 10));
    put(&pair.secondary, "111", card("111", "Jordan", "10", 20));
    put(&pair.secondary, "222", card("222", "Pippen", "8", 5));
}

#[test]
fn test_sled_backend_reports_atomic_transfer() {
    let dir = TempDir::new().unwrap();
    let (store, _) = sled_reconciler(&dir, true);
    assert!(store.supports_atomic_transfer());
}

#[test]
fn test_atomic_and_sequential_moves_agree() {
    for atomic in [false, true] {
        let dir = TempDir::new().unwrap();
        let (store, reconciler) = sled_reconciler(&dir, atomic);
        seed(&store, &reconciler);
        let pair = reconciler.collections().clone();

        let result = reconciler.execute(&pair.secondary, &pair.primary).unwrap();
        assert!(result.success, "atomic={}", atomic);
        assert_eq!(result.uniques_moved, 1);
        assert_eq!(result.duplicates_overwritten, 1);

        assert!(store.list(&pair.secondary).unwrap().is_empty());
        let accessor = reconciler.accessor();
        assert_eq!(accessor.require(&pair.primary, "111").unwrap().grade, "10");
        assert_eq!(accessor.list_all(&pair.primary).unwrap().len(), 2);
        let moved = store.get(&pair.primary, "222").unwrap().unwrap();
        assert_eq!(moved.body, card("222", "Pippen", "8", 5), "atomic={}", atomic);
    }
}

#[test]
fn test_preview_of_unknown_collection_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let (store, reconciler) = sled_reconciler(&dir, false);
    seed(&store, &reconciler);
    let before = store.db().tree_names();

    let preview = reconciler
        .preview(&CollectionId::new("psa_crads"), &reconciler.collections().primary)
        .unwrap();
    assert_eq!(preview.total_in_source, 0);
    reconciler.conflicts().unwrap();

    assert_eq!(store.db().tree_names(), before);
}

#[test]
fn test_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let (store, reconciler) = sled_reconciler(&dir, false);
        seed(&store, &reconciler);
        store.flush().unwrap();
    }
    let (_, reconciler) = sled_reconciler(&dir, false);
    assert_eq!(reconciler.conflicts().unwrap().len(), 1);
}

#[test]
fn test_journal_shares_database_with_store() {
    let dir = TempDir::new().unwrap();
    let db = sled::open(dir.path().join("store")).unwrap();
    let store = Arc::new(SledDocumentStore::from_db(db.clone()));
    let journal = MergeJournal::new(db).unwrap();
    let reconciler = Reconciler::new(
        StoreAccessor::new(store.clone(), PermissionPolicy::TreatAsEmpty),
        CollectionPair::new("psa_cards", "psaCards"),
    );
    seed(&store, &reconciler);
    let pair = reconciler.collections().clone();

    let mut writer = journal.start_run(&pair.secondary, &pair.primary).unwrap();
    let outcome = reconciler
        .executor()
        .on_progress(|p: &MergeProgress<'_>| writer.record_progress(p).unwrap())
        .run(&pair.secondary, &pair.primary);
    let run = writer.finish(outcome.as_ref().map_err(|e| e.to_string())).unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.total_processed, 2);
    assert_eq!(journal.read_events(&run.run_id).unwrap().len(), 4);
    // Journal trees never show up as collections.
    assert_eq!(store.list(&pair.primary).unwrap().len(), 2);
}
