//! Shared fixtures for integration tests.

use std::sync::Arc;

use certmerge::store::{MemoryDocumentStore, PermissionPolicy, StoreAccessor};
use certmerge::types::CollectionPair;
use certmerge::Reconciler;
use serde_json::{json, Value};

pub fn pair() -> CollectionPair {
    CollectionPair::new("psa_cards", "psaCards")
}

/// Document in the nested `cardData` shape most writers produce.
pub fn card(cert: &str, name: &str, grade: &str, seconds: i64) -> Value {
    json!({
        "certNumber": cert,
        "cardData": {
            "certNumber": cert,
            "cardName": name,
            "brand": "Topps",
            "grade": grade,
            "totalPopulation": 12
        },
        "lastUpdated": { "seconds": seconds, "nanoseconds": 0 },
        "accessCount": 1
    })
}

pub struct Fixture {
    pub store: Arc<MemoryDocumentStore>,
    pub pair: CollectionPair,
    pub reconciler: Reconciler,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_policy(PermissionPolicy::TreatAsEmpty)
    }

    pub fn with_policy(policy: PermissionPolicy) -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let pair = pair();
        let reconciler = Reconciler::new(StoreAccessor::new(store.clone(), policy), pair.clone());
        Self {
            store,
            pair,
            reconciler,
        }
    }

    pub fn seed_primary(&self, key: &str, body: Value) {
        self.store.seed(&self.pair.primary, key, body);
    }

    pub fn seed_secondary(&self, key: &str, body: Value) {
        self.store.seed(&self.pair.secondary, key, body);
    }

    pub fn primary_keys(&self) -> Vec<String> {
        self.store.keys(&self.pair.primary)
    }

    pub fn secondary_keys(&self) -> Vec<String> {
        self.store.keys(&self.pair.secondary)
    }
}
