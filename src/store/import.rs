//! Bulk loading of raw JSON documents into a collection.

use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::normalize::normalize_document;
use crate::store::{Document, DocumentStore};
use crate::types::CollectionId;

/// Documents extracted from an import payload, keyed by certification number.
///
/// Accepts either an object mapping keys to documents, or an array of documents
/// that each carry `certNumber` at the top level or inside `cardData`.
pub fn documents_from_json(collection: &CollectionId, payload: &Value) -> Result<Vec<Document>, ApiError> {
    let documents = match payload {
        Value::Object(map) => map
            .iter()
            .map(|(key, body)| Document::new(key.clone(), body.clone()))
            .collect::<Vec<_>>(),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, body) in items.iter().enumerate() {
                let key = embedded_key(body).ok_or_else(|| {
                    ApiError::InvalidInput(format!("document at index {} has no certNumber", index))
                })?;
                out.push(Document::new(key, body.clone()));
            }
            out
        }
        _ => {
            return Err(ApiError::InvalidInput(
                "import payload must be a JSON object or array".to_string(),
            ))
        }
    };

    for document in &documents {
        normalize_document(collection, &document.key, &document.body)?;
    }
    Ok(documents)
}

/// Write `documents` into `collection`, overwriting existing keys.
pub fn import_documents(
    backend: &dyn DocumentStore,
    collection: &CollectionId,
    documents: &[Document],
) -> Result<usize, ApiError> {
    for document in documents {
        backend.put(collection, document)?;
        debug!(collection = %collection, key = %document.key, "Imported document");
    }
    Ok(documents.len())
}

fn embedded_key(body: &Value) -> Option<String> {
    let raw = body
        .get("certNumber")
        .or_else(|| body.get("cardData").and_then(|card| card.get("certNumber")))?;
    match raw {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
