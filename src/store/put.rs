//! Put and delete operations
//!
//! A put with `value: None` deletes the item. When an embedder is configured
//! and the op carries index paths, text fragments are extracted from the
//! value and embedded at write time; unlike search-time reranking, embedding
//! failures here are fatal, since a silently unindexed item would be
//! invisible to semantic search forever.

use chrono::Utc;
use serde_json::Value;

use crate::backend::StoredRecord;
use crate::error::Result;
use crate::store::Store;
use crate::types::{join_namespace, PutOperation};
use crate::validation::{
    validate_embeddings, validate_index_paths, validate_key, validate_namespace,
    validate_owner_id, validate_ttl_days, validate_value,
};

pub(crate) async fn put_operation(store: &Store, owner: &str, op: &PutOperation) -> Result<()> {
    validate_owner_id(owner)?;
    validate_namespace(&op.namespace)?;
    validate_key(&op.key)?;
    validate_ttl_days(store.ttl_days)?;

    let namespace_path = join_namespace(&op.namespace);
    let sort_key = StoredRecord::sort_key_for(&namespace_path, &op.key);

    let Some(value) = &op.value else {
        return store
            .retry
            .run(|| store.backend.delete(owner, &sort_key))
            .await;
    };
    validate_value(value)?;

    let embeddings = match (&store.embedder, &op.index) {
        (Some(embedder), Some(paths)) if !paths.is_empty() => {
            validate_index_paths(paths)?;
            let texts = extract_index_texts(value, paths);
            if texts.is_empty() {
                None
            } else {
                let vectors = embedder.embed_documents(&texts).await?;
                validate_embeddings(&vectors)?;
                Some(vectors)
            }
        }
        _ => None,
    };

    let now = Utc::now();
    let record = StoredRecord {
        partition: owner.to_string(),
        sort_key,
        namespace: namespace_path,
        key: op.key.clone(),
        value: value.clone(),
        embeddings,
        created_at: now,
        updated_at: now,
        expires_at: store
            .ttl_days
            .map(|days| now.timestamp() + i64::from(days) * 24 * 60 * 60),
    };

    store
        .retry
        .run(|| store.backend.upsert(record.clone()))
        .await
}

/// Resolve validated dotted paths against the value and collect the text
/// fragments to embed. Strings are taken as-is, numbers and booleans are
/// stringified, other non-null values are serialized; missing paths are
/// skipped.
fn extract_index_texts(value: &Value, paths: &[String]) -> Vec<String> {
    let mut texts = Vec::new();
    for path in paths {
        let body = path.strip_prefix("$.").unwrap_or(path);
        let mut current = value;
        let mut found = true;
        for segment in body.split('.') {
            match current.get(segment) {
                Some(next) => current = next,
                None => {
                    found = false;
                    break;
                }
            }
        }
        if !found {
            continue;
        }
        match current {
            Value::String(s) => texts.push(s.clone()),
            Value::Number(n) => texts.push(n.to_string()),
            Value::Bool(b) => texts.push(b.to_string()),
            Value::Null => {}
            other => {
                if let Ok(serialized) = serde_json::to_string(other) {
                    texts.push(serialized);
                }
            }
        }
    }
    texts
}
