//! Get operation

use crate::backend::StoredRecord;
use crate::error::Result;
use crate::store::Store;
use crate::types::{join_namespace, GetOperation, MemoryItem};
use crate::validation::{validate_key, validate_namespace, validate_owner_id};

pub(crate) async fn get_operation(
    store: &Store,
    owner: &str,
    op: &GetOperation,
) -> Result<Option<MemoryItem>> {
    validate_owner_id(owner)?;
    validate_namespace(&op.namespace)?;
    validate_key(&op.key)?;

    let namespace_path = join_namespace(&op.namespace);
    let sort_key = StoredRecord::sort_key_for(&namespace_path, &op.key);

    let record = store
        .retry
        .run(|| store.backend.get(owner, &sort_key))
        .await?;

    Ok(record.map(|record| MemoryItem {
        namespace: op.namespace.clone(),
        key: record.key,
        value: record.value,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }))
}
