//! Eager input validation for store operations
//!
//! Every check here runs before any backend I/O, so a malformed request
//! never contacts the backend. All failures are `TrellisError::Validation`.

use serde_json::Value;

use crate::error::{Result, TrellisError};

/// Maximum key length in characters
pub const MAX_KEY_LENGTH: usize = 1024;
/// Maximum namespace depth in segments (owner excluded)
pub const MAX_NAMESPACE_DEPTH: usize = 20;
/// Maximum serialized value size in bytes (partitioned-backend item limit)
pub const MAX_VALUE_SIZE: usize = 400 * 1024;
/// Maximum dimensions of a single embedding vector
pub const MAX_EMBEDDING_DIMENSIONS: usize = 10_000;
/// Maximum embedding vectors per item
pub const MAX_EMBEDDINGS_PER_ITEM: usize = 100;
/// Maximum page size
pub const MAX_LIMIT: usize = 1000;
/// Maximum pagination offset
pub const MAX_OFFSET: usize = 10_000;
/// Maximum `max_depth` for namespace listing
pub const MAX_DEPTH: usize = 100;
/// Maximum operations in a single batch
pub const MAX_BATCH_SIZE: usize = 100;
/// Maximum length of a single index path expression
pub const MAX_INDEX_PATH_LENGTH: usize = 500;
/// Maximum number of index path expressions per put
pub const MAX_INDEX_PATHS: usize = 50;
/// Maximum owner (tenant/user) id length
pub const MAX_OWNER_ID_LENGTH: usize = 256;
/// Maximum TTL in days (5 years)
pub const MAX_TTL_DAYS: u32 = 365 * 5;

fn invalid(message: impl Into<String>) -> TrellisError {
    TrellisError::Validation(message.into())
}

/// Validate an owner (tenant/user) identifier
pub fn validate_owner_id(owner_id: &str) -> Result<()> {
    if owner_id.is_empty() {
        return Err(invalid("Owner id cannot be empty"));
    }
    if owner_id.len() > MAX_OWNER_ID_LENGTH {
        return Err(invalid(format!(
            "Owner id exceeds maximum length of {MAX_OWNER_ID_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a namespace path: non-empty, depth-bounded, segments free of
/// the reserved key-encoding separators
pub fn validate_namespace(namespace: &[String]) -> Result<()> {
    if namespace.is_empty() {
        return Err(invalid("Namespace cannot be empty"));
    }
    if namespace.len() > MAX_NAMESPACE_DEPTH {
        return Err(invalid(format!(
            "Namespace depth exceeds maximum of {MAX_NAMESPACE_DEPTH} levels"
        )));
    }
    for part in namespace {
        if part.is_empty() {
            return Err(invalid("Namespace segments cannot be empty strings"));
        }
        if part.contains('#') {
            return Err(invalid("Namespace segments cannot contain '#' character"));
        }
        if part.contains('/') {
            return Err(invalid("Namespace segments cannot contain '/' character"));
        }
    }
    Ok(())
}

/// Validate an item key
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(invalid("Key cannot be empty"));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(invalid(format!(
            "Key exceeds maximum length of {MAX_KEY_LENGTH} characters"
        )));
    }
    if key.contains('#') {
        return Err(invalid("Key cannot contain '#' character"));
    }
    Ok(())
}

/// Validate a value's serialized size against the backend item limit
pub fn validate_value(value: &Value) -> Result<()> {
    let size = serde_json::to_string(value)?.len();
    if size > MAX_VALUE_SIZE {
        return Err(invalid(format!(
            "Value size ({size} bytes) exceeds maximum of {MAX_VALUE_SIZE} bytes"
        )));
    }
    Ok(())
}

/// Validate pagination bounds
pub fn validate_pagination(limit: usize, offset: usize) -> Result<()> {
    if limit > MAX_LIMIT {
        return Err(invalid(format!("Limit cannot exceed {MAX_LIMIT}")));
    }
    if offset > MAX_OFFSET {
        return Err(invalid(format!("Offset cannot exceed {MAX_OFFSET}")));
    }
    Ok(())
}

/// Validate the `max_depth` parameter for namespace listing
pub fn validate_max_depth(max_depth: Option<usize>) -> Result<()> {
    let Some(depth) = max_depth else {
        return Ok(());
    };
    if depth < 1 {
        return Err(invalid("max_depth must be at least 1"));
    }
    if depth > MAX_DEPTH {
        return Err(invalid(format!("max_depth cannot exceed {MAX_DEPTH}")));
    }
    Ok(())
}

/// Validate the number of operations in a batch
pub fn validate_batch_size(operations_count: usize) -> Result<()> {
    if operations_count < 1 {
        return Err(invalid("Batch must contain at least one operation"));
    }
    if operations_count > MAX_BATCH_SIZE {
        return Err(invalid(format!(
            "Batch size ({operations_count}) exceeds maximum of {MAX_BATCH_SIZE} operations"
        )));
    }
    Ok(())
}

/// Validate a TTL in days, including Unix-timestamp overflow at expiry
pub fn validate_ttl_days(ttl_days: Option<u32>) -> Result<()> {
    let Some(days) = ttl_days else {
        return Ok(());
    };
    if days == 0 {
        return Err(invalid("TTL days must be positive"));
    }
    if days > MAX_TTL_DAYS {
        return Err(invalid(format!("TTL days cannot exceed {MAX_TTL_DAYS}")));
    }
    let expiry = chrono::Utc::now().timestamp() + i64::from(days) * 24 * 60 * 60;
    if expiry > i64::from(i32::MAX) {
        return Err(invalid(
            "TTL would overflow Unix timestamp (max date: 2038-01-19)",
        ));
    }
    Ok(())
}

/// Validate embedding vectors returned by a provider before storing them
pub fn validate_embeddings(embeddings: &[Vec<f32>]) -> Result<()> {
    if embeddings.len() > MAX_EMBEDDINGS_PER_ITEM {
        return Err(invalid(format!(
            "Number of embeddings ({}) exceeds maximum of {MAX_EMBEDDINGS_PER_ITEM}",
            embeddings.len()
        )));
    }
    for embedding in embeddings {
        if embedding.is_empty() {
            return Err(invalid("Embedding cannot be empty"));
        }
        if embedding.len() > MAX_EMBEDDING_DIMENSIONS {
            return Err(invalid(format!(
                "Embedding dimensions ({}) exceed maximum of {MAX_EMBEDDING_DIMENSIONS}",
                embedding.len()
            )));
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(invalid("Embedding values must be finite numbers"));
        }
    }
    Ok(())
}

/// Validate index path expressions before they touch a value.
///
/// Paths are a restricted dotted subset (optionally `$.`-prefixed); fragments
/// resembling object-prototype access are rejected as an injection defense.
pub fn validate_index_paths(paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }
    if paths.len() > MAX_INDEX_PATHS {
        return Err(invalid(format!(
            "Too many index path expressions (maximum {MAX_INDEX_PATHS})"
        )));
    }
    for path in paths {
        if path.is_empty() {
            return Err(invalid("Index path expression cannot be empty"));
        }
        if path.len() > MAX_INDEX_PATH_LENGTH {
            return Err(invalid(format!(
                "Index path expression exceeds maximum length of {MAX_INDEX_PATH_LENGTH} characters"
            )));
        }
        if path.contains("__proto__")
            || path.contains("constructor")
            || path.contains("prototype")
        {
            return Err(invalid("Index path expression contains disallowed patterns"));
        }
        let body = path.strip_prefix("$.").unwrap_or(path);
        if body.is_empty()
            || body.starts_with('.')
            || body.ends_with('.')
            || body.contains("..")
        {
            return Err(invalid(format!("Malformed index path expression '{path}'")));
        }
        for ch in body.chars() {
            if !ch.is_alphanumeric() && ch != '_' && ch != '.' && ch != '-' {
                return Err(invalid(format!(
                    "Invalid character '{ch}' in index path expression '{path}'"
                )));
            }
        }
    }
    Ok(())
}
