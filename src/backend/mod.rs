//! Backend access port for partitioned key-value storage
//!
//! This module defines the `KeyValueBackend` trait the store engine drives.
//! The contract mirrors a partitioned cloud table: items live under a
//! partition key, sorted by an opaque sort key, and scans page through
//! results via continuation tokens. Backend-side filtering is advisory:
//! the engine re-verifies anything the backend cannot express exactly.

mod memory;

pub use memory::MemoryBackend;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::Result;

/// A raw record as stored in the backend table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Partition key: the owner (tenant/user) id
    pub partition: String,
    /// Sort key: `namespace#key`
    pub sort_key: String,
    /// Namespace path joined with `/`
    pub namespace: String,
    /// Item key
    pub key: String,
    /// Item document
    pub value: Value,
    /// Embedding vectors, one per indexed text fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<Vec<f32>>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Unix expiry timestamp when a TTL is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl StoredRecord {
    /// Compose the sort key for a namespace path string and item key
    pub fn sort_key_for(namespace: &str, key: &str) -> String {
        format!("{namespace}#{key}")
    }
}

/// Comparison operator in a backend filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Expression symbol, for backends that compile clauses to strings
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

/// One predicate of a backend filter expression; clauses AND together
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Comparison over the nested document path `value.<field>`
    ValueField {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// Namespace string contains a fragment (advisory suffix narrowing)
    NamespaceContains(String),
}

/// Ordering between two JSON scalars, `None` when incomparable
fn json_compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

impl FilterClause {
    /// Evaluate this clause against a record, the way a backend would
    pub fn matches(&self, record: &StoredRecord) -> bool {
        match self {
            FilterClause::ValueField { field, op, value } => {
                // Absent fields fail every comparator, "not equal" included;
                // a comparison needs an attribute to compare against
                let Some(actual) = record.value.get(field) else {
                    return false;
                };
                match op {
                    CompareOp::Eq => actual == value,
                    CompareOp::Ne => actual != value,
                    CompareOp::Gt => json_compare(actual, value) == Some(Ordering::Greater),
                    CompareOp::Gte => matches!(
                        json_compare(actual, value),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    CompareOp::Lt => json_compare(actual, value) == Some(Ordering::Less),
                    CompareOp::Lte => matches!(
                        json_compare(actual, value),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                }
            }
            FilterClause::NamespaceContains(fragment) => record.namespace.contains(fragment),
        }
    }
}

/// Which attributes a query should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Full records
    #[default]
    Full,
    /// Namespace attribute only (listing does not need values)
    NamespaceOnly,
}

/// Opaque cursor for resuming a paginated scan. The engine never interprets
/// the contents; only backends construct and consume them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single page request against a partition
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub partition: String,
    /// Advisory `begins_with` range on the sort key
    pub sort_key_prefix: Option<String>,
    /// Advisory filter clauses, ANDed
    pub filter: Vec<FilterClause>,
    pub projection: Projection,
    /// Per-page item cap; backends may return fewer
    pub limit: Option<usize>,
    /// Resume after this token from a previous page
    pub start_after: Option<ContinuationToken>,
}

impl QueryRequest {
    pub fn new(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort_key_prefix: None,
            filter: Vec::new(),
            projection: Projection::Full,
            limit: None,
            start_after: None,
        }
    }
}

/// One page of query results
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub items: Vec<StoredRecord>,
    /// Records examined by the backend before filtering
    pub scanned: usize,
    /// Present when more pages remain
    pub next: Option<ContinuationToken>,
}

/// Capability to page through items under a partition, with optional sort-key
/// range, filtering, and projection.
///
/// Implementations must preserve `created_at` of an existing record on
/// `upsert`, and must return items of a partition in sort-key order from
/// `query`. No consistency beyond a single call's isolation is assumed.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Fetch a single record by composite key
    async fn get(&self, partition: &str, sort_key: &str) -> Result<Option<StoredRecord>>;

    /// Insert or replace a record, preserving `created_at` when it exists
    async fn upsert(&self, record: StoredRecord) -> Result<()>;

    /// Remove a record; removing an absent record is not an error
    async fn delete(&self, partition: &str, sort_key: &str) -> Result<()>;

    /// Fetch one page of records under a partition
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage>;
}
