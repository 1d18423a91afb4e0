//! Store facade: hierarchical memory items over a partitioned backend
//!
//! Items are addressed as (owner, namespace, key). The owner id is the
//! partition key and is prepended to listed namespace paths; it is never
//! matched against wildcards. Operations arrive as an explicit tagged enum
//! and batches dispatch concurrently.

mod filter;
mod get;
mod list;
mod matcher;
mod optimizer;
mod paginate;
mod put;
mod search;
mod select;

pub use filter::build_filter_clauses;
pub use matcher::{matches_all, matches_condition, matches_prefix, matches_suffix, within_depth};
pub use optimizer::{
    concrete_prefix, concrete_suffix, plan_namespace_narrowing, prefix_range_fragment,
    suffix_contains_fragment,
};
pub use paginate::BoundedPaginator;
pub use select::verify_namespaces;

use std::sync::Arc;

use crate::backend::KeyValueBackend;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::types::{
    GetOperation, ListNamespacesOperation, MemoryItem, NamespacePath, Operation, OperationResult,
    PutOperation, ScanLimits, SearchItem, SearchOperation,
};
use crate::validation::{validate_batch_size, validate_owner_id};

/// Configuration for a [`Store`]
pub struct StoreOptions {
    /// Embedding provider for semantic search; absent disables scoring
    pub embedder: Option<Arc<dyn Embedder>>,
    /// Retry policy for backend calls
    pub retry: RetryPolicy,
    /// Safety bounds for backend scans
    pub limits: ScanLimits,
    /// TTL in days for stored items (1..=1825)
    pub ttl_days: Option<u32>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            embedder: None,
            retry: RetryPolicy::default(),
            limits: ScanLimits::default(),
            ttl_days: None,
        }
    }
}

/// Hierarchical key-value memory store with optional semantic search
pub struct Store {
    pub(crate) backend: Arc<dyn KeyValueBackend>,
    pub(crate) embedder: Option<Arc<dyn Embedder>>,
    pub(crate) retry: RetryPolicy,
    pub(crate) limits: ScanLimits,
    pub(crate) ttl_days: Option<u32>,
}

impl Store {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self::with_options(backend, StoreOptions::default())
    }

    pub fn with_options(backend: Arc<dyn KeyValueBackend>, options: StoreOptions) -> Self {
        Self {
            backend,
            embedder: options.embedder,
            retry: options.retry,
            limits: options.limits,
            ttl_days: options.ttl_days,
        }
    }

    /// Fetch a single item; `None` when absent
    pub async fn get(&self, owner: &str, op: &GetOperation) -> Result<Option<MemoryItem>> {
        get::get_operation(self, owner, op).await
    }

    /// Write an item, or delete it when the op carries no value
    pub async fn put(&self, owner: &str, op: &PutOperation) -> Result<()> {
        put::put_operation(self, owner, op).await
    }

    /// Search items under a namespace prefix, optionally filtered and
    /// semantically reranked
    pub async fn search(&self, owner: &str, op: &SearchOperation) -> Result<Vec<SearchItem>> {
        search::search_operation(self, owner, op).await
    }

    /// List distinct namespaces matching the conditions; every returned path
    /// includes the owner prefix
    pub async fn list_namespaces(
        &self,
        owner: &str,
        op: &ListNamespacesOperation,
    ) -> Result<Vec<NamespacePath>> {
        list::list_namespaces_operation(self, owner, op).await
    }

    /// Execute a batch of operations concurrently, results in input order.
    /// Owner and batch size are validated before any operation starts; the
    /// first failing operation fails the batch.
    pub async fn batch(
        &self,
        owner: &str,
        operations: &[Operation],
    ) -> Result<Vec<OperationResult>> {
        validate_owner_id(owner)?;
        validate_batch_size(operations.len())?;

        let futures = operations.iter().map(|op| self.dispatch(owner, op));
        futures::future::try_join_all(futures).await
    }

    async fn dispatch(&self, owner: &str, op: &Operation) -> Result<OperationResult> {
        match op {
            Operation::Get(op) => Ok(OperationResult::Item {
                item: self.get(owner, op).await?,
            }),
            Operation::Put(op) => {
                self.put(owner, op).await?;
                Ok(OperationResult::Done)
            }
            Operation::Search(op) => Ok(OperationResult::Search {
                items: self.search(owner, op).await?,
            }),
            Operation::ListNamespaces(op) => Ok(OperationResult::Namespaces {
                namespaces: self.list_namespaces(owner, op).await?,
            }),
        }
    }
}
