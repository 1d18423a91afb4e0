//! Core types for Trellis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Hierarchical namespace path: ordered segments such as `["docs", "guides"]`.
/// Segments never contain the reserved key-encoding separators `#` and `/`.
pub type NamespacePath = Vec<String>;

/// Wildcard segment in a match pattern, matching exactly one arbitrary segment
pub const WILDCARD: &str = "*";

/// Maximum backend-scan iterations per query before aborting
pub const MAX_LOOP_ITERATIONS: usize = 100;

/// Maximum candidates held in memory during a single query
pub const MAX_TOTAL_ITEMS_IN_MEMORY: usize = 10_000;

/// Over-fetch factor for namespace listing, compensating for post-filter attrition
pub const CANDIDATE_MULTIPLIER: usize = 10;

/// Join namespace segments into the stored path form (`a/b/c`)
pub fn join_namespace(namespace: &[String]) -> String {
    namespace.join("/")
}

/// Split a stored path form back into segments; empty string yields no segments
pub fn split_namespace(path: &str) -> NamespacePath {
    if path.is_empty() {
        return Vec::new();
    }
    path.split('/').map(String::from).collect()
}

/// How a match pattern aligns against a namespace path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Pattern aligned to the start of the path
    Prefix,
    /// Pattern aligned to the end of the path
    Suffix,
}

/// A prefix or suffix pattern over namespace paths, possibly containing
/// wildcard segments. Conditions in a query combine with AND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCondition {
    pub match_type: MatchType,
    pub path: NamespacePath,
}

impl MatchCondition {
    pub fn prefix(path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            match_type: MatchType::Prefix,
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    pub fn suffix(path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            match_type: MatchType::Suffix,
            path: path.into_iter().map(Into::into).collect(),
        }
    }
}

/// A stored memory item. Identity is (owner, namespace, key); uniqueness is
/// enforced by the backend's composite key, not by this engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Namespace the item lives under (owner segment excluded)
    pub namespace: NamespacePath,
    /// Key within the namespace
    pub key: String,
    /// Arbitrary structured document (size-bounded)
    pub value: Value,
    /// When the item was first written
    pub created_at: DateTime<Utc>,
    /// When the item was last written
    pub updated_at: DateTime<Utc>,
}

/// A search hit: a memory item plus an optional similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    pub namespace: NamespacePath,
    pub key: String,
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Cosine similarity against the query embedding, when reranking ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Comparison operators for a single filter field.
/// `deny_unknown_fields` keeps plain object values from parsing as operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FilterOps {
    #[serde(rename = "$eq", skip_serializing_if = "Option::is_none")]
    pub eq: Option<Value>,
    #[serde(rename = "$ne", skip_serializing_if = "Option::is_none")]
    pub ne: Option<Value>,
    #[serde(rename = "$gt", skip_serializing_if = "Option::is_none")]
    pub gt: Option<Value>,
    #[serde(rename = "$gte", skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(rename = "$lt", skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
    #[serde(rename = "$lte", skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
}

/// A value filter: either a direct value (equality) or an operator set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Ops(FilterOps),
    Value(Value),
}

/// Structured value filter over item fields, all entries ANDed together
pub type ValueFilter = HashMap<String, FilterValue>;

fn default_limit() -> usize {
    100
}

/// Fetch a single item by namespace and key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetOperation {
    pub namespace: NamespacePath,
    pub key: String,
}

/// Write (or, with `value: None`, delete) a single item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutOperation {
    pub namespace: NamespacePath,
    pub key: String,
    /// `None` deletes the item
    pub value: Option<Value>,
    /// Dotted value paths whose text should be embedded for semantic search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<String>>,
}

/// Search for items under a namespace prefix, with optional value filtering
/// and optional semantic reranking by query text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOperation {
    /// Empty prefix searches all namespaces of the owner
    #[serde(default)]
    pub namespace_prefix: NamespacePath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ValueFilter>,
    /// Query text for semantic reranking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Default for SearchOperation {
    fn default() -> Self {
        Self {
            namespace_prefix: Vec::new(),
            filter: None,
            query: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// List distinct namespaces matching a set of conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListNamespacesOperation {
    #[serde(default)]
    pub match_conditions: Vec<MatchCondition>,
    /// Maximum path depth, owner segment included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Default for ListNamespacesOperation {
    fn default() -> Self {
        Self {
            match_conditions: Vec::new(),
            max_depth: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// A store operation. Explicit tagged variants decided at the API boundary,
/// so an unrecognized operation is unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Get(GetOperation),
    Put(PutOperation),
    Search(SearchOperation),
    ListNamespaces(ListNamespacesOperation),
}

/// Result of a single operation in a batch, variant-matched to `Operation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationResult {
    Item { item: Option<MemoryItem> },
    Done,
    Search { items: Vec<SearchItem> },
    Namespaces { namespaces: Vec<NamespacePath> },
}

/// Safety bounds injected into the bounded paginator
#[derive(Debug, Clone, Copy)]
pub struct ScanLimits {
    /// Fatal iteration cap per query
    pub max_iterations: usize,
    /// Fatal in-memory candidate cap per query
    pub max_items_in_memory: usize,
    /// Over-fetch factor for namespace listing
    pub candidate_multiplier: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_iterations: MAX_LOOP_ITERATIONS,
            max_items_in_memory: MAX_TOTAL_ITEMS_IN_MEMORY,
            candidate_multiplier: CANDIDATE_MULTIPLIER,
        }
    }
}
