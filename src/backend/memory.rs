//! In-memory reference backend
//!
//! Faithful to the partitioned-table contract: items are kept per partition
//! in sort-key order, `query` honors begins_with ranges, advisory filter
//! clauses, page limits, and continuation tokens. Used by the test suite
//! and as embeddable storage for small deployments.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;

use crate::error::Result;

use super::{
    ContinuationToken, KeyValueBackend, Projection, QueryPage, QueryRequest, StoredRecord,
};

const DEFAULT_PAGE_SIZE: usize = 1000;

type Partition = BTreeMap<String, StoredRecord>;

/// Thread-safe in-memory implementation of [`KeyValueBackend`]
pub struct MemoryBackend {
    partitions: RwLock<BTreeMap<String, Partition>>,
    page_size: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(BTreeMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Backend with a small page size, to exercise pagination in tests
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            partitions: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    /// Total records across all partitions
    pub fn len(&self) -> usize {
        self.partitions.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(record: &StoredRecord) -> bool {
        record
            .expires_at
            .is_some_and(|expiry| expiry <= Utc::now().timestamp())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get(&self, partition: &str, sort_key: &str) -> Result<Option<StoredRecord>> {
        let partitions = self.partitions.read();
        Ok(partitions
            .get(partition)
            .and_then(|p| p.get(sort_key))
            .filter(|record| !Self::is_expired(record))
            .cloned())
    }

    async fn upsert(&self, mut record: StoredRecord) -> Result<()> {
        let mut partitions = self.partitions.write();
        let partition = partitions.entry(record.partition.clone()).or_default();
        if let Some(existing) = partition.get(&record.sort_key) {
            if !Self::is_expired(existing) {
                record.created_at = existing.created_at;
            }
        }
        partition.insert(record.sort_key.clone(), record);
        Ok(())
    }

    async fn delete(&self, partition: &str, sort_key: &str) -> Result<()> {
        let mut partitions = self.partitions.write();
        if let Some(p) = partitions.get_mut(partition) {
            p.remove(sort_key);
        }
        Ok(())
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        let partitions = self.partitions.read();
        let Some(partition) = partitions.get(&request.partition) else {
            return Ok(QueryPage::default());
        };

        let lower = match &request.start_after {
            Some(token) => Bound::Excluded(token.as_str().to_string()),
            None => Bound::Unbounded,
        };

        let page_limit = request.limit.unwrap_or(self.page_size).max(1);
        let mut items = Vec::new();
        let mut scanned = 0usize;
        let mut last_key: Option<String> = None;
        let mut more = false;

        for (sort_key, record) in partition.range((lower, Bound::Unbounded)) {
            if let Some(prefix) = &request.sort_key_prefix {
                if !sort_key.starts_with(prefix.as_str()) {
                    continue;
                }
            }
            if scanned >= page_limit {
                more = true;
                break;
            }
            scanned += 1;
            last_key = Some(sort_key.clone());
            if Self::is_expired(record) {
                continue;
            }
            if request.filter.iter().all(|clause| clause.matches(record)) {
                let mut item = record.clone();
                if request.projection == Projection::NamespaceOnly {
                    item.value = serde_json::Value::Null;
                    item.embeddings = None;
                }
                items.push(item);
            }
        }

        let next = if more {
            last_key.map(ContinuationToken::new)
        } else {
            None
        };

        Ok(QueryPage {
            items,
            scanned,
            next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CompareOp, FilterClause};
    use serde_json::json;

    fn record(namespace: &str, key: &str, value: serde_json::Value) -> StoredRecord {
        StoredRecord {
            partition: "u".into(),
            sort_key: StoredRecord::sort_key_for(namespace, key),
            namespace: namespace.into(),
            key: key.into(),
            value,
            embeddings: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_and_upsert_preserves_created_at() {
        let backend = MemoryBackend::new();
        let first = record("docs", "a", json!({"v": 1}));
        let created = first.created_at;
        backend.upsert(first).await.unwrap();

        let mut second = record("docs", "a", json!({"v": 2}));
        second.created_at = Utc::now();
        second.updated_at = second.created_at;
        backend.upsert(second).await.unwrap();

        let fetched = backend.get("u", "docs#a").await.unwrap().unwrap();
        assert_eq!(fetched.value, json!({"v": 2}));
        assert_eq!(fetched.created_at, created);
    }

    #[tokio::test]
    async fn test_query_pages_in_sort_order() {
        let backend = MemoryBackend::with_page_size(2);
        for key in ["c", "a", "b", "d"] {
            backend.upsert(record("docs", key, json!({}))).await.unwrap();
        }

        let mut request = QueryRequest::new("u");
        let page = backend.query(&request).await.unwrap();
        let keys: Vec<_> = page.items.iter().map(|r| r.key.clone()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert!(page.next.is_some());

        request.start_after = page.next;
        let page = backend.query(&request).await.unwrap();
        let keys: Vec<_> = page.items.iter().map(|r| r.key.clone()).collect();
        assert_eq!(keys, ["c", "d"]);
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn test_query_begins_with_and_filter() {
        let backend = MemoryBackend::new();
        backend
            .upsert(record("docs/guides", "a", json!({"n": 1})))
            .await
            .unwrap();
        backend
            .upsert(record("docs/guides", "b", json!({"n": 5})))
            .await
            .unwrap();
        backend
            .upsert(record("blog/posts", "c", json!({"n": 9})))
            .await
            .unwrap();

        let mut request = QueryRequest::new("u");
        request.sort_key_prefix = Some("docs/guides".into());
        request.filter = vec![FilterClause::ValueField {
            field: "n".into(),
            op: CompareOp::Gte,
            value: json!(5),
        }];
        let page = backend.query(&request).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].key, "b");
    }

    #[tokio::test]
    async fn test_expired_records_invisible() {
        let backend = MemoryBackend::new();
        let mut rec = record("docs", "old", json!({}));
        rec.expires_at = Some(Utc::now().timestamp() - 10);
        backend.upsert(rec).await.unwrap();

        assert!(backend.get("u", "docs#old").await.unwrap().is_none());
        let page = backend.query(&QueryRequest::new("u")).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_delete_absent_is_ok() {
        let backend = MemoryBackend::new();
        backend.delete("u", "docs#missing").await.unwrap();
    }
}
