//! Bounded pagination over backend scans
//!
//! Drives repeated backend pages into an accumulator under two hard safety
//! bounds: an iteration cap and an in-memory candidate cap. Hitting a cap is
//! a fatal `ResourceLimit` error, not silent truncation; it signals that the
//! optimizer's backend-side narrowing is not shrinking the scan as expected.
//!
//! Every backend call goes through the retry policy. Cancellation is
//! cooperative: the loop only awaits between pages, so dropping the query
//! future stops backend traffic at a page boundary.

use std::collections::BTreeSet;

use crate::backend::{KeyValueBackend, QueryRequest, StoredRecord};
use crate::error::{Result, TrellisError};
use crate::retry::RetryPolicy;
use crate::types::ScanLimits;

pub struct BoundedPaginator<'a> {
    backend: &'a dyn KeyValueBackend,
    retry: &'a RetryPolicy,
    limits: ScanLimits,
}

impl<'a> BoundedPaginator<'a> {
    pub fn new(backend: &'a dyn KeyValueBackend, retry: &'a RetryPolicy, limits: ScanLimits) -> Self {
        Self {
            backend,
            retry,
            limits,
        }
    }

    /// Target candidate-set size for namespace listing: over-fetch by the
    /// candidate multiplier to compensate for post-filter attrition, capped
    /// at the memory bound.
    pub fn namespace_target_size(&self, limit: usize, offset: usize) -> usize {
        ((limit + offset) * self.limits.candidate_multiplier)
            .min(self.limits.max_items_in_memory)
    }

    /// Collect distinct namespace strings until the target size is reached,
    /// the scan is exhausted, or a safety bound trips.
    pub async fn collect_namespaces(
        &self,
        mut request: QueryRequest,
        target_size: usize,
    ) -> Result<BTreeSet<String>> {
        let mut namespaces = BTreeSet::new();
        let mut iterations = 0usize;

        loop {
            iterations += 1;
            if iterations > self.limits.max_iterations {
                return Err(TrellisError::ResourceLimit(
                    "list namespaces operation exceeded maximum iteration limit".into(),
                ));
            }

            let page = self.retry.run(|| self.backend.query(&request)).await?;

            for record in &page.items {
                // The target size is already capped at the memory bound, so
                // the set stops growing there instead of failing the scan.
                if namespaces.len() >= self.limits.max_items_in_memory {
                    break;
                }
                if !record.namespace.is_empty() {
                    namespaces.insert(record.namespace.clone());
                }
            }

            match page.next {
                Some(token) if namespaces.len() < target_size => {
                    request.start_after = Some(token);
                }
                _ => break,
            }
        }

        tracing::debug!(
            candidates = namespaces.len(),
            iterations,
            "namespace scan complete"
        );
        Ok(namespaces)
    }

    /// Collect item candidates until `want` items pass the `keep` predicate,
    /// the scan is exhausted, or a safety bound trips. Backend narrowing is
    /// advisory, so pages can arrive full of records the predicate rejects;
    /// attrition re-enters the loop instead of shrinking the result.
    pub async fn collect_items<F>(
        &self,
        mut request: QueryRequest,
        want: usize,
        keep: F,
    ) -> Result<Vec<StoredRecord>>
    where
        F: Fn(&StoredRecord) -> bool,
    {
        let mut items: Vec<StoredRecord> = Vec::new();
        let mut scanned = 0usize;
        let mut iterations = 0usize;

        loop {
            iterations += 1;
            if iterations > self.limits.max_iterations {
                return Err(TrellisError::ResourceLimit(
                    "search operation exceeded maximum iteration limit".into(),
                ));
            }

            request.limit = Some(want.saturating_sub(items.len()).max(1));
            let page = self.retry.run(|| self.backend.query(&request)).await?;
            scanned += page.scanned;

            let verified: Vec<StoredRecord> =
                page.items.into_iter().filter(|record| keep(record)).collect();
            if !verified.is_empty() {
                if items.len() + verified.len() > self.limits.max_items_in_memory {
                    return Err(TrellisError::ResourceLimit(
                        "search operation exceeded maximum items in memory limit".into(),
                    ));
                }
                items.extend(verified);
            }

            let Some(token) = page.next else { break };
            if items.len() >= want {
                break;
            }
            request.start_after = Some(token);
        }

        tracing::debug!(candidates = items.len(), scanned, iterations, "item scan complete");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ContinuationToken, QueryPage};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;

    /// Backend that always reports another page, never making progress
    struct EndlessBackend;

    #[async_trait]
    impl KeyValueBackend for EndlessBackend {
        async fn get(&self, _: &str, _: &str) -> Result<Option<StoredRecord>> {
            Ok(None)
        }
        async fn upsert(&self, _: StoredRecord) -> Result<()> {
            Ok(())
        }
        async fn delete(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn query(&self, _: &QueryRequest) -> Result<QueryPage> {
            Ok(QueryPage {
                items: Vec::new(),
                scanned: 0,
                next: Some(ContinuationToken::new("again")),
            })
        }
    }

    /// Backend that returns one giant unfiltered page
    struct FloodBackend {
        page_len: usize,
    }

    #[async_trait]
    impl KeyValueBackend for FloodBackend {
        async fn get(&self, _: &str, _: &str) -> Result<Option<StoredRecord>> {
            Ok(None)
        }
        async fn upsert(&self, _: StoredRecord) -> Result<()> {
            Ok(())
        }
        async fn delete(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn query(&self, _: &QueryRequest) -> Result<QueryPage> {
            let items = (0..self.page_len)
                .map(|i| StoredRecord {
                    partition: "u".into(),
                    sort_key: format!("ns#{i}"),
                    namespace: "ns".into(),
                    key: i.to_string(),
                    value: json!({}),
                    embeddings: None,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                    expires_at: None,
                })
                .collect();
            Ok(QueryPage {
                items,
                scanned: self.page_len,
                next: None,
            })
        }
    }

    #[tokio::test]
    async fn test_iteration_cap_is_fatal() {
        let backend = EndlessBackend;
        let retry = RetryPolicy::default();
        let paginator = BoundedPaginator::new(&backend, &retry, ScanLimits::default());

        let err = paginator
            .collect_namespaces(QueryRequest::new("u"), 500)
            .await
            .unwrap_err();
        assert!(matches!(err, TrellisError::ResourceLimit(_)));
        assert!(err.to_string().contains("maximum iteration limit"));
    }

    #[tokio::test]
    async fn test_memory_cap_is_fatal_for_items() {
        let backend = FloodBackend { page_len: 10_001 };
        let retry = RetryPolicy::default();
        let paginator = BoundedPaginator::new(&backend, &retry, ScanLimits::default());

        let err = paginator
            .collect_items(QueryRequest::new("u"), 1000, |_| true)
            .await
            .unwrap_err();
        assert!(matches!(err, TrellisError::ResourceLimit(_)));
        assert!(err.to_string().contains("maximum items in memory limit"));
    }

    #[tokio::test]
    async fn test_rejected_candidates_do_not_consume_quota() {
        use crate::backend::MemoryBackend;
        use crate::types::split_namespace;

        // Sort keys for "docs!" order before "docs/guides" ('!' < '/'), so a
        // quota counted on raw candidates would fill up before the true match.
        let backend = MemoryBackend::new();
        for (namespace, key) in [("docs!", "x"), ("docs!", "y"), ("docs/guides", "a")] {
            backend
                .upsert(StoredRecord {
                    partition: "u".into(),
                    sort_key: StoredRecord::sort_key_for(namespace, key),
                    namespace: namespace.into(),
                    key: key.into(),
                    value: json!({}),
                    embeddings: None,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                    expires_at: None,
                })
                .await
                .unwrap();
        }

        let mut request = QueryRequest::new("u");
        request.sort_key_prefix = Some("docs".into());

        let retry = RetryPolicy::default();
        let paginator = BoundedPaginator::new(&backend, &retry, ScanLimits::default());
        let items = paginator
            .collect_items(request, 1, |record| {
                split_namespace(&record.namespace).starts_with(&["docs".to_string()])
            })
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].namespace, "docs/guides");
    }

    #[test]
    fn test_namespace_target_size_capped() {
        let backend = EndlessBackend;
        let retry = RetryPolicy::default();
        let paginator = BoundedPaginator::new(&backend, &retry, ScanLimits::default());
        assert_eq!(paginator.namespace_target_size(10, 0), 100);
        assert_eq!(paginator.namespace_target_size(1000, 10_000), 10_000);
    }
}
