//! Search operation
//!
//! Two-layer query design: an advisory backend narrowing (begins_with range
//! plus compiled value-filter clauses) shrinks the fetched candidate set,
//! then exact namespace verification runs in memory. Semantic reranking, if
//! requested, is applied to the returned page.

use crate::backend::{Projection, QueryRequest, StoredRecord};
use crate::error::Result;
use crate::search::rerank_by_similarity;
use crate::store::filter::build_filter_clauses;
use crate::store::paginate::BoundedPaginator;
use crate::store::Store;
use crate::types::{join_namespace, split_namespace, SearchItem, SearchOperation};
use crate::validation::{validate_namespace, validate_owner_id, validate_pagination};

pub(crate) async fn search_operation(
    store: &Store,
    owner: &str,
    op: &SearchOperation,
) -> Result<Vec<SearchItem>> {
    validate_owner_id(owner)?;
    // An empty prefix searches all namespaces of the owner
    if !op.namespace_prefix.is_empty() {
        validate_namespace(&op.namespace_prefix)?;
    }
    validate_pagination(op.limit, op.offset)?;

    let mut request = QueryRequest::new(owner);
    request.projection = Projection::Full;
    if !op.namespace_prefix.is_empty() {
        request.sort_key_prefix = Some(join_namespace(&op.namespace_prefix));
    }
    if let Some(filter) = &op.filter {
        request.filter = build_filter_clauses(filter);
    }

    // The begins_with range is advisory (it also matches sibling namespaces
    // sharing the string prefix); candidates are re-verified segment-wise
    // inside the pagination loop, so rejected siblings never fill the quota.
    let paginator = BoundedPaginator::new(store.backend.as_ref(), &store.retry, store.limits);
    let verified = paginator
        .collect_items(request, op.limit + op.offset, |record| {
            split_namespace(&record.namespace).starts_with(op.namespace_prefix.as_slice())
        })
        .await?;

    let page: Vec<StoredRecord> = verified
        .into_iter()
        .skip(op.offset)
        .take(op.limit)
        .collect();

    let scored: Vec<(StoredRecord, Option<f32>)> = match (&op.query, &store.embedder) {
        (Some(query), Some(embedder)) => {
            rerank_by_similarity(page, query, embedder.as_ref()).await
        }
        _ => page.into_iter().map(|record| (record, None)).collect(),
    };

    Ok(scored
        .into_iter()
        .map(|(record, score)| SearchItem {
            namespace: split_namespace(&record.namespace),
            key: record.key,
            value: record.value,
            created_at: record.created_at,
            updated_at: record.updated_at,
            score,
        })
        .collect())
}
