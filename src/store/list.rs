//! List-namespaces operation
//!
//! Scans distinct namespace strings under the owner partition, narrowed by
//! the optimizer's advisory begins_with/contains fragments, then re-verified
//! against the full condition set, sorted, and sliced.

use crate::backend::{Projection, QueryRequest};
use crate::error::Result;
use crate::store::optimizer::plan_namespace_narrowing;
use crate::store::paginate::BoundedPaginator;
use crate::store::select::verify_namespaces;
use crate::store::Store;
use crate::types::{ListNamespacesOperation, NamespacePath};
use crate::validation::{validate_max_depth, validate_owner_id, validate_pagination};

pub(crate) async fn list_namespaces_operation(
    store: &Store,
    owner: &str,
    op: &ListNamespacesOperation,
) -> Result<Vec<NamespacePath>> {
    validate_owner_id(owner)?;
    validate_pagination(op.limit, op.offset)?;
    validate_max_depth(op.max_depth)?;

    let (range, clauses) = plan_namespace_narrowing(&op.match_conditions);
    let mut request = QueryRequest::new(owner);
    request.projection = Projection::NamespaceOnly;
    request.sort_key_prefix = range;
    request.filter = clauses;

    let paginator = BoundedPaginator::new(store.backend.as_ref(), &store.retry, store.limits);
    let target_size = paginator.namespace_target_size(op.limit, op.offset);
    let candidates = paginator.collect_namespaces(request, target_size).await?;

    Ok(verify_namespaces(
        &candidates,
        owner,
        &op.match_conditions,
        op.max_depth,
        op.limit,
        op.offset,
    ))
}
