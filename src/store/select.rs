//! Exact-match verification, dedup, ordering, and slicing
//!
//! Backend-side narrowing cannot express wildcard-interior matches or
//! multi-condition ANDs precisely, so every candidate is re-verified here.
//! Output ordering is lexicographic by the joined path; that ordering is a
//! documented contract, since offset/limit over an unordered set would be
//! non-deterministic.

use std::collections::BTreeSet;

use crate::store::matcher::{matches_all, within_depth};
use crate::types::{join_namespace, split_namespace, MatchCondition, NamespacePath};

/// Verify deduplicated namespace candidates against the full condition set,
/// sort, and apply offset/limit. Candidates are raw namespace strings as
/// stored (owner excluded); the owner segment is prepended before matching.
pub fn verify_namespaces(
    candidates: &BTreeSet<String>,
    owner: &str,
    conditions: &[MatchCondition],
    max_depth: Option<usize>,
    limit: usize,
    offset: usize,
) -> Vec<NamespacePath> {
    let mut verified: Vec<NamespacePath> = candidates
        .iter()
        .map(|raw| {
            let mut path = Vec::with_capacity(1 + raw.matches('/').count() + 1);
            path.push(owner.to_string());
            path.extend(split_namespace(raw));
            path
        })
        .filter(|path| matches_all(path, conditions) && within_depth(path, max_depth))
        .collect();

    verified.sort_by_key(|path| join_namespace(path));

    verified
        .into_iter()
        .skip(offset)
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchCondition;

    fn candidates(raw: &[&str]) -> BTreeSet<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_verify_filters_and_sorts() {
        let set = candidates(&["docs/tutorials", "blog/posts", "docs/guides"]);
        let conditions = vec![MatchCondition::prefix(["u", "docs"])];
        let result = verify_namespaces(&set, "u", &conditions, None, 100, 0);
        assert_eq!(
            result,
            vec![
                vec!["u".to_string(), "docs".to_string(), "guides".to_string()],
                vec!["u".to_string(), "docs".to_string(), "tutorials".to_string()],
            ]
        );
    }

    #[test]
    fn test_max_depth_applies_after_conditions() {
        let set = candidates(&["docs", "docs/guides", "docs/guides/intro"]);
        let conditions = vec![MatchCondition::prefix(["u", "docs"])];
        // Depth includes the owner segment
        let result = verify_namespaces(&set, "u", &conditions, Some(3), 100, 0);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|p| p.len() <= 3));
    }

    #[test]
    fn test_offset_and_limit_slice_after_sorting() {
        let set = candidates(&["a", "b", "c", "d"]);
        let result = verify_namespaces(&set, "u", &[], None, 2, 1);
        assert_eq!(
            result,
            vec![
                vec!["u".to_string(), "b".to_string()],
                vec!["u".to_string(), "c".to_string()],
            ]
        );
    }

    #[test]
    fn test_verification_is_idempotent() {
        let set = candidates(&["docs/guides", "docs/tutorials", "blog/posts"]);
        let conditions = vec![MatchCondition::prefix(["u", "docs"])];
        let once = verify_namespaces(&set, "u", &conditions, None, 100, 0);

        // Re-running over the already-verified set yields the same result
        let survivors: BTreeSet<String> = once
            .iter()
            .map(|path| join_namespace(&path[1..]))
            .collect();
        let twice = verify_namespaces(&survivors, "u", &conditions, None, 100, 0);
        assert_eq!(once, twice);
    }
}
