//! Wildcard-aware namespace matching
//!
//! Pure functions over namespace paths and match conditions; no knowledge of
//! backend storage. The backend-side narrowing in `optimizer` is advisory
//! only, these checks are the correctness boundary.

use crate::types::{MatchCondition, MatchType, WILDCARD};

/// Check a path against a single condition
pub fn matches_condition(path: &[String], condition: &MatchCondition) -> bool {
    match condition.match_type {
        MatchType::Prefix => matches_prefix(path, &condition.path),
        MatchType::Suffix => matches_suffix(path, &condition.path),
    }
}

/// Check a path against every condition (AND semantics)
pub fn matches_all(path: &[String], conditions: &[MatchCondition]) -> bool {
    conditions.iter().all(|c| matches_condition(path, c))
}

/// Pattern aligned to the start; `*` matches exactly one segment
pub fn matches_prefix(path: &[String], pattern: &[String]) -> bool {
    if pattern.len() > path.len() {
        return false;
    }
    pattern
        .iter()
        .zip(path.iter())
        .all(|(p, segment)| p == WILDCARD || p == segment)
}

/// Pattern aligned to the end; `*` matches exactly one segment
pub fn matches_suffix(path: &[String], pattern: &[String]) -> bool {
    if pattern.len() > path.len() {
        return false;
    }
    let offset = path.len() - pattern.len();
    pattern
        .iter()
        .zip(path[offset..].iter())
        .all(|(p, segment)| p == WILDCARD || p == segment)
}

/// Depth rule, evaluated separately from match conditions. Depth counts every
/// segment of the path, owner included.
pub fn within_depth(path: &[String], max_depth: Option<usize>) -> bool {
    max_depth.is_none_or(|depth| path.len() <= depth)
}
