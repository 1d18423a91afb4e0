//! Backend query optimizer
//!
//! Derives concrete, wildcard-free fragments from match patterns and turns
//! them into backend-native narrowing: a `begins_with` sort-key range from a
//! prefix pattern, and `contains` filter clauses from suffix patterns. The
//! fragments shrink the candidate set fetched from the backend; they are
//! never relied on for correctness, `matcher` re-verifies every candidate.

use crate::backend::FilterClause;
use crate::types::{MatchCondition, MatchType, WILDCARD};

/// Leading wildcard-free run of a pattern, joined with `/`.
/// Empty when the first segment is already a wildcard.
pub fn concrete_prefix(pattern: &[String]) -> String {
    let concrete: Vec<&str> = pattern
        .iter()
        .take_while(|segment| segment.as_str() != WILDCARD)
        .map(String::as_str)
        .collect();
    concrete.join("/")
}

/// Trailing wildcard-free run of a pattern, joined in original order.
/// Empty when the last segment is already a wildcard.
pub fn concrete_suffix(pattern: &[String]) -> String {
    let from = pattern
        .iter()
        .rposition(|segment| segment == WILDCARD)
        .map_or(0, |i| i + 1);
    pattern[from..].join("/")
}

/// Sort-key range fragment for a prefix condition. Position 0 of a prefix
/// pattern aligns with the owner segment, which is not part of the stored
/// namespace, so the fragment is derived from the remainder.
pub fn prefix_range_fragment(pattern: &[String]) -> String {
    if pattern.len() <= 1 {
        return String::new();
    }
    concrete_prefix(&pattern[1..])
}

/// Contains fragment for a suffix condition. A trailing run spanning the
/// whole pattern reaches position 0, which may align with the owner segment;
/// that segment is dropped so the fragment stays conservative.
pub fn suffix_contains_fragment(pattern: &[String]) -> String {
    let from = pattern
        .iter()
        .rposition(|segment| segment == WILDCARD)
        .map_or(0, |i| i + 1);
    let run = &pattern[from..];
    if from == 0 && !run.is_empty() {
        run[1..].join("/")
    } else {
        run.join("/")
    }
}

/// Advisory narrowing for a namespace-listing scan: a `begins_with` fragment
/// from the first prefix condition, and a `contains` clause per suffix
/// condition that yields a non-empty fragment.
pub fn plan_namespace_narrowing(
    conditions: &[MatchCondition],
) -> (Option<String>, Vec<FilterClause>) {
    let range = conditions
        .iter()
        .find(|c| c.match_type == MatchType::Prefix)
        .map(|c| prefix_range_fragment(&c.path))
        .filter(|fragment| !fragment.is_empty());

    let clauses = conditions
        .iter()
        .filter(|c| c.match_type == MatchType::Suffix)
        .map(|c| suffix_contains_fragment(&c.path))
        .filter(|fragment| !fragment.is_empty())
        .map(FilterClause::NamespaceContains)
        .collect();

    (range, clauses)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_concrete_prefix_stops_at_wildcard() {
        assert_eq!(concrete_prefix(&pat(&["docs", "guides"])), "docs/guides");
        assert_eq!(concrete_prefix(&pat(&["docs", "*", "intro"])), "docs");
        assert_eq!(concrete_prefix(&pat(&["*", "guides"])), "");
        assert_eq!(concrete_prefix(&[]), "");
    }

    #[test]
    fn test_concrete_suffix_scans_from_tail() {
        assert_eq!(concrete_suffix(&pat(&["reports", "2024"])), "reports/2024");
        assert_eq!(concrete_suffix(&pat(&["*", "reports", "2024"])), "reports/2024");
        assert_eq!(concrete_suffix(&pat(&["reports", "*"])), "");
    }

    #[test]
    fn test_prefix_fragment_skips_owner_slot() {
        assert_eq!(prefix_range_fragment(&pat(&["u", "docs"])), "docs");
        assert_eq!(prefix_range_fragment(&pat(&["*", "docs"])), "docs");
        assert_eq!(prefix_range_fragment(&pat(&["u", "*", "guides"])), "");
        assert_eq!(prefix_range_fragment(&pat(&["u"])), "");
    }

    #[test]
    fn test_suffix_fragment_drops_owner_on_full_run() {
        // Run does not span the pattern: keep it whole
        assert_eq!(
            suffix_contains_fragment(&pat(&["*", "reports", "2024"])),
            "reports/2024"
        );
        // Fully concrete pattern: first segment may align with the owner
        assert_eq!(
            suffix_contains_fragment(&pat(&["u", "docs", "guides"])),
            "docs/guides"
        );
        assert_eq!(suffix_contains_fragment(&pat(&["guides"])), "");
    }

    #[test]
    fn test_plan_combines_first_prefix_and_all_suffixes() {
        use crate::types::MatchCondition;
        let conditions = vec![
            MatchCondition::prefix(["u", "docs"]),
            MatchCondition::suffix(["*", "2024"]),
            MatchCondition::suffix(["archive", "*"]),
        ];
        let (range, clauses) = plan_namespace_narrowing(&conditions);
        assert_eq!(range.as_deref(), Some("docs"));
        assert_eq!(clauses, vec![FilterClause::NamespaceContains("2024".into())]);
    }
}
