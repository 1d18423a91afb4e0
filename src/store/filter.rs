//! Value-filter compilation
//!
//! Translates a structured value filter (field → direct value or comparison
//! operators) into backend filter clauses over the nested document path
//! `value.<field>`. Equality and comparison on stored scalar fields need no
//! wildcard semantics, so unlike namespace narrowing this compilation is
//! exact and requires no in-memory re-verification.

use crate::backend::{CompareOp, FilterClause};
use crate::types::{FilterOps, FilterValue, ValueFilter};

/// Compile a value filter into backend clauses. All clauses AND together;
/// an empty filter compiles to no clauses (unfiltered).
pub fn build_filter_clauses(filter: &ValueFilter) -> Vec<FilterClause> {
    let mut fields: Vec<(&String, &FilterValue)> = filter.iter().collect();
    // Deterministic clause order regardless of map iteration
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let mut clauses = Vec::new();
    for (field, value) in fields {
        match value {
            FilterValue::Value(direct) => clauses.push(FilterClause::ValueField {
                field: field.clone(),
                op: CompareOp::Eq,
                value: direct.clone(),
            }),
            FilterValue::Ops(ops) => push_operator_clauses(&mut clauses, field, ops),
        }
    }
    clauses
}

fn push_operator_clauses(clauses: &mut Vec<FilterClause>, field: &str, ops: &FilterOps) {
    let pairs = [
        (CompareOp::Eq, &ops.eq),
        (CompareOp::Ne, &ops.ne),
        (CompareOp::Gt, &ops.gt),
        (CompareOp::Gte, &ops.gte),
        (CompareOp::Lt, &ops.lt),
        (CompareOp::Lte, &ops.lte),
    ];
    for (op, value) in pairs {
        if let Some(value) = value {
            clauses.push(FilterClause::ValueField {
                field: field.to_string(),
                op,
                value: value.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_direct_value_compiles_to_equality() {
        let mut filter: ValueFilter = HashMap::new();
        filter.insert("status".into(), FilterValue::Value(json!("open")));
        let clauses = build_filter_clauses(&filter);
        assert_eq!(
            clauses,
            vec![FilterClause::ValueField {
                field: "status".into(),
                op: CompareOp::Eq,
                value: json!("open"),
            }]
        );
    }

    #[test]
    fn test_multiple_operators_on_one_field() {
        let mut filter: ValueFilter = HashMap::new();
        filter.insert(
            "priority".into(),
            FilterValue::Ops(FilterOps {
                gte: Some(json!(3)),
                lt: Some(json!(8)),
                ..FilterOps::default()
            }),
        );
        let clauses = build_filter_clauses(&filter);
        assert_eq!(clauses.len(), 2);
        assert!(clauses.contains(&FilterClause::ValueField {
            field: "priority".into(),
            op: CompareOp::Gte,
            value: json!(3),
        }));
        assert!(clauses.contains(&FilterClause::ValueField {
            field: "priority".into(),
            op: CompareOp::Lt,
            value: json!(8),
        }));
    }

    #[test]
    fn test_empty_filter_compiles_to_nothing() {
        assert!(build_filter_clauses(&HashMap::new()).is_empty());
    }

    #[test]
    fn test_fields_sorted_for_determinism() {
        let mut filter: ValueFilter = HashMap::new();
        filter.insert("b".into(), FilterValue::Value(json!(1)));
        filter.insert("a".into(), FilterValue::Value(json!(2)));
        let clauses = build_filter_clauses(&filter);
        match (&clauses[0], &clauses[1]) {
            (
                FilterClause::ValueField { field: first, .. },
                FilterClause::ValueField { field: second, .. },
            ) => {
                assert_eq!(first, "a");
                assert_eq!(second, "b");
            }
            other => panic!("unexpected clauses: {other:?}"),
        }
    }
}
