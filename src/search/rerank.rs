//! Semantic reranking by embedding similarity
//!
//! Ranking is an enhancement, not a correctness requirement of retrieval:
//! if the embedding provider fails, the reranker fails open and returns the
//! original, unscored list. The discarded error branch is deliberate and
//! kept visible at the single call site below.

use std::cmp::Ordering;

use tracing::warn;

use crate::backend::StoredRecord;
use crate::embedding::{cosine_similarity, Embedder};

/// Score records against the query and sort descending by similarity.
///
/// Each record's score is the maximum cosine similarity across its stored
/// vectors; records without vectors score 0 and carry no signal, so they are
/// dropped from the scored result. On embedding failure the input order is
/// returned unchanged with no scores.
pub async fn rerank_by_similarity(
    records: Vec<StoredRecord>,
    query: &str,
    embedder: &dyn Embedder,
) -> Vec<(StoredRecord, Option<f32>)> {
    let query_vector = match embedder.embed_query(query).await {
        Ok(vector) => vector,
        Err(err) => {
            // Fail open: degraded-but-valid beats a failed search
            warn!("semantic rerank skipped, embedding provider failed: {err}");
            return records.into_iter().map(|record| (record, None)).collect();
        }
    };

    let mut scored: Vec<(StoredRecord, f32)> = records
        .into_iter()
        .map(|record| {
            let score = record
                .embeddings
                .as_deref()
                .map(|vectors| {
                    vectors
                        .iter()
                        .map(|v| cosine_similarity(&query_vector, v))
                        .fold(0.0_f32, f32::max)
                })
                .unwrap_or(0.0);
            (record, score)
        })
        .filter(|(_, score)| *score > 0.0)
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .map(|(record, score)| (record, Some(score)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TrellisError};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;

    struct FixedEmbedder {
        vector: Vec<f32>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed_query(&self, _: &str) -> Result<Vec<f32>> {
            Ok(self.vector.clone())
        }
        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.vector.clone()).collect())
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed_query(&self, _: &str) -> Result<Vec<f32>> {
            Err(TrellisError::Embedding("provider unreachable".into()))
        }
        async fn embed_documents(&self, _: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(TrellisError::Embedding("provider unreachable".into()))
        }
    }

    fn record(key: &str, embeddings: Option<Vec<Vec<f32>>>) -> StoredRecord {
        StoredRecord {
            partition: "u".into(),
            sort_key: format!("docs#{key}"),
            namespace: "docs".into(),
            key: key.into(),
            value: json!({}),
            embeddings,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_scores_sorted_descending_and_unscored_dropped() {
        let embedder = FixedEmbedder {
            vector: vec![1.0, 0.0, 0.0],
        };
        let records = vec![
            record("partial", Some(vec![vec![0.5, 0.5, 0.0]])),
            record("exact", Some(vec![vec![1.0, 0.0, 0.0]])),
            record("no_embedding", None),
        ];

        let ranked = rerank_by_similarity(records, "query", &embedder).await;
        let keys: Vec<_> = ranked.iter().map(|(r, _)| r.key.clone()).collect();
        assert_eq!(keys, ["exact", "partial"]);
        assert!((ranked[0].1.unwrap() - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_max_over_multiple_vectors() {
        let embedder = FixedEmbedder {
            vector: vec![0.0, 1.0],
        };
        let records = vec![record(
            "multi",
            Some(vec![vec![1.0, 0.0], vec![0.0, 1.0]]),
        )];

        let ranked = rerank_by_similarity(records, "query", &embedder).await;
        assert!((ranked[0].1.unwrap() - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_fails_open_on_provider_error() {
        let records = vec![record("a", None), record("b", Some(vec![vec![1.0]]))];
        let ranked = rerank_by_similarity(records, "query", &BrokenEmbedder).await;

        // Original order, no scores
        let keys: Vec<_> = ranked.iter().map(|(r, _)| r.key.clone()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert!(ranked.iter().all(|(_, score)| score.is_none()));
    }

    #[tokio::test]
    async fn test_empty_vector_list_scores_zero() {
        let embedder = FixedEmbedder {
            vector: vec![1.0, 0.0],
        };
        let records = vec![record("empty", Some(vec![]))];
        let ranked = rerank_by_similarity(records, "query", &embedder).await;
        assert!(ranked.is_empty());
    }
}
