//! Semantic ranking of search results

mod rerank;

pub use rerank::rerank_by_similarity;
