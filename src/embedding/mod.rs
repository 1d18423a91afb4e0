//! Embedding providers for semantic search
//!
//! The engine only needs the `Embedder` capability: one vector for a query,
//! one vector per document at write time. An OpenAI-compatible client is
//! provided behind the `openai` feature; any provider (Bedrock, local
//! models, ...) can be plugged in by implementing the trait.

use async_trait::async_trait;

use crate::error::Result;

/// Capability to turn text into embedding vectors. Both calls may fail;
/// the search path treats failures as non-fatal (fail-open), the write
/// path propagates them.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed document fragments, one vector per input
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Cosine similarity between two vectors.
///
/// Returns exactly 0 for mismatched lengths, empty inputs, or zero-magnitude
/// vectors; never divides by zero and never panics.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// OpenAI-compatible embedding client
///
/// Requires the `openai` feature. Works with OpenAI, OpenRouter, Azure
/// OpenAI, and other OpenAI-compatible APIs.
#[cfg(feature = "openai")]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[cfg(feature = "openai")]
impl OpenAiEmbedder {
    /// Embedder with default settings (api.openai.com, text-embedding-3-small)
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }

    /// Embedder with custom endpoint, model, and expected dimensions
    pub fn with_config(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        dimensions: Option<usize>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "text-embedding-3-small".to_string()),
            dimensions: dimensions.unwrap_or(1536),
        }
    }

    async fn request_embeddings(&self, input: serde_json::Value) -> Result<Vec<Vec<f32>>> {
        use crate::error::TrellisError;

        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "input": input,
                "model": self.model,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TrellisError::Embedding(format!(
                "Embedding API error {status}: {body}"
            )));
        }

        let data: serde_json::Value = response.json().await?;
        let embeddings: Vec<Vec<f32>> = data["data"]
            .as_array()
            .ok_or_else(|| TrellisError::Embedding("Invalid response format".to_string()))?
            .iter()
            .map(|item| {
                item["embedding"]
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.as_f64().map(|f| f as f32))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect();

        if let Some(first) = embeddings.first() {
            if first.len() != self.dimensions {
                return Err(TrellisError::Embedding(format!(
                    "Embedding dimensions mismatch: expected {}, got {}",
                    self.dimensions,
                    first.len()
                )));
            }
        }

        Ok(embeddings)
    }
}

#[cfg(feature = "openai")]
#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        use crate::error::TrellisError;

        let mut embeddings = self.request_embeddings(serde_json::json!(text)).await?;
        embeddings
            .pop()
            .ok_or_else(|| TrellisError::Embedding("Empty embedding response".to_string()))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // OpenAI allows up to 2048 inputs per call
        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(2048) {
            let embeddings = self.request_embeddings(serde_json::json!(chunk)).await?;
            all.extend(embeddings);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_degenerate_inputs_are_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
