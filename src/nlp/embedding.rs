use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{resolve_api_key, EmbeddingsConfig};
use crate::error::{DigestError, Result};
use crate::nlp::tfidf::TfIdfEmbedder;

/// Maps a batch of texts to fixed-length vectors, one per text.
///
/// Any implementation that keeps related texts close under cosine similarity
/// is acceptable to the topic detector.
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Build the embedder named in config.
pub fn build_embedder(config: &EmbeddingsConfig) -> anyhow::Result<Box<dyn Embedder>> {
    match config.backend.as_str() {
        "tfidf" => Ok(Box::new(TfIdfEmbedder)),
        "openai" => Ok(Box::new(OpenAiEmbedder::from_config(config)?)),
        other => anyhow::bail!("Unknown embeddings backend: {}", other),
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Dense embeddings from an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    endpoint: String,
    api_key: String,
    model: String,
    client: OnceLock<reqwest::blocking::Client>,
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiEmbedder {
    pub fn from_config(config: &EmbeddingsConfig) -> anyhow::Result<Self> {
        if config.endpoint.is_empty() {
            anyhow::bail!(
                "Embeddings endpoint not configured. \
                 Set [embeddings] endpoint in ytdigest.toml"
            );
        }
        let api_key = resolve_api_key(&config.api_key, "YTDIGEST_EMBEDDINGS_KEY").ok_or_else(
            || {
                anyhow::anyhow!(
                    "Embeddings API key not configured. \
                     Set [embeddings] api_key or YTDIGEST_EMBEDDINGS_KEY"
                )
            },
        )?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            client: OnceLock::new(),
        })
    }

    /// The HTTP client is built on first use and shared afterwards.
    fn client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let built = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(self.client.get_or_init(|| built))
    }
}

impl Embedder for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai"
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.endpoint);
        tracing::info!("Embedding {} sentences with {}", texts.len(), self.model);

        let response = self
            .client()?
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(DigestError::Embedding(format!(
                "endpoint returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: EmbeddingResponse = response.json()?;
        vectors_in_order(parsed, texts.len())
    }
}

fn vectors_in_order(mut response: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    if response.data.len() != expected {
        return Err(DigestError::Embedding(format!(
            "expected {} vectors, got {}",
            expected,
            response.data.len()
        )));
    }
    response.data.sort_by_key(|d| d.index);
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_embedder_by_name() {
        let config = EmbeddingsConfig::default();
        assert_eq!(build_embedder(&config).unwrap().name(), "tfidf");

        let config = EmbeddingsConfig {
            backend: "word2vec".to_string(),
            ..Default::default()
        };
        assert!(build_embedder(&config).is_err());
    }

    #[test]
    fn test_openai_requires_endpoint() {
        let config = EmbeddingsConfig {
            backend: "openai".to_string(),
            api_key: "k".to_string(),
            ..Default::default()
        };
        let err = OpenAiEmbedder::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn test_openai_debug_redacts_key() {
        let config = EmbeddingsConfig {
            backend: "openai".to_string(),
            endpoint: "https://api.example.com/v1/".to_string(),
            api_key: "very-secret".to_string(),
            ..Default::default()
        };
        let embedder = OpenAiEmbedder::from_config(&config).unwrap();
        assert_eq!(embedder.endpoint, "https://api.example.com/v1");
        assert!(!format!("{:?}", embedder).contains("very-secret"));
    }

    #[test]
    fn test_vectors_reordered_by_index() {
        let response: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#,
        )
        .unwrap();
        let vectors = vectors_in_order(response, 2).unwrap();
        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0]);
    }

    #[test]
    fn test_vector_count_mismatch_is_error() {
        let response: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#).unwrap();
        assert!(matches!(
            vectors_in_order(response, 3),
            Err(DigestError::Embedding(_))
        ));
    }
}
