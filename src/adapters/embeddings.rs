use crate::adapters::http::{api_key_from_env, build_client, endpoint, post_json};
use crate::domain::model::LlmSettings;
use crate::domain::ports::Embedder;
use crate::utils::error::{MatchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const COLLABORATOR: &str = "embedding service";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Client for `POST {base}/embeddings`. One request per `embed` call.
#[derive(Clone)]
pub struct OpenAiEmbeddingClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddingClient {
    pub fn new(settings: &LlmSettings, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout_seconds)?,
            url: endpoint(&settings.base_url, "embeddings"),
            api_key,
            model: settings.embedding_model.clone(),
        })
    }

    pub fn from_env(settings: &LlmSettings) -> Result<Self> {
        Self::new(settings, api_key_from_env()?)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let mut response: EmbeddingResponse =
            post_json(&self.client, &self.url, &self.api_key, &request, COLLABORATOR).await?;

        if response.data.len() != texts.len() {
            return Err(MatchError::CollaboratorError {
                collaborator: COLLABORATOR.to_string(),
                status: 200,
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    response.data.len()
                ),
            });
        }

        // the API may return items out of order; `index` is authoritative
        response.data.sort_by_key(|item| item.index);
        tracing::debug!("Embedded {} texts with {}", texts.len(), self.model);
        Ok(response.data.into_iter().map(|item| item.embedding).collect())
    }
}
