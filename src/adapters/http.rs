use crate::utils::error::{MatchError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

pub fn build_client(timeout_seconds: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?)
}

/// Reads the provider key, loading `.env` first when present.
pub fn api_key_from_env() -> Result<String> {
    dotenvy::dotenv().ok();
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| MatchError::MissingConfigError {
            field: API_KEY_ENV.to_string(),
        })
}

pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// POSTs a JSON body with bearer auth and decodes the JSON reply.
/// Non-2xx statuses become `CollaboratorError` carrying the provider's message.
pub async fn post_json<B, R>(
    client: &Client,
    url: &str,
    api_key: &str,
    body: &B,
    collaborator: &str,
) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    tracing::debug!("POST {} ({})", url, collaborator);
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await?;

    let status = response.status();
    tracing::debug!("{} responded with {}", collaborator, status);

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(MatchError::CollaboratorError {
            collaborator: collaborator.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.json::<R>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("https://api.openai.com/v1/", "/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:9000", "embeddings"),
            "http://127.0.0.1:9000/embeddings"
        );
    }
}
