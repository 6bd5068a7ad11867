use crate::domain::model::{JobPost, PostOrigin, TextSource};
use crate::domain::ports::PostSource;
use crate::utils::error::{MatchError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Resolves a `TextSource` to its text. `default_text` is used for
/// `TextSource::Default`.
pub async fn load_text(
    source: &TextSource,
    client: &Client,
    default_text: &str,
) -> Result<(String, PostOrigin)> {
    match source {
        TextSource::Inline(text) => Ok((text.clone(), PostOrigin::Inline)),
        TextSource::File(path) => {
            let text = tokio::fs::read_to_string(path).await?;
            Ok((text, PostOrigin::File(path.clone())))
        }
        TextSource::Url(url) => {
            tracing::debug!("Fetching text from {}", url);
            let response = client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(MatchError::CollaboratorError {
                    collaborator: format!("source {}", url),
                    status: status.as_u16(),
                    message: response.text().await.unwrap_or_default(),
                });
            }
            Ok((response.text().await?, PostOrigin::Url(url.clone())))
        }
        TextSource::Default => Ok((default_text.to_string(), PostOrigin::Default)),
    }
}

/// Job-post source driven by configuration.
pub struct ConfiguredPostSource {
    source: TextSource,
    client: Client,
    default_text: String,
}

impl ConfiguredPostSource {
    pub fn new(source: TextSource, client: Client, default_text: impl Into<String>) -> Self {
        Self {
            source,
            client,
            default_text: default_text.into(),
        }
    }

    pub fn source(&self) -> &TextSource {
        &self.source
    }
}

#[async_trait]
impl PostSource for ConfiguredPostSource {
    async fn fetch(&self) -> Result<JobPost> {
        let (text, origin) = load_text(&self.source, &self.client, &self.default_text).await?;
        Ok(JobPost::new(text, origin))
    }
}
