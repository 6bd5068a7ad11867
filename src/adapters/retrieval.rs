//! In-memory vector index over resume chunks.

use crate::core::scoring::cosine_similarity;
use crate::domain::model::RankedDocument;
use crate::domain::ports::{Embedder, Retriever};
use crate::utils::error::{MatchError, Result};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Paragraphs separated by blank lines; a text without blank lines is split
/// per non-empty line instead.
pub fn split_chunks(text: &str) -> Vec<String> {
    let paragraphs: Vec<String> = text
        .replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    if paragraphs.len() > 1 {
        return paragraphs;
    }

    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

pub struct ResumeIndex {
    chunks: Vec<String>,
    vectors: Vec<Vec<f32>>,
    embedder: Arc<dyn Embedder>,
}

impl ResumeIndex {
    pub async fn build(resume: &str, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let chunks = split_chunks(resume);
        let vectors = embedder.embed(&chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(MatchError::CollaboratorError {
                collaborator: "embedding service".to_string(),
                status: 200,
                message: format!("expected {} vectors, got {}", chunks.len(), vectors.len()),
            });
        }
        tracing::info!("📚 Indexed {} resume chunks", chunks.len());
        Ok(Self {
            chunks,
            vectors,
            embedder,
        })
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl Retriever for ResumeIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RankedDocument>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MatchError::EmptyResponse {
                collaborator: "embedding service".to_string(),
            })?;

        let mut ranked: Vec<RankedDocument> = self
            .chunks
            .iter()
            .zip(&self.vectors)
            .enumerate()
            .map(|(chunk_index, (chunk, vector))| RankedDocument {
                content: chunk.clone(),
                score: cosine_similarity(&query_vector, vector),
                chunk_index,
            })
            .collect();
        // stable sort: equal scores keep resume order
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(k);
        Ok(ranked)
    }
}

/// Builds the resume index on first use and reuses it for every later search.
pub struct LazyResumeIndex {
    resume: String,
    embedder: Arc<dyn Embedder>,
    index: OnceCell<ResumeIndex>,
}

impl LazyResumeIndex {
    pub fn new(resume: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            resume: resume.into(),
            embedder,
            index: OnceCell::new(),
        }
    }

    pub async fn index(&self) -> Result<&ResumeIndex> {
        self.index
            .get_or_try_init(|| ResumeIndex::build(&self.resume, self.embedder.clone()))
            .await
    }
}

#[async_trait]
impl Retriever for LazyResumeIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RankedDocument>> {
        self.index().await?.search(query, k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    /// Bag-of-keywords embedding over a tiny fixed vocabulary.
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    const VOCAB: [&str; 4] = ["react", "node", "docker", "sql"];

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let lower = t.to_lowercase();
                    VOCAB
                        .iter()
                        .map(|w| lower.matches(w).count() as f32)
                        .collect()
                })
                .collect())
        }
    }

    fn embedder() -> Arc<KeywordEmbedder> {
        Arc::new(KeywordEmbedder {
            calls: AtomicUsize::new(0),
        })
    }

    const RESUME: &str = "Front end React, Next.js, Redux\n\nBackend Node.js, Express\n\nDocker, Rancher\n\nPostgreSQL, MySQL";

    #[test]
    fn test_split_chunks_by_paragraph() {
        assert_eq!(split_chunks(RESUME).len(), 4);
        assert_eq!(split_chunks("one\ntwo\n\n"), vec!["one", "two"]);
        assert!(split_chunks("  \n\n ").is_empty());
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let index = ResumeIndex::build(RESUME, embedder()).await.unwrap();
        assert_eq!(index.len(), 4);

        let results = index.search("We use Node and SQL", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        let contents: Vec<&str> = results.iter().map(|d| d.content.as_str()).collect();
        assert!(contents.contains(&"Backend Node.js, Express"));
        assert!(contents.contains(&"PostgreSQL, MySQL"));
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_zero_k_returns_nothing() {
        let index = ResumeIndex::build(RESUME, embedder()).await.unwrap();
        assert!(index.search("react", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lazy_index_builds_once() {
        let embedder = embedder();
        let lazy = LazyResumeIndex::new(RESUME, embedder.clone());

        lazy.search("react", 1).await.unwrap();
        lazy.search("docker", 1).await.unwrap();

        // one build pass plus one query embedding per search
        assert_eq!(embedder.calls.load(AtomicOrdering::SeqCst), 3);
        let top = lazy.search("docker", 1).await.unwrap();
        assert_eq!(top[0].content, "Docker, Rancher");
    }
}
