//! Technology overlap between a post's requirements and the reference set.

use crate::domain::model::{OverlapScore, ReferenceTechSet, ScoringMode};
use crate::domain::ports::Embedder;
use crate::utils::error::{MatchError, Result};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.75;

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Scores technology lists against one reference set. Safe to share between
/// runs: the only state is the reference-vector cache, written once.
pub struct OverlapScorer {
    reference: Arc<ReferenceTechSet>,
    embedder: Option<Arc<dyn Embedder>>,
    reference_vectors: OnceCell<Vec<Vec<f32>>>,
}

impl OverlapScorer {
    pub fn new(reference: Arc<ReferenceTechSet>) -> Self {
        Self {
            reference,
            embedder: None,
            reference_vectors: OnceCell::new(),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn reference(&self) -> &ReferenceTechSet {
        &self.reference
    }

    pub async fn score(
        &self,
        techs: &[String],
        mode: ScoringMode,
        context: Option<&str>,
    ) -> Result<OverlapScore> {
        match mode {
            ScoringMode::Exact => Ok(self.score_exact(techs)),
            ScoringMode::Similarity { threshold } => self.score_similar(techs, threshold).await,
            ScoringMode::Context => Ok(score_in_context(techs, context)),
        }
    }

    pub fn score_exact(&self, techs: &[String]) -> OverlapScore {
        let matched = techs
            .iter()
            .filter(|t| self.reference.contains(t))
            .cloned()
            .collect();
        OverlapScore::new(matched, techs.len())
    }

    pub async fn score_similar(&self, techs: &[String], threshold: f32) -> Result<OverlapScore> {
        if techs.is_empty() || self.reference.is_empty() {
            return Ok(OverlapScore::new(Vec::new(), techs.len()));
        }

        let reference_vectors = self.reference_vectors().await?;
        let tech_vectors = self.embedder()?.embed(techs).await?;
        if tech_vectors.len() != techs.len() {
            return Err(MatchError::CollaboratorError {
                collaborator: "embedding service".to_string(),
                status: 200,
                message: format!(
                    "expected {} vectors, got {}",
                    techs.len(),
                    tech_vectors.len()
                ),
            });
        }

        let mut matched = Vec::new();
        for (tech, vector) in techs.iter().zip(&tech_vectors) {
            let best = reference_vectors
                .iter()
                .map(|r| cosine_similarity(vector, r))
                .fold(f32::MIN, f32::max);
            tracing::debug!(tech = %tech, similarity = best, "best reference similarity");
            if best >= threshold {
                matched.push(tech.clone());
            }
        }

        Ok(OverlapScore::new(matched, techs.len()))
    }

    /// Embeds the reference set now instead of on the first similarity score.
    pub async fn warm_up(&self) -> Result<()> {
        if !self.reference.is_empty() {
            self.reference_vectors().await?;
        }
        Ok(())
    }

    fn embedder(&self) -> Result<&Arc<dyn Embedder>> {
        self.embedder
            .as_ref()
            .ok_or_else(|| MatchError::MissingConfigError {
                field: "embedding service (required for similarity scoring)".to_string(),
            })
    }

    async fn reference_vectors(&self) -> Result<&Vec<Vec<f32>>> {
        self.reference_vectors
            .get_or_try_init(|| async {
                let names = self.reference.names().to_vec();
                tracing::info!("🧮 Embedding {} reference technologies", names.len());
                let vectors = self.embedder()?.embed(&names).await?;
                if vectors.len() != names.len() {
                    return Err(MatchError::CollaboratorError {
                        collaborator: "embedding service".to_string(),
                        status: 200,
                        message: format!(
                            "expected {} reference vectors, got {}",
                            names.len(),
                            vectors.len()
                        ),
                    });
                }
                Ok(vectors)
            })
            .await
    }
}

/// Counts technologies that appear verbatim in the retrieved resume context.
pub fn score_in_context(techs: &[String], context: Option<&str>) -> OverlapScore {
    let context = context.unwrap_or_default();
    let matched = techs
        .iter()
        .filter(|t| !t.is_empty() && context.contains(t.as_str()))
        .cloned()
        .collect();
    OverlapScore::new(matched, techs.len())
}
