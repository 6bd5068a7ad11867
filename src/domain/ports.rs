use crate::domain::model::{
    JobPost, LlmSettings, MatchReport, RankedDocument, ScoringMode, TextSource, TitleBucket,
    VerdictStrategy,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Settings every configuration front end (flags, TOML) must provide.
pub trait ConfigProvider: Send + Sync {
    fn match_threshold(&self) -> u8;
    fn reference_techs(&self) -> Vec<String>;
    fn title_buckets(&self) -> Vec<TitleBucket>;
    fn scoring_mode(&self) -> ScoringMode;
    fn verdict_strategy(&self) -> VerdictStrategy;
    fn llm_settings(&self) -> LlmSettings;
    fn post_source(&self) -> TextSource;
    fn resume_source(&self) -> TextSource;
    fn retrieval_enabled(&self) -> bool;
    fn retrieval_top_k(&self) -> usize;
    fn monitoring_enabled(&self) -> bool;
}

/// Text-in, text-out language model. The reply is treated as candidate JSON;
/// no schema is enforced by the model itself.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Embedding service: one vector per input text, same order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Ranked lookup over the candidate's resume.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RankedDocument>>;
}

/// Supplies the job post for a run.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch(&self) -> Result<JobPost>;
}

/// Receives the finished report. Observational only.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, report: &MatchReport) -> Result<()>;
}
