use crate::config::defaults::{
    default_reference_techs, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_TIMEOUT_SECONDS,
};
use crate::config::validate_provider;
use crate::core::normalize::default_title_buckets;
use crate::core::pipeline::DEFAULT_TOP_K;
use crate::core::scoring::DEFAULT_SIMILARITY_THRESHOLD;
use crate::core::verdict::DEFAULT_MATCH_THRESHOLD;
use crate::domain::model::{
    LlmSettings, ScoringKind, ScoringMode, TextSource, TitleBucket, VerdictStrategy,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_url, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "job-matcher")]
#[command(about = "Score a job post against a known skill set and render a match verdict")]
pub struct CliConfig {
    /// Minimum overlap percentage counted as a match
    #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
    pub threshold: u8,

    #[arg(long, value_enum, default_value_t = ScoringKind::Exact)]
    pub scoring: ScoringKind,

    #[arg(long, value_enum, default_value_t = VerdictStrategy::Deterministic)]
    pub verdict: VerdictStrategy,

    /// Cosine similarity needed for a match in similarity scoring
    #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
    pub similarity_threshold: f32,

    /// Comma-separated canonical technology names (defaults to the built-in set)
    #[arg(long, value_delimiter = ',')]
    pub reference_techs: Vec<String>,

    #[arg(long, conflicts_with_all = ["post_url", "post_text"])]
    pub post_file: Option<String>,

    #[arg(long, conflicts_with = "post_text")]
    pub post_url: Option<String>,

    #[arg(long)]
    pub post_text: Option<String>,

    #[arg(long)]
    pub resume_file: Option<String>,

    /// Retrieve resume excerpts for scoring context and verdict prompts
    #[arg(long)]
    pub retrieval: bool,

    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub llm_base_url: String,

    #[arg(long, default_value = DEFAULT_CHAT_MODEL)]
    pub llm_model: String,

    #[arg(long, default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log per-stage timing and process stats")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn match_threshold(&self) -> u8 {
        self.threshold
    }

    fn reference_techs(&self) -> Vec<String> {
        if self.reference_techs.is_empty() {
            default_reference_techs()
        } else {
            self.reference_techs.clone()
        }
    }

    fn title_buckets(&self) -> Vec<TitleBucket> {
        default_title_buckets()
    }

    fn scoring_mode(&self) -> ScoringMode {
        ScoringMode::from_kind(self.scoring, self.similarity_threshold)
    }

    fn verdict_strategy(&self) -> VerdictStrategy {
        self.verdict
    }

    fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            base_url: self.llm_base_url.clone(),
            chat_model: self.llm_model.clone(),
            embedding_model: self.embedding_model.clone(),
            temperature: self.temperature,
            timeout_seconds: self.timeout_seconds,
        }
    }

    fn post_source(&self) -> TextSource {
        if let Some(text) = &self.post_text {
            TextSource::Inline(text.clone())
        } else if let Some(path) = &self.post_file {
            TextSource::File(path.clone())
        } else if let Some(url) = &self.post_url {
            TextSource::Url(url.clone())
        } else {
            TextSource::Default
        }
    }

    fn resume_source(&self) -> TextSource {
        match &self.resume_file {
            Some(path) => TextSource::File(path.clone()),
            None => TextSource::Default,
        }
    }

    fn retrieval_enabled(&self) -> bool {
        self.retrieval || self.scoring == ScoringKind::Context
    }

    fn retrieval_top_k(&self) -> usize {
        self.top_k
    }

    fn monitoring_enabled(&self) -> bool {
        self.monitor
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)?;
        if let Some(url) = &self.post_url {
            validate_url("post_url", url)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["job-matcher"];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);

        assert_eq!(config.match_threshold(), 50);
        assert_eq!(config.scoring_mode(), ScoringMode::Exact);
        assert_eq!(config.verdict_strategy(), VerdictStrategy::Deterministic);
        assert_eq!(config.post_source(), TextSource::Default);
        assert_eq!(config.llm_settings().chat_model, "o4-mini");
        assert_eq!(config.retrieval_top_k(), 4);
        assert!(!config.retrieval_enabled());
        assert!(config.reference_techs().contains(&"React".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let config = parse(&[
            "--threshold",
            "49",
            "--scoring",
            "similarity",
            "--similarity-threshold",
            "0.8",
            "--verdict",
            "model",
            "--reference-techs",
            "React,Node.js",
            "--post-url",
            "https://jobs.example.com/1",
        ]);

        assert_eq!(config.match_threshold(), 49);
        assert_eq!(config.scoring_mode(), ScoringMode::Similarity { threshold: 0.8 });
        assert_eq!(config.verdict_strategy(), VerdictStrategy::Model);
        assert_eq!(config.reference_techs(), vec!["React", "Node.js"]);
        assert_eq!(
            config.post_source(),
            TextSource::Url("https://jobs.example.com/1".to_string())
        );
    }

    #[test]
    fn test_context_scoring_enables_retrieval() {
        let config = parse(&["--scoring", "context"]);
        assert!(config.retrieval_enabled());
    }

    #[test]
    fn test_post_sources_conflict() {
        let result =
            CliConfig::try_parse_from(["job-matcher", "--post-file", "a.txt", "--post-text", "hi"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse(&["--threshold", "101"]).validate().is_err());
        assert!(parse(&["--top-k", "0"]).validate().is_err());
        assert!(parse(&["--similarity-threshold", "1.5"]).validate().is_err());
        assert!(parse(&["--llm-base-url", "not a url"]).validate().is_err());
        assert!(parse(&["--post-url", "ftp://jobs.example.com"]).validate().is_err());
    }
}
