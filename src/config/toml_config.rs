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
    Category, LlmSettings, ScoringKind, ScoringMode, TextSource, TitleBucket, VerdictStrategy,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MatchError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Replaces the built-in title buckets when non-empty. Order matters.
    pub buckets: Vec<BucketConfig>,
    pub matcher: MatcherConfig,
    pub reference: ReferenceConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub source: SourceConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub threshold: u8,
    pub scoring: ScoringKind,
    pub verdict: VerdictStrategy,
    pub similarity_threshold: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            scoring: ScoringKind::default(),
            verdict: VerdictStrategy::default(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub techs: Vec<String>,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            techs: default_reference_techs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub enabled: bool,
    pub top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_text: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            top_k: DEFAULT_TOP_K,
            resume_file: None,
            resume_text: None,
        }
    }
}

/// At most one of the three may be set; none means the built-in post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MatchError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MatchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are left
    /// as written so validation can point at them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MatchError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_provider(self)?;

        for bucket in &self.buckets {
            bucket
                .name
                .parse::<Category>()
                .map_err(|reason| MatchError::InvalidConfigValueError {
                    field: "buckets.name".to_string(),
                    value: bucket.name.clone(),
                    reason,
                })?;
            if bucket.keywords.is_empty() {
                return Err(MatchError::InvalidConfigValueError {
                    field: "buckets.keywords".to_string(),
                    value: bucket.name.clone(),
                    reason: "A bucket needs at least one keyword".to_string(),
                });
            }
            if bucket.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(MatchError::InvalidConfigValueError {
                    field: "buckets.keywords".to_string(),
                    value: bucket.name.clone(),
                    reason: "Keywords must not be blank".to_string(),
                });
            }
        }

        let post_sources = [
            self.source.post_text.is_some(),
            self.source.post_file.is_some(),
            self.source.post_url.is_some(),
        ];
        if post_sources.iter().filter(|set| **set).count() > 1 {
            return Err(MatchError::ConfigValidationError {
                field: "source".to_string(),
                message: "Set only one of post_text, post_file or post_url".to_string(),
            });
        }
        if let Some(url) = &self.source.post_url {
            validate_url("source.post_url", url)?;
        }
        if let Some(path) = &self.source.post_file {
            validate_non_empty_string("source.post_file", path)?;
        }

        if self.retrieval.resume_file.is_some() && self.retrieval.resume_text.is_some() {
            return Err(MatchError::ConfigValidationError {
                field: "retrieval".to_string(),
                message: "Set only one of resume_file or resume_text".to_string(),
            });
        }

        Ok(())
    }

    pub fn log_json(&self) -> bool {
        self.monitoring.log_format.as_deref() == Some("json")
    }
}

impl ConfigProvider for TomlConfig {
    fn match_threshold(&self) -> u8 {
        self.matcher.threshold
    }

    fn reference_techs(&self) -> Vec<String> {
        self.reference.techs.clone()
    }

    fn title_buckets(&self) -> Vec<TitleBucket> {
        if self.buckets.is_empty() {
            return default_title_buckets();
        }
        self.buckets
            .iter()
            .filter_map(|b| {
                b.name.parse::<Category>().ok().map(|name| TitleBucket {
                    name,
                    keywords: b.keywords.clone(),
                })
            })
            .collect()
    }

    fn scoring_mode(&self) -> ScoringMode {
        ScoringMode::from_kind(self.matcher.scoring, self.matcher.similarity_threshold)
    }

    fn verdict_strategy(&self) -> VerdictStrategy {
        self.matcher.verdict
    }

    fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            base_url: self.llm.base_url.clone(),
            chat_model: self.llm.chat_model.clone(),
            embedding_model: self.llm.embedding_model.clone(),
            temperature: self.llm.temperature,
            timeout_seconds: self.llm.timeout_seconds,
        }
    }

    fn post_source(&self) -> TextSource {
        let source = &self.source;
        if let Some(text) = &source.post_text {
            TextSource::Inline(text.clone())
        } else if let Some(path) = &source.post_file {
            TextSource::File(path.clone())
        } else if let Some(url) = &source.post_url {
            TextSource::Url(url.clone())
        } else {
            TextSource::Default
        }
    }

    fn resume_source(&self) -> TextSource {
        if let Some(text) = &self.retrieval.resume_text {
            TextSource::Inline(text.clone())
        } else if let Some(path) = &self.retrieval.resume_file {
            TextSource::File(path.clone())
        } else {
            TextSource::Default
        }
    }

    fn retrieval_enabled(&self) -> bool {
        self.retrieval.enabled || self.matcher.scoring == ScoringKind::Context
    }

    fn retrieval_top_k(&self) -> usize {
        self.retrieval.top_k
    }

    fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
