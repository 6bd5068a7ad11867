#[cfg(feature = "cli")]
pub mod cli;
pub mod defaults;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::domain::model::ScoringMode;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url,
};

/// Checks shared by every configuration front end.
pub fn validate_provider(config: &dyn ConfigProvider) -> Result<()> {
    validate_range("threshold", config.match_threshold(), 0, 100)?;

    if let ScoringMode::Similarity { threshold } = config.scoring_mode() {
        validate_range("similarity_threshold", threshold, 0.0, 1.0)?;
    }

    let llm = config.llm_settings();
    validate_url("llm.base_url", &llm.base_url)?;
    validate_non_empty_string("llm.chat_model", &llm.chat_model)?;
    validate_non_empty_string("llm.embedding_model", &llm.embedding_model)?;
    validate_positive_number("llm.timeout_seconds", llm.timeout_seconds as usize, 1)?;
    if let Some(temperature) = llm.temperature {
        validate_range("llm.temperature", temperature, 0.0, 2.0)?;
    }

    validate_positive_number("retrieval.top_k", config.retrieval_top_k(), 1)?;
    Ok(())
}
