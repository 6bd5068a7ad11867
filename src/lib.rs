pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use app::MatchPipeline;
pub use crate::core::{pipeline::PipelineRunner, scoring::OverlapScorer, verdict::VerdictAssembler};
pub use utils::error::{MatchError, Result};
