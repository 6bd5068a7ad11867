pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod scoring;
pub mod verdict;

pub use crate::domain::model::{MatchReport, MatchVerdict, NormalizedFields, OverlapScore};
pub use crate::domain::ports::{ConfigProvider, Embedder, LanguageModel, Notifier, Retriever};
pub use crate::utils::error::Result;
