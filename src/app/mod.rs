pub mod pipelines;

pub use pipelines::match_pipeline::MatchPipeline;
