use crate::adapters::embeddings::OpenAiEmbeddingClient;
use crate::adapters::http::{api_key_from_env, build_client};
use crate::adapters::llm::OpenAiChatClient;
use crate::adapters::notify::{OutputFormat, StdoutNotifier, TracingNotifier};
use crate::adapters::retrieval::LazyResumeIndex;
use crate::adapters::source::{load_text, ConfiguredPostSource};
use crate::config::defaults::{DEFAULT_POST, DEFAULT_RESUME};
use crate::core::normalize::FieldNormalizer;
use crate::core::pipeline::PipelineRunner;
use crate::core::scoring::OverlapScorer;
use crate::core::verdict::VerdictAssembler;
use crate::domain::model::{MatchReport, ReferenceTechSet, ScoringMode, VerdictStrategy};
use crate::domain::ports::{ConfigProvider, Embedder, LanguageModel};
use crate::utils::error::Result;
use std::sync::Arc;

/// A runner wired to the OpenAI-compatible collaborators plus the post source
/// the configuration names.
pub struct MatchPipeline {
    runner: PipelineRunner,
    source: ConfiguredPostSource,
}

impl MatchPipeline {
    /// Reads the API key from the environment (or `.env`).
    pub async fn from_config(
        config: &dyn ConfigProvider,
        output: Option<OutputFormat>,
    ) -> Result<Self> {
        Self::with_api_key(config, api_key_from_env()?, output).await
    }

    pub async fn with_api_key(
        config: &dyn ConfigProvider,
        api_key: String,
        output: Option<OutputFormat>,
    ) -> Result<Self> {
        let settings = config.llm_settings();
        let mode = config.scoring_mode();

        let model: Arc<dyn LanguageModel> =
            Arc::new(OpenAiChatClient::new(&settings, api_key.clone())?);

        let needs_embeddings =
            matches!(mode, ScoringMode::Similarity { .. }) || config.retrieval_enabled();
        let embedder: Option<Arc<dyn Embedder>> = if needs_embeddings {
            Some(Arc::new(OpenAiEmbeddingClient::new(&settings, api_key)?))
        } else {
            None
        };

        let reference = Arc::new(ReferenceTechSet::new(config.reference_techs()));
        if reference.is_empty() {
            tracing::warn!("⚠️ Reference technology set is empty; every post will score 0%");
        }
        let mut scorer = OverlapScorer::new(reference);
        if let (ScoringMode::Similarity { .. }, Some(embedder)) = (mode, &embedder) {
            scorer = scorer.with_embedder(embedder.clone());
        }

        let client = build_client(settings.timeout_seconds)?;

        let retrieving = config.retrieval_enabled() && embedder.is_some();
        let model_verdict = config.verdict_strategy() == VerdictStrategy::Model;
        let resume = if retrieving || model_verdict {
            let (resume, origin) =
                load_text(&config.resume_source(), &client, DEFAULT_RESUME).await?;
            tracing::info!("📄 Loaded resume from {}", origin);
            Some(resume)
        } else {
            None
        };

        let assembler = match config.verdict_strategy() {
            VerdictStrategy::Deterministic => {
                VerdictAssembler::deterministic(config.match_threshold())
            }
            VerdictStrategy::Model => {
                let assembler =
                    VerdictAssembler::model_authored(config.match_threshold(), model.clone());
                match (&resume, retrieving) {
                    (Some(resume), false) => assembler.with_resume(resume.clone()),
                    _ => assembler,
                }
            }
        };

        let mut runner = PipelineRunner::new(model, Arc::new(scorer), assembler)
            .with_normalizer(FieldNormalizer::new(config.title_buckets()))
            .with_mode(mode)
            .with_monitoring(config.monitoring_enabled())
            .with_notifier(Arc::new(TracingNotifier));

        if let (true, Some(embedder), Some(resume)) = (retrieving, &embedder, resume) {
            let index = LazyResumeIndex::new(resume, embedder.clone());
            runner = runner.with_retriever(Arc::new(index), config.retrieval_top_k());
        }

        if let Some(format) = output {
            runner = runner.with_notifier(Arc::new(StdoutNotifier::new(format)));
        }

        tracing::info!(
            "🔧 Pipeline ready: model={}, scoring={}, verdict={:?}, threshold={}%",
            settings.chat_model,
            mode.name(),
            config.verdict_strategy(),
            config.match_threshold()
        );

        Ok(Self {
            runner,
            source: ConfiguredPostSource::new(config.post_source(), client, DEFAULT_POST),
        })
    }

    pub fn runner(&self) -> &PipelineRunner {
        &self.runner
    }

    pub async fn run(&self) -> Result<MatchReport> {
        self.runner.run(&self.source).await
    }
}
