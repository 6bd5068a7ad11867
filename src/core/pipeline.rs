use crate::core::extract::extract_fields;
use crate::core::normalize::FieldNormalizer;
use crate::core::scoring::OverlapScorer;
use crate::core::verdict::VerdictAssembler;
use crate::domain::model::{
    ExtractedFields, JobPost, MatchReport, MatchVerdict, NormalizedFields, OverlapScore,
    ScoringMode,
};
use crate::domain::ports::{LanguageModel, Notifier, PostSource, Retriever};
use crate::utils::error::{MatchError, Result};
use crate::utils::monitor::StageMonitor;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_TOP_K: usize = 4;

/// Pipeline stages, in execution order. There is no branching between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Retrieve,
    Extract,
    Normalize,
    Score,
    Assemble,
    Notify,
}

impl Stage {
    pub const ORDER: [Stage; 7] = [
        Stage::Fetch,
        Stage::Retrieve,
        Stage::Extract,
        Stage::Normalize,
        Stage::Score,
        Stage::Assemble,
        Stage::Notify,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Fetch => "Fetch",
            Stage::Retrieve => "Retrieve",
            Stage::Extract => "Extract",
            Stage::Normalize => "Normalize",
            Stage::Score => "Score",
            Stage::Assemble => "Assemble",
            Stage::Notify => "Notify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Partial result of one stage, merged into the run state before the next.
#[derive(Debug, Clone)]
pub enum StateUpdate {
    Fetched(JobPost),
    Retrieved(String),
    Extracted {
        fields: ExtractedFields,
        note: Option<String>,
    },
    Normalized(NormalizedFields),
    Scored(OverlapScore),
    Assembled(MatchVerdict),
    Unchanged,
}

/// State of a single run. Each run owns its own.
#[derive(Debug, Clone, Default)]
pub struct MatchState {
    pub run_id: String,
    pub post: Option<JobPost>,
    pub resume_context: Option<String>,
    pub extracted: Option<ExtractedFields>,
    pub normalized: Option<NormalizedFields>,
    pub score: Option<OverlapScore>,
    pub verdict: Option<MatchVerdict>,
    pub diagnostics: Vec<String>,
}

impl MatchState {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Default::default()
        }
    }

    pub fn apply(mut self, update: StateUpdate) -> Self {
        match update {
            StateUpdate::Fetched(post) => self.post = Some(post),
            StateUpdate::Retrieved(context) => self.resume_context = Some(context),
            StateUpdate::Extracted { fields, note } => {
                self.extracted = Some(fields);
                self.diagnostics.extend(note);
            }
            StateUpdate::Normalized(fields) => self.normalized = Some(fields),
            StateUpdate::Scored(score) => self.score = Some(score),
            StateUpdate::Assembled(verdict) => self.verdict = Some(verdict),
            StateUpdate::Unchanged => {}
        }
        self
    }

    pub fn into_report(self) -> Result<MatchReport> {
        let verdict = self.verdict.ok_or_else(|| {
            MatchError::stage_failed(Stage::Assemble.name(), "no verdict was produced")
        })?;
        Ok(MatchReport {
            run_id: self.run_id,
            evaluated_at: Utc::now(),
            post_origin: self
                .post
                .map(|p| p.origin().to_string())
                .unwrap_or_default(),
            extracted: self.extracted.unwrap_or_default(),
            normalized: self.normalized.unwrap_or_default(),
            verdict,
            diagnostics: self.diagnostics,
        })
    }
}

/// Runs Fetch → Retrieve → Extract → Normalize → Score → Assemble → Notify
/// for one post at a time.
pub struct PipelineRunner {
    model: Arc<dyn LanguageModel>,
    normalizer: FieldNormalizer,
    scorer: Arc<OverlapScorer>,
    mode: ScoringMode,
    assembler: VerdictAssembler,
    retriever: Option<Arc<dyn Retriever>>,
    top_k: usize,
    notifiers: Vec<Arc<dyn Notifier>>,
    monitor: StageMonitor,
}

impl PipelineRunner {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        scorer: Arc<OverlapScorer>,
        assembler: VerdictAssembler,
    ) -> Self {
        Self {
            model,
            normalizer: FieldNormalizer::default(),
            scorer,
            mode: ScoringMode::Exact,
            assembler,
            retriever: None,
            top_k: DEFAULT_TOP_K,
            notifiers: Vec::new(),
            monitor: StageMonitor::new(false),
        }
    }

    pub fn with_normalizer(mut self, normalizer: FieldNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_mode(mut self, mode: ScoringMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>, top_k: usize) -> Self {
        self.retriever = Some(retriever);
        self.top_k = top_k;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = StageMonitor::new(enabled);
        self
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Processes one post end to end. A collaborator failure aborts the run
    /// with a `StageError` naming the stage; nothing is notified in that case.
    pub async fn run(&self, source: &dyn PostSource) -> Result<MatchReport> {
        let run_id = format!("run-{}", Utc::now().format("%Y%m%dT%H%M%S%.3fZ"));
        tracing::info!("🚀 Starting match run {}", run_id);

        let mut state = MatchState::new(run_id);
        for stage in Stage::ORDER.into_iter().filter(|s| *s != Stage::Notify) {
            let started = Instant::now();
            let update = self.execute_stage(stage, &state, source).await.map_err(|e| {
                tracing::error!("❌ Stage {} failed: {}", stage, e);
                MatchError::stage(stage.name(), e)
            })?;
            state = state.apply(update);
            tracing::debug!("✅ Stage {} done in {:?}", stage, started.elapsed());
            self.monitor.log_stage(stage.name(), started.elapsed());
        }

        let report = state.into_report()?;

        let started = Instant::now();
        self.notify(&report)
            .await
            .map_err(|e| MatchError::stage(Stage::Notify.name(), e))?;
        self.monitor.log_stage(Stage::Notify.name(), started.elapsed());
        self.monitor.log_final_stats();

        tracing::info!(
            "🏁 Run {} finished: match={} ({}%)",
            report.run_id,
            report.verdict.is_match,
            report.verdict.match_percentage
        );
        Ok(report)
    }

    async fn execute_stage(
        &self,
        stage: Stage,
        state: &MatchState,
        source: &dyn PostSource,
    ) -> Result<StateUpdate> {
        match stage {
            Stage::Fetch => {
                let post = source.fetch().await?;
                tracing::info!(
                    "📥 Fetched post from {} ({} chars)",
                    post.origin(),
                    post.text().chars().count()
                );
                Ok(StateUpdate::Fetched(post))
            }
            Stage::Retrieve => {
                let Some(retriever) = &self.retriever else {
                    return Ok(StateUpdate::Unchanged);
                };
                let documents = retriever.search(post_text(state), self.top_k).await?;
                tracing::info!("📚 Retrieved {} resume excerpts", documents.len());
                let context = documents
                    .into_iter()
                    .map(|d| d.content)
                    .collect::<Vec<_>>()
                    .join("\n\n");
                Ok(StateUpdate::Retrieved(context))
            }
            Stage::Extract => {
                let post = state.post.as_ref().ok_or_else(|| {
                    MatchError::stage_failed(Stage::Fetch.name(), "no post was fetched")
                })?;
                let (fields, note) = extract_fields(self.model.as_ref(), post)
                    .await?
                    .into_fields();
                if fields.is_empty() && note.is_some() {
                    tracing::warn!("⚠️ Continuing with empty extracted fields");
                } else {
                    tracing::info!(
                        "🔎 Extracted title {:?} with {} technologies",
                        fields.title.as_deref().unwrap_or(""),
                        fields.technologies.as_ref().map(Vec::len).unwrap_or(0)
                    );
                }
                Ok(StateUpdate::Extracted { fields, note })
            }
            Stage::Normalize => {
                let extracted = state.extracted.clone().unwrap_or_default();
                let normalized = self.normalizer.normalize(&extracted);
                tracing::info!(
                    "🧹 Normalized to category {} with techs {:?}",
                    normalized.category,
                    normalized.techs
                );
                Ok(StateUpdate::Normalized(normalized))
            }
            Stage::Score => {
                let techs = state
                    .normalized
                    .as_ref()
                    .map(|n| n.techs.as_slice())
                    .unwrap_or_default();
                let score = self
                    .scorer
                    .score(techs, self.mode, state.resume_context.as_deref())
                    .await?;
                tracing::info!(
                    "📐 {} scoring: {} of {} technologies ({}%)",
                    self.mode.name(),
                    score.tech_match_count,
                    score.total_required_techs,
                    score.match_percentage
                );
                Ok(StateUpdate::Scored(score))
            }
            Stage::Assemble => {
                let score = state.score.clone().unwrap_or_else(OverlapScore::empty);
                let normalized = state.normalized.clone().unwrap_or_default();
                let verdict = self
                    .assembler
                    .assemble(&score, &normalized, state.resume_context.as_deref())
                    .await?;
                Ok(StateUpdate::Assembled(verdict))
            }
            Stage::Notify => Ok(StateUpdate::Unchanged),
        }
    }

    async fn notify(&self, report: &MatchReport) -> Result<()> {
        for notifier in &self.notifiers {
            notifier.notify(report).await?;
        }
        Ok(())
    }
}

fn post_text(state: &MatchState) -> &str {
    state.post.as_ref().map(|p| p.text()).unwrap_or_default()
}
