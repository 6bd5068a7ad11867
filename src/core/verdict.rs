//! Verdict assembly: threshold decision plus reasons, either fixed or
//! written by the language model.

use crate::core::extract::parse_model_json;
use crate::domain::model::{MatchVerdict, NormalizedFields, OverlapScore, VerdictStrategy};
use crate::domain::ports::LanguageModel;
use crate::utils::error::{MatchError, Result};
use serde::Deserialize;
use std::sync::Arc;

pub const DEFAULT_MATCH_THRESHOLD: u8 = 50;

/// Shape we accept back from the model. Counts it echoes are ignored.
#[derive(Debug, Deserialize)]
struct ModelVerdict {
    #[serde(rename = "match", alias = "isMatch", alias = "is_match")]
    is_match: bool,
    #[serde(default)]
    reasons: Vec<String>,
}

pub fn is_match(score: &OverlapScore, threshold: u8) -> bool {
    score.match_percentage >= threshold
}

/// Verdict with a single fixed explanation chosen by the outcome.
pub fn deterministic_verdict(score: &OverlapScore, threshold: u8) -> MatchVerdict {
    let matched = is_match(score, threshold);
    let reason = if matched {
        format!(
            "Sufficient technology overlap: {} of {} required technologies ({}%) meets the {}% threshold",
            score.tech_match_count, score.total_required_techs, score.match_percentage, threshold
        )
    } else {
        format!(
            "Insufficient technology overlap: {} of {} required technologies ({}%) is below the {}% threshold",
            score.tech_match_count, score.total_required_techs, score.match_percentage, threshold
        )
    };
    verdict_from(score, matched, vec![reason])
}

fn verdict_from(score: &OverlapScore, is_match: bool, reasons: Vec<String>) -> MatchVerdict {
    MatchVerdict {
        is_match,
        reasons,
        tech_match_count: score.tech_match_count,
        total_required_techs: score.total_required_techs,
        match_percentage: score.match_percentage,
    }
}

/// Retrieved excerpts take precedence over the full resume.
pub fn build_verdict_prompt(
    score: &OverlapScore,
    normalized: &NormalizedFields,
    threshold: u8,
    resume_context: Option<&str>,
    resume: Option<&str>,
) -> Result<String> {
    let mut prompt = String::new();
    if let Some(context) = resume_context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("Based on these resume excerpts:\n{}\n\n", context));
    } else if let Some(resume) = resume.filter(|r| !r.trim().is_empty()) {
        prompt.push_str(&format!("Resume:\n{}\n\n", resume.trim()));
    }
    prompt.push_str(&format!(
        "And this job:\n{}\n\n",
        serde_json::to_string_pretty(normalized)?
    ));
    prompt.push_str(&format!(
        "I match {} out of {} required techs ({}%). \
Respond with valid JSON {{ match: boolean, reasons: string[], techMatchCount, totalRequiredTechs, matchPercentage }}.\n\
Threshold for match is >={}%.",
        score.tech_match_count, score.total_required_techs, score.match_percentage, threshold
    ));
    Ok(prompt)
}

pub struct VerdictAssembler {
    strategy: VerdictStrategy,
    threshold: u8,
    model: Option<Arc<dyn LanguageModel>>,
    resume: Option<String>,
}

impl VerdictAssembler {
    pub fn deterministic(threshold: u8) -> Self {
        Self {
            strategy: VerdictStrategy::Deterministic,
            threshold,
            model: None,
            resume: None,
        }
    }

    pub fn model_authored(threshold: u8, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            strategy: VerdictStrategy::Model,
            threshold,
            model: Some(model),
            resume: None,
        }
    }

    /// Full resume shown to the model when no excerpts were retrieved.
    pub fn with_resume(mut self, resume: impl Into<String>) -> Self {
        self.resume = Some(resume.into());
        self
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn strategy(&self) -> VerdictStrategy {
        self.strategy
    }

    /// Always returns a complete verdict unless the model collaborator itself
    /// fails; a reply that does not parse falls back to the fixed reasons.
    pub async fn assemble(
        &self,
        score: &OverlapScore,
        normalized: &NormalizedFields,
        resume_context: Option<&str>,
    ) -> Result<MatchVerdict> {
        let model = match (self.strategy, &self.model) {
            (VerdictStrategy::Deterministic, _) => {
                return Ok(deterministic_verdict(score, self.threshold))
            }
            (VerdictStrategy::Model, Some(model)) => model,
            (VerdictStrategy::Model, None) => {
                return Err(MatchError::MissingConfigError {
                    field: "language model (required for model-authored verdicts)".to_string(),
                })
            }
        };

        let prompt = build_verdict_prompt(
            score,
            normalized,
            self.threshold,
            resume_context,
            self.resume.as_deref(),
        )?;
        let reply = model.complete(&prompt).await?;
        Ok(self.interpret_reply(score, &reply))
    }

    fn interpret_reply(&self, score: &OverlapScore, reply: &str) -> MatchVerdict {
        let decided = is_match(score, self.threshold);

        let parsed = parse_model_json::<ModelVerdict>(reply)
            .map_err(|e| e.to_string())
            .and_then(|v| {
                let reasons: Vec<String> = v
                    .reasons
                    .into_iter()
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect();
                if reasons.is_empty() {
                    Err("reply contained no reasons".to_string())
                } else {
                    Ok((v.is_match, reasons))
                }
            });

        match parsed {
            Ok((model_match, mut reasons)) => {
                if model_match != decided {
                    tracing::warn!(
                        model_match,
                        decided,
                        "Model verdict disagrees with the threshold rule"
                    );
                    reasons.push(format!(
                        "Model suggested match={} but {}% against the {}% threshold decides match={}",
                        model_match, score.match_percentage, self.threshold, decided
                    ));
                }
                verdict_from(score, decided, reasons)
            }
            Err(e) => {
                tracing::warn!("Falling back to deterministic verdict: {}", e);
                let mut verdict = deterministic_verdict(score, self.threshold);
                verdict.reasons.push(format!(
                    "Model verdict could not be parsed ({}); defaulting to match={}",
                    e, decided
                ));
                verdict
            }
        }
    }
}
