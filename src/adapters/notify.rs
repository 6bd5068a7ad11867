use crate::domain::model::MatchReport;
use crate::domain::ports::Notifier;
use crate::utils::error::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints the report to standard output.
pub struct StdoutNotifier {
    format: OutputFormat,
}

impl StdoutNotifier {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn notify(&self, report: &MatchReport) -> Result<()> {
        let rendered = match self.format {
            OutputFormat::Text => render_text(report),
            OutputFormat::Json => serde_json::to_string_pretty(report)?,
        };
        println!("{}", rendered);
        Ok(())
    }
}

/// Logs the extracted, normalized and final records through `tracing`.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, report: &MatchReport) -> Result<()> {
        tracing::info!(run_id = %report.run_id, "Extracted: {}", serde_json::to_string(&report.extracted)?);
        tracing::info!(run_id = %report.run_id, "Normalized: {}", serde_json::to_string(&report.normalized)?);
        tracing::info!(run_id = %report.run_id, "Match Result: {}", serde_json::to_string(&report.verdict)?);
        for diagnostic in &report.diagnostics {
            tracing::warn!(run_id = %report.run_id, "Diagnostic: {}", diagnostic);
        }
        Ok(())
    }
}

pub fn render_text(report: &MatchReport) -> String {
    let verdict = &report.verdict;
    let normalized = &report.normalized;
    let mut lines = vec![
        format!(
            "Match: {} ({}%, {} of {} technologies)",
            if verdict.is_match { "yes" } else { "no" },
            verdict.match_percentage,
            verdict.tech_match_count,
            verdict.total_required_techs
        ),
        format!(
            "Title: {} [{}]",
            if normalized.title.is_empty() { "(unknown)" } else { &normalized.title },
            normalized.category
        ),
    ];

    if !normalized.techs.is_empty() {
        lines.push(format!("Technologies: {}", normalized.techs.join(", ")));
    }
    if let Some(seniority) = &normalized.seniority {
        lines.push(format!("Seniority: {}", seniority));
    }
    if let Some(remote) = normalized.remote {
        lines.push(format!("Remote: {}", if remote { "yes" } else { "no" }));
    }
    if let Some(salary) = &normalized.salary_range {
        lines.push(format!("Salary: {}", salary));
    }

    lines.push("Reasons:".to_string());
    lines.extend(verdict.reasons.iter().map(|r| format!("  - {}", r)));

    if !report.diagnostics.is_empty() {
        lines.push("Diagnostics:".to_string());
        lines.extend(report.diagnostics.iter().map(|d| format!("  - {}", d)));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Category, ExtractedFields, MatchVerdict, NormalizedFields};
    use chrono::Utc;

    fn report() -> MatchReport {
        MatchReport {
            run_id: "run-1".to_string(),
            evaluated_at: Utc::now(),
            post_origin: "inline".to_string(),
            extracted: ExtractedFields::default(),
            normalized: NormalizedFields {
                title: "Frontend Developer".to_string(),
                techs: vec!["React".to_string(), "Vue".to_string()],
                category: Category::Frontend,
                seniority: None,
                remote: Some(true),
                salary_range: None,
            },
            verdict: MatchVerdict {
                is_match: true,
                reasons: vec!["Sufficient technology overlap".to_string()],
                tech_match_count: 1,
                total_required_techs: 2,
                match_percentage: 50,
            },
            diagnostics: vec!["Unable to parse extracted fields".to_string()],
        }
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&report());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Match: yes (50%, 1 of 2 technologies)");
        assert_eq!(lines[1], "Title: Frontend Developer [Frontend]");
        assert_eq!(lines[2], "Technologies: React, Vue");
        assert_eq!(lines[3], "Remote: yes");
        assert_eq!(lines[4], "Reasons:");
        assert_eq!(lines[5], "  - Sufficient technology overlap");
        assert_eq!(lines[6], "Diagnostics:");
    }

    #[test]
    fn test_render_text_unknown_title() {
        let mut report = report();
        report.normalized = NormalizedFields::default();
        report.diagnostics.clear();
        let text = render_text(&report);

        assert!(text.contains("Title: (unknown) [Other]"));
        assert!(!text.contains("Technologies:"));
        assert!(!text.contains("Diagnostics:"));
    }

    #[tokio::test]
    async fn test_report_json_shape() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["verdict"]["match"], true);
        assert_eq!(json["normalized"]["category"], "Frontend");
        assert_eq!(json["runId"], "run-1");
        TracingNotifier.notify(&report()).await.unwrap();
    }
}
