use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a job post came from; only used for logging and the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum PostOrigin {
    Inline,
    File(String),
    Url(String),
    Default,
}

impl fmt::Display for PostOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostOrigin::Inline => write!(f, "inline"),
            PostOrigin::File(path) => write!(f, "file:{}", path),
            PostOrigin::Url(url) => write!(f, "{}", url),
            PostOrigin::Default => write!(f, "built-in default"),
        }
    }
}

/// Where to read a text input (job post or resume) from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    Inline(String),
    File(String),
    Url(String),
    Default,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ScoringKind {
    #[default]
    Exact,
    Similarity,
    Context,
}

/// How technologies are matched against the reference set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoringMode {
    Exact,
    Similarity { threshold: f32 },
    /// Substring match against resume excerpts retrieved for the run.
    Context,
}

impl ScoringMode {
    pub fn from_kind(kind: ScoringKind, similarity_threshold: f32) -> Self {
        match kind {
            ScoringKind::Exact => ScoringMode::Exact,
            ScoringKind::Similarity => ScoringMode::Similarity {
                threshold: similarity_threshold,
            },
            ScoringKind::Context => ScoringMode::Context,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoringMode::Exact => "exact",
            ScoringMode::Similarity { .. } => "similarity",
            ScoringMode::Context => "context",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum VerdictStrategy {
    #[default]
    Deterministic,
    /// Ask the language model for the reasons; fall back to deterministic.
    Model,
}

/// Connection settings for the OpenAI-compatible HTTP collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: Option<f32>,
    pub timeout_seconds: u64,
}

/// The raw job-post text. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPost {
    text: String,
    origin: PostOrigin,
}

impl JobPost {
    pub fn new(text: impl Into<String>, origin: PostOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> &PostOrigin {
        &self.origin
    }
}

/// Fields the language model pulled out of a post. Every field is optional and
/// the parser accepts the key spellings models tend to produce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    #[serde(default, alias = "Title", deserialize_with = "loose_string")]
    pub title: Option<String>,

    #[serde(
        default,
        alias = "Technologies",
        alias = "techs",
        deserialize_with = "tech_list"
    )]
    pub technologies: Option<Vec<String>>,

    #[serde(default, alias = "Seniority", deserialize_with = "loose_string")]
    pub seniority: Option<String>,

    #[serde(default, alias = "Remote", deserialize_with = "loose_bool")]
    pub remote: Option<bool>,

    #[serde(
        default,
        alias = "SalaryRange",
        alias = "salary_range",
        alias = "Salary",
        deserialize_with = "loose_string"
    )]
    pub salary_range: Option<String>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        // e.g. {"min": 15, "max": 45} for a salary range
        Some(other) => Some(other.to_string()),
    })
}

fn tech_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        )),
        Some(serde_json::Value::Array(items)) => Ok(Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        )),
        Some(_) => Ok(None),
    }
}

fn loose_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(serde_json::Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "remote" | "100% remote" | "fully remote" => Some(true),
            "false" | "no" | "onsite" | "on-site" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Fixed title categories. Serialized with their display names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Full-Stack")]
    FullStack,
    Backend,
    Frontend,
    Support,
    Data,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::FullStack,
        Category::Backend,
        Category::Frontend,
        Category::Support,
        Category::Data,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FullStack => "Full-Stack",
            Category::Backend => "Backend",
            Category::Frontend => "Frontend",
            Category::Support => "Support",
            Category::Data => "Data",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| {
                format!(
                    "unknown category '{}', expected one of: {}",
                    s,
                    Category::ALL.map(|c| c.as_str()).join(", ")
                )
            })
    }
}

/// A category with the keywords that put a title into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleBucket {
    pub name: Category,
    pub keywords: Vec<String>,
}

impl TitleBucket {
    pub fn new(name: Category, keywords: &[&str]) -> Self {
        Self {
            name,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFields {
    pub title: String,
    pub techs: Vec<String>,
    pub category: Category,
    pub seniority: Option<String>,
    pub remote: Option<bool>,
    pub salary_range: Option<String>,
}

/// The evaluator's known skills, in canonical spelling. Built once at startup
/// and shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTechSet {
    names: Vec<String>,
}

impl ReferenceTechSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            let name = name.trim();
            if !name.is_empty() && !unique.iter().any(|n| n == name) {
                unique.push(name.to_string());
            }
        }
        Self { names: unique }
    }

    pub fn contains(&self, tech: &str) -> bool {
        self.names.iter().any(|n| n == tech)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// How many of a post's technologies the reference set covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapScore {
    pub tech_match_count: usize,
    pub total_required_techs: usize,
    pub match_percentage: u8,
    pub matched: Vec<String>,
}

impl OverlapScore {
    /// Builds a score from the matched entries out of `total`.
    /// Percentage is rounded half up and 0 when there is nothing to match.
    pub fn new(matched: Vec<String>, total: usize) -> Self {
        let count = matched.len().min(total);
        Self {
            tech_match_count: count,
            total_required_techs: total,
            match_percentage: percentage(count, total),
            matched,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }
}

pub fn percentage(count: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let count = count.min(total) as u64;
    let total = total as u64;
    ((200 * count + total) / (2 * total)) as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchVerdict {
    #[serde(rename = "match")]
    pub is_match: bool,
    pub reasons: Vec<String>,
    pub tech_match_count: usize,
    pub total_required_techs: usize,
    pub match_percentage: u8,
}

/// A resume excerpt returned by a retriever, best match first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDocument {
    pub content: String,
    pub score: f32,
    pub chunk_index: usize,
}

/// Everything a run produced, as handed to the notification sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub run_id: String,
    pub evaluated_at: DateTime<Utc>,
    pub post_origin: String,
    pub extracted: ExtractedFields,
    pub normalized: NormalizedFields,
    pub verdict: MatchVerdict,
    pub diagnostics: Vec<String>,
}
