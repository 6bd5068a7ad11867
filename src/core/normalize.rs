//! Field normalization: canonical technology names and title buckets.

use crate::domain::model::{Category, ExtractedFields, NormalizedFields, TitleBucket};

/// Ordered substring rules; the first rule whose needle occurs in the
/// lower-cased input decides the canonical name.
pub const TECH_RULES: &[(&str, &str)] = &[
    ("node", "Node.js"),
    ("react", "React"),
    ("javascript", "JavaScript"),
    ("aws", "AWS"),
];

pub fn canonical_tech(raw: &str) -> String {
    let lower = raw.to_lowercase();
    TECH_RULES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Maps raw technology names to canonical ones. Same length, same order.
pub fn normalize_techs(raw: &[String]) -> Vec<String> {
    raw.iter().map(|t| canonical_tech(t)).collect()
}

/// First bucket with a keyword contained in `title` wins (case-sensitive).
pub fn classify_title(title: &str, buckets: &[TitleBucket]) -> Category {
    if title.is_empty() {
        return Category::Other;
    }
    buckets
        .iter()
        .find(|bucket| bucket.keywords.iter().any(|k| !k.is_empty() && title.contains(k.as_str())))
        .map(|bucket| bucket.name)
        .unwrap_or(Category::Other)
}

pub fn default_title_buckets() -> Vec<TitleBucket> {
    vec![
        TitleBucket::new(Category::FullStack, &["Full-Stack", "Fullstack", "Full Stack"]),
        TitleBucket::new(Category::Backend, &["Backend", "Back-End", "API"]),
        TitleBucket::new(Category::Frontend, &["Frontend", "Front-End", "UI"]),
        TitleBucket::new(Category::Support, &["Support", "Help Desk", "Technical Support"]),
        TitleBucket::new(Category::Data, &["Data", "Scientist", "Engineer"]),
    ]
}

#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    buckets: Vec<TitleBucket>,
}

impl FieldNormalizer {
    pub fn new(buckets: Vec<TitleBucket>) -> Self {
        Self { buckets }
    }

    pub fn buckets(&self) -> &[TitleBucket] {
        &self.buckets
    }

    pub fn normalize(&self, extracted: &ExtractedFields) -> NormalizedFields {
        let title = extracted.title.clone().unwrap_or_default();
        let techs = extracted
            .technologies
            .as_deref()
            .map(normalize_techs)
            .unwrap_or_default();
        let category = classify_title(&title, &self.buckets);

        NormalizedFields {
            title,
            techs,
            category,
            seniority: extracted.seniority.clone(),
            remote: extracted.remote,
            salary_range: extracted.salary_range.clone(),
        }
    }
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new(default_title_buckets())
    }
}
