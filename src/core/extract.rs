//! Field extraction: ask the language model for structured fields and parse
//! its reply on a best-effort basis.

use crate::domain::model::{ExtractedFields, JobPost};
use crate::domain::ports::LanguageModel;
use crate::utils::error::Result;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub const EXTRACT_PROMPT_TEMPLATE: &str = "Extract Title, Technologies, Seniority, Remote (true/false), SalaryRange from this job post as JSON.\n\
Respond with a single JSON object and nothing else.\n\nPost:\n{post}";

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractOutcome {
    Parsed(ExtractedFields),
    /// Some fields were usable; the note names the ones that were dropped.
    Partial(ExtractedFields, String),
    Failed(String),
}

impl ExtractOutcome {
    /// The parsed fields, or the empty record when parsing failed.
    pub fn into_fields(self) -> (ExtractedFields, Option<String>) {
        match self {
            ExtractOutcome::Parsed(fields) => (fields, None),
            ExtractOutcome::Partial(fields, note) => (fields, Some(note)),
            ExtractOutcome::Failed(reason) => (ExtractedFields::default(), Some(reason)),
        }
    }
}

pub fn build_extract_prompt(post: &JobPost) -> String {
    EXTRACT_PROMPT_TEMPLATE.replace("{post}", post.text())
}

/// Calls the model and parses its reply. Only a collaborator failure is an
/// error; an unparseable reply is reported as `ExtractOutcome::Failed`.
pub async fn extract_fields(model: &dyn LanguageModel, post: &JobPost) -> Result<ExtractOutcome> {
    let reply = model.complete(&build_extract_prompt(post)).await?;
    Ok(parse_extraction(&reply))
}

pub fn parse_extraction(reply: &str) -> ExtractOutcome {
    let object = match parse_model_json::<Value>(reply) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            tracing::warn!("Extraction reply is not a JSON object");
            tracing::debug!("Unparseable extraction reply: {}", reply);
            return ExtractOutcome::Failed(format!(
                "Unable to parse extracted fields: expected an object, got {}",
                json_kind(&other)
            ));
        }
        Err(e) => {
            tracing::warn!("Could not parse extraction reply: {}", e);
            tracing::debug!("Unparseable extraction reply: {}", reply);
            return ExtractOutcome::Failed(format!("Unable to parse extracted fields: {}", e));
        }
    };

    let (object, dropped) = canonical_fields(object);
    match serde_json::from_value::<ExtractedFields>(Value::Object(object)) {
        Ok(fields) if dropped.is_empty() => ExtractOutcome::Parsed(fields),
        Ok(fields) => {
            tracing::warn!("Ignored malformed extracted fields: {}", dropped.join(", "));
            ExtractOutcome::Partial(
                fields,
                format!("Ignored malformed extracted fields: {}", dropped.join(", ")),
            )
        }
        Err(e) => {
            tracing::warn!("Could not parse extraction reply: {}", e);
            ExtractOutcome::Failed(format!("Unable to parse extracted fields: {}", e))
        }
    }
}

/// Maps the key spellings models produce onto one key per field. The
/// canonical spelling wins over aliases; a technologies value that is neither
/// a list nor a string is dropped and reported.
fn canonical_fields(object: Map<String, Value>) -> (Map<String, Value>, Vec<String>) {
    let mut fields = Map::new();
    let mut dropped = Vec::new();
    for (key, value) in object {
        let Some(name) = canonical_key(&key) else {
            continue;
        };
        if fields.contains_key(name) && key != name {
            continue;
        }
        if name == "technologies"
            && !matches!(value, Value::Array(_) | Value::String(_) | Value::Null)
        {
            dropped.push(format!("{} ({})", key, json_kind(&value)));
            continue;
        }
        fields.insert(name.to_string(), value);
    }
    (fields, dropped)
}

fn canonical_key(key: &str) -> Option<&'static str> {
    match key.to_lowercase().replace('_', "").as_str() {
        "title" => Some("title"),
        "technologies" | "techs" => Some("technologies"),
        "seniority" => Some("seniority"),
        "remote" => Some("remote"),
        "salaryrange" | "salary" => Some("salaryRange"),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Deserializes JSON a model wrapped in prose or code fences.
pub fn parse_model_json<T: DeserializeOwned>(reply: &str) -> serde_json::Result<T> {
    let text = strip_json_fences(reply);
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(first_error) => match outermost_object(text) {
            Some(object) if object.len() < text.len() => serde_json::from_str(object),
            _ => Err(first_error),
        },
    }
}

/// Strips ```json ... ``` or ``` ... ``` fences.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```JSON"))
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or_else(|| stripped.trim()),
        None => text,
    }
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
