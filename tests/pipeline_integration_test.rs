use anyhow::Result;
use httpmock::prelude::*;
use job_matcher::config::toml_config::TomlConfig;
use job_matcher::domain::model::{Category, PostOrigin, ScoringKind, VerdictStrategy};
use job_matcher::{MatchError, MatchPipeline};
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

const API_KEY: &str = "test-key";

const JOB_POST: &str = "Acme is hiring a Senior Frontend Developer. React, Node, AWS Lambda, Python. Remote.";

fn chat_reply(content: &str) -> Value {
    json!({
        "choices": [ { "message": { "role": "assistant", "content": content } } ],
        "usage": { "prompt_tokens": 100, "completion_tokens": 20 }
    })
}

fn extraction_reply() -> Value {
    chat_reply(
        "```json\n{\"Title\": \"Senior Frontend Developer\", \"Technologies\": [\"React\", \"node\", \"AWS Lambda\", \"Python\"], \"Seniority\": \"Senior\", \"Remote\": true, \"SalaryRange\": null}\n```",
    )
}

fn base_config(server: &MockServer) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.llm.base_url = server.base_url();
    config.reference.techs = vec!["React".into(), "Node.js".into(), "AWS".into()];
    config.source.post_text = Some(JOB_POST.to_string());
    config
}

#[tokio::test]
async fn test_end_to_end_exact_match() -> Result<()> {
    let server = MockServer::start_async().await;
    let extract = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Extract Title")
                .body_contains("Acme is hiring");
            then.status(200).json_body(extraction_reply());
        })
        .await;

    let config = base_config(&server);
    let pipeline = MatchPipeline::with_api_key(&config, API_KEY.to_string(), None).await?;
    let report = pipeline.run().await?;

    extract.assert_async().await;
    assert_eq!(report.post_origin, PostOrigin::Inline.to_string());
    assert_eq!(report.normalized.title, "Senior Frontend Developer");
    assert_eq!(report.normalized.category, Category::Frontend);
    assert_eq!(
        report.normalized.techs,
        vec!["React", "Node.js", "AWS", "Python"]
    );
    assert_eq!(report.normalized.seniority.as_deref(), Some("Senior"));
    assert_eq!(report.normalized.remote, Some(true));

    let verdict = &report.verdict;
    assert!(verdict.is_match);
    assert_eq!(verdict.tech_match_count, 3);
    assert_eq!(verdict.total_required_techs, 4);
    assert_eq!(verdict.match_percentage, 75);
    assert_eq!(verdict.reasons.len(), 1);
    assert!(report.diagnostics.is_empty());
    assert!(report.run_id.starts_with("run-"));
    Ok(())
}

#[tokio::test]
async fn test_model_authored_verdict_keeps_computed_counts() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Extract Title");
            then.status(200).json_body(extraction_reply());
        })
        .await;
    let verdict_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("I match 3 out of 4 required techs (75%)");
            then.status(200).json_body(chat_reply(
                "{\"match\": true, \"reasons\": [\"Strong React and Node.js overlap\"], \"techMatchCount\": 9, \"totalRequiredTechs\": 9, \"matchPercentage\": 100}",
            ));
        })
        .await;

    let mut config = base_config(&server);
    config.matcher.verdict = VerdictStrategy::Model;
    let pipeline = MatchPipeline::with_api_key(&config, API_KEY.to_string(), None).await?;
    let report = pipeline.run().await?;

    verdict_mock.assert_async().await;
    assert!(report.verdict.is_match);
    assert_eq!(report.verdict.reasons, vec!["Strong React and Node.js overlap"]);
    assert_eq!(report.verdict.tech_match_count, 3);
    assert_eq!(report.verdict.total_required_techs, 4);
    assert_eq!(report.verdict.match_percentage, 75);
    Ok(())
}

#[tokio::test]
async fn test_unparseable_model_verdict_falls_back() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Extract Title");
            then.status(200).json_body(extraction_reply());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Threshold for match");
            then.status(200)
                .json_body(chat_reply("Looks like a good fit to me!"));
        })
        .await;

    let mut config = base_config(&server);
    config.matcher.verdict = VerdictStrategy::Model;
    config.matcher.threshold = 80;
    let pipeline = MatchPipeline::with_api_key(&config, API_KEY.to_string(), None).await?;
    let report = pipeline.run().await?;

    assert!(!report.verdict.is_match);
    assert_eq!(report.verdict.match_percentage, 75);
    assert_eq!(report.verdict.reasons.len(), 2);
    assert!(report.verdict.reasons[0].starts_with("Insufficient technology overlap"));
    assert!(report.verdict.reasons[1].contains("could not be parsed"));
    Ok(())
}

#[tokio::test]
async fn test_unparseable_extraction_continues_with_empty_fields() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .json_body(chat_reply("Sorry, I can't help with that."));
        })
        .await;

    let config = base_config(&server);
    let pipeline = MatchPipeline::with_api_key(&config, API_KEY.to_string(), None).await?;
    let report = pipeline.run().await?;

    assert!(report.extracted.is_empty());
    assert_eq!(report.normalized.title, "");
    assert_eq!(report.normalized.category, Category::Other);
    assert!(report.normalized.techs.is_empty());
    assert!(!report.verdict.is_match);
    assert_eq!(report.verdict.match_percentage, 0);
    assert_eq!(report.diagnostics.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_collaborator_failure_aborts_in_extract() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(500)
                .json_body(json!({ "error": { "message": "model overloaded" } }));
        })
        .await;

    let config = base_config(&server);
    let pipeline = MatchPipeline::with_api_key(&config, API_KEY.to_string(), None).await?;
    let err = pipeline.run().await.unwrap_err();

    match &err {
        MatchError::StageError { stage, details, .. } => {
            assert_eq!(stage, "Extract");
            assert!(details.contains("model overloaded"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.exit_code(), 2);
    Ok(())
}

#[tokio::test]
async fn test_unauthorized_extract_keeps_api_key_hint() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401)
                .json_body(json!({ "error": { "message": "Incorrect API key provided" } }));
        })
        .await;

    let config = base_config(&server);
    let pipeline = MatchPipeline::with_api_key(&config, "wrong".to_string(), None).await?;
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(&err, MatchError::StageError { stage, .. } if stage == "Extract"));
    assert!(err.recovery_suggestion().contains("OPENAI_API_KEY"));
    assert_eq!(err.exit_code(), 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_post_file_exits_as_io_error() -> Result<()> {
    let server = MockServer::start_async().await;
    let chat = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(extraction_reply());
        })
        .await;

    let dir = tempfile::tempdir()?;
    let mut config = base_config(&server);
    config.source.post_text = None;
    let missing = dir.path().join("missing-post.txt");
    config.source.post_file = Some(missing.to_string_lossy().to_string());
    let pipeline = MatchPipeline::with_api_key(&config, API_KEY.to_string(), None).await?;
    let err = pipeline.run().await.unwrap_err();

    match &err {
        MatchError::StageError { stage, details, .. } => {
            assert_eq!(stage, "Fetch");
            assert!(details.starts_with("IO error"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.exit_code(), 3);
    assert_eq!(err.recovery_suggestion(), "Check file paths and permissions");
    assert_eq!(chat.hits_async().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_model_verdict_sees_full_resume_without_retrieval() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Extract Title");
            then.status(200).json_body(extraction_reply());
        })
        .await;
    let verdict_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Resume:\\nReact\\nNode.js\\nAWS Lambda")
                .body_contains("I match 3 out of 4 required techs (75%)");
            then.status(200).json_body(chat_reply(
                "{\"match\": true, \"reasons\": [\"React and Node.js are on the resume\"]}",
            ));
        })
        .await;
    let embeddings = server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).json_body(json!({ "data": [] }));
        })
        .await;

    let mut config = base_config(&server);
    config.matcher.verdict = VerdictStrategy::Model;
    config.retrieval.resume_text = Some("React\nNode.js\nAWS Lambda".to_string());
    let pipeline = MatchPipeline::with_api_key(&config, API_KEY.to_string(), None).await?;
    let report = pipeline.run().await?;

    verdict_mock.assert_async().await;
    assert_eq!(embeddings.hits_async().await, 0);
    assert_eq!(report.verdict.reasons, vec!["React and Node.js are on the resume"]);
    assert_eq!(report.verdict.match_percentage, 75);
    Ok(())
}

#[tokio::test]
async fn test_similarity_scoring_embeds_reference_once() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(chat_reply(
                "{\"title\": \"UI Engineer\", \"technologies\": \"React, Vue\"}",
            ));
        })
        .await;
    let reference = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embeddings")
                .body_contains("\"input\":[\"React\",\"Node.js\"]");
            then.status(200).json_body(json!({
                "data": [
                    { "index": 0, "embedding": [1.0, 0.0] },
                    { "index": 1, "embedding": [0.0, 1.0] }
                ]
            }));
        })
        .await;
    let techs = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embeddings")
                .body_contains("\"input\":[\"React\",\"Vue\"]");
            then.status(200).json_body(json!({
                "data": [
                    { "index": 0, "embedding": [0.9, 0.1] },
                    { "index": 1, "embedding": [-1.0, 0.0] }
                ]
            }));
        })
        .await;

    let mut config = base_config(&server);
    config.reference.techs = vec!["React".into(), "Node.js".into()];
    config.matcher.scoring = ScoringKind::Similarity;
    let pipeline = MatchPipeline::with_api_key(&config, API_KEY.to_string(), None).await?;

    let first = pipeline.run().await?;
    let second = pipeline.run().await?;

    for report in [&first, &second] {
        assert_eq!(report.normalized.category, Category::Frontend);
        assert_eq!(report.verdict.tech_match_count, 1);
        assert_eq!(report.verdict.total_required_techs, 2);
        assert_eq!(report.verdict.match_percentage, 50);
        assert!(report.verdict.is_match);
    }
    assert_eq!(reference.hits_async().await, 1);
    assert_eq!(techs.hits_async().await, 2);
    Ok(())
}

#[tokio::test]
async fn test_context_scoring_uses_retrieved_resume_excerpts() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(chat_reply(
                "{\"title\": \"Platform Engineer\", \"technologies\": [\"React\", \"Docker\"]}",
            ));
        })
        .await;
    let index = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embeddings")
                .body_contains("\"input\":[\"React, Redux\",\"Docker, Rancher\"]");
            then.status(200).json_body(json!({
                "data": [
                    { "index": 0, "embedding": [1.0, 0.0] },
                    { "index": 1, "embedding": [0.0, 1.0] }
                ]
            }));
        })
        .await;
    let query = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embeddings")
                .body_contains("Acme is hiring");
            then.status(200).json_body(json!({
                "data": [ { "index": 0, "embedding": [1.0, 0.1] } ]
            }));
        })
        .await;

    let mut config = base_config(&server);
    config.matcher.scoring = ScoringKind::Context;
    config.retrieval.top_k = 1;
    config.retrieval.resume_text = Some("React, Redux\n\nDocker, Rancher".to_string());
    let pipeline = MatchPipeline::with_api_key(&config, API_KEY.to_string(), None).await?;
    let report = pipeline.run().await?;

    index.assert_async().await;
    query.assert_async().await;
    assert_eq!(report.normalized.category, Category::Data);
    assert_eq!(report.verdict.tech_match_count, 1);
    assert_eq!(report.verdict.total_required_techs, 2);
    assert_eq!(report.verdict.match_percentage, 50);
    Ok(())
}

#[tokio::test]
async fn test_post_read_from_file() -> Result<()> {
    let server = MockServer::start_async().await;
    let extract = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Technical Support Engineer");
            then.status(200).json_body(chat_reply(
                "{\"title\": \"Technical Support Engineer\", \"technologies\": []}",
            ));
        })
        .await;

    let mut post_file = NamedTempFile::new()?;
    post_file.write_all("Technical Support Engineer\nNative level English".as_bytes())?;
    let path = post_file.path().to_string_lossy().to_string();

    let mut config = base_config(&server);
    config.source.post_text = None;
    config.source.post_file = Some(path.clone());
    let pipeline = MatchPipeline::with_api_key(&config, API_KEY.to_string(), None).await?;
    let report = pipeline.run().await?;

    extract.assert_async().await;
    assert_eq!(report.post_origin, PostOrigin::File(path).to_string());
    assert_eq!(report.normalized.category, Category::Support);
    assert_eq!(report.verdict.total_required_techs, 0);
    assert_eq!(report.verdict.match_percentage, 0);
    assert!(!report.verdict.is_match);
    Ok(())
}

#[tokio::test]
async fn test_post_fetched_from_url() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/jobs/7");
            then.status(200)
                .body("Full Stack Developer wanted: React, Node");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Full Stack Developer wanted");
            then.status(200).json_body(chat_reply(
                "{\"title\": \"Full Stack Developer\", \"technologies\": [\"React\", \"Node\"]}",
            ));
        })
        .await;

    let mut config = base_config(&server);
    config.source.post_text = None;
    config.source.post_url = Some(server.url("/jobs/7"));
    let pipeline = MatchPipeline::with_api_key(&config, API_KEY.to_string(), None).await?;
    let report = pipeline.run().await?;

    assert_eq!(report.post_origin, server.url("/jobs/7"));
    assert_eq!(report.normalized.category, Category::FullStack);
    assert_eq!(report.normalized.techs, vec!["React", "Node.js"]);
    assert_eq!(report.verdict.match_percentage, 100);
    Ok(())
}

#[tokio::test]
async fn test_toml_file_drives_pipeline() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(chat_reply(
                "{\"title\": \"API Developer\", \"technologies\": [\"Go\", \"React\"]}",
            ));
        })
        .await;

    let mut config_file = NamedTempFile::new()?;
    let content = format!(
        r#"
[matcher]
threshold = 49

[reference]
techs = ["React"]

[llm]
base_url = "{}"

[source]
post_text = "We need an API Developer"
"#,
        server.base_url()
    );
    config_file.write_all(content.as_bytes())?;

    let config = TomlConfig::from_file(config_file.path())?;
    let pipeline = MatchPipeline::with_api_key(&config, API_KEY.to_string(), None).await?;
    let report = pipeline.run().await?;

    assert_eq!(report.normalized.category, Category::Backend);
    assert_eq!(report.verdict.match_percentage, 50);
    assert!(report.verdict.is_match);
    Ok(())
}
