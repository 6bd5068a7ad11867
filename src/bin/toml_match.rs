use clap::Parser;
use job_matcher::adapters::notify::OutputFormat;
use job_matcher::config::toml_config::TomlConfig;
use job_matcher::domain::model::TextSource;
use job_matcher::domain::ports::ConfigProvider;
use job_matcher::utils::{logger, validation::Validate};
use job_matcher::MatchPipeline;

#[derive(Parser)]
#[command(name = "toml-match")]
#[command(about = "Job matcher driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "job-matcher.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Dry run - show the configuration without calling any collaborator
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if config.log_json() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based job matcher");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Some(monitor) = args.monitor {
        config.monitoring.enabled = monitor;
        tracing::info!("🔧 Monitoring overridden to: {}", monitor);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no collaborator will be called");
        display_config_summary(&config);
        return Ok(());
    }

    let output = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let result = match MatchPipeline::from_config(&config, Some(output)).await {
        Ok(pipeline) => pipeline.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Match run failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn describe_source(source: &TextSource) -> String {
    match source {
        TextSource::Inline(text) => format!("inline text ({} chars)", text.chars().count()),
        TextSource::File(path) => format!("file {}", path),
        TextSource::Url(url) => format!("url {}", url),
        TextSource::Default => "built-in default".to_string(),
    }
}

fn display_config_summary(config: &TomlConfig) {
    let llm = config.llm_settings();

    println!("📋 Configuration Summary:");
    println!("  Threshold: {}%", config.match_threshold());
    println!("  Scoring: {:?}", config.scoring_mode());
    println!("  Verdict: {:?}", config.verdict_strategy());
    println!("  Post: {}", describe_source(&config.post_source()));
    println!();

    println!("🤖 Language Model:");
    println!("  Base URL: {}", llm.base_url);
    println!("  Chat model: {}", llm.chat_model);
    println!("  Embedding model: {}", llm.embedding_model);
    if let Some(temperature) = llm.temperature {
        println!("  Temperature: {}", temperature);
    }
    println!("  Timeout: {}s", llm.timeout_seconds);
    println!();

    let reference = config.reference_techs();
    println!("🧰 Reference Technologies ({}):", reference.len());
    println!("  {}", reference.join(", "));
    println!();

    println!("🗂️ Title Buckets:");
    for bucket in config.title_buckets() {
        println!("  {} <- {}", bucket.name, bucket.keywords.join(", "));
    }
    println!();

    if config.retrieval_enabled() {
        println!("📚 Retrieval:");
        println!("  Resume: {}", describe_source(&config.resume_source()));
        println!("  Top k: {}", config.retrieval_top_k());
        println!();
    }

    println!(
        "✅ Dry run complete. Monitoring {}.",
        if config.monitoring_enabled() { "enabled" } else { "disabled" }
    );
}
