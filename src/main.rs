use clap::Parser;
use job_matcher::adapters::notify::OutputFormat;
use job_matcher::utils::{logger, validation::Validate};
use job_matcher::{CliConfig, MatchPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting job-matcher CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let output = if config.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let result = match MatchPipeline::from_config(&config, Some(output)).await {
        Ok(pipeline) => pipeline.run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => {
            tracing::info!(
                "✅ Match run {} completed: match={}",
                report.run_id,
                report.verdict.is_match
            );
        }
        Err(e) => {
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
    }

    Ok(())
}
