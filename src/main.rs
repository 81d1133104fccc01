use anyhow::Context;
use clap::Parser;
use corptax_etl::utils::{logger, validation::Validate};
use corptax_etl::{CliConfig, EtlEngine, FredClient, LocalStorage, RatePipeline};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if std::env::var("CORPTAX_LOG_JSON").is_ok() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting corptax-etl");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let client = FredClient::with_timeout(
        config.base_url.clone(),
        config.api_key.clone(),
        Duration::from_secs(30),
    )
    .context("failed to build HTTP client")?;
    let pipeline = RatePipeline::new(storage, config, client);

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Effective tax rate ETL completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ Effective tax rate ETL completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                corptax_etl::utils::error::ErrorSeverity::Low => 0,
                corptax_etl::utils::error::ErrorSeverity::Medium => 2,
                corptax_etl::utils::error::ErrorSeverity::High => 1,
                corptax_etl::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
