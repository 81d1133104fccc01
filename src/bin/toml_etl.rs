use anyhow::Context;
use clap::Parser;
use corptax_etl::config::toml_config::TomlConfig;
use corptax_etl::core::ConfigProvider;
use corptax_etl::domain::model::{series_info, PROFITS_BEFORE_TAX_QUARTERLY, TAX_RECEIPTS_QUARTERLY};
use corptax_etl::utils::{logger, validation::Validate};
use corptax_etl::{EtlEngine, FredClient, LocalStorage, RatePipeline};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Effective tax rate ETL driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "corptax-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show what would be fetched without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-driven tax rate ETL");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No requests will be made");
        perform_dry_run(&config);
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(ConfigProvider::output_path(&config).to_string());
    let timeout = Duration::from_secs(config.source.timeout_seconds.unwrap_or(30));
    let client = FredClient::with_timeout(
        config.base_url().to_string(),
        config.source.api_key.clone(),
        timeout,
    )
    .context("failed to build HTTP client")?;
    let pipeline = RatePipeline::new(storage, config, client);

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ ETL process completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ ETL process completed successfully!");
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

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name, config.pipeline.version
    );
    println!("  Source: {}", config.base_url());
    println!("  Date range: {} .. {}", config.start_date(), config.end_date().unwrap_or("latest"));
    println!("  Output: {}", ConfigProvider::output_path(config));
    println!("  Archive: {}", config.compression_enabled());
    println!("  Concurrent Requests: {}", config.concurrent_requests());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Series to fetch:");
    let mut ids = vec![TAX_RECEIPTS_QUARTERLY, PROFITS_BEFORE_TAX_QUARTERLY];
    for id in ConfigProvider::extra_series(config) {
        if !ids.contains(&id.as_str()) {
            ids.push(id.as_str());
        }
    }
    for id in ids {
        match series_info(id) {
            Some(info) => println!("  {} - {} ({:?})", info.id, info.name, info.frequency),
            None => println!("  {} - (not in catalog)", id),
        }
    }

    println!();
    println!("⚙️ Transform:");
    println!("  Quarterly effective rate table, MA window {}", config.ma_window());
    println!("  Annual table from calendar-year sums");

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", ConfigProvider::output_path(config));
    if config.compression_enabled() {
        println!("  Compression: single ZIP bundle");
    } else {
        println!("  Plain CSV + JSON files");
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
