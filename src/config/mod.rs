pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::adapters::fred::DEFAULT_BASE_URL;
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{
    self, validate_date, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_series_id, validate_url,
};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "corptax-etl")]
#[command(about = "Fetch corporate tax data from FRED and compute effective tax rates")]
pub struct CliConfig {
    /// FRED API key; get a free one at https://fred.stlouisfed.org/docs/api/api_key.html
    #[arg(long, env = "FRED_API_KEY")]
    pub api_key: String,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, default_value = "1950-01-01")]
    pub start_date: String,

    #[arg(long)]
    pub end_date: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Extra FRED series ids fetched and exported alongside the rate inputs
    #[arg(long, value_delimiter = ',')]
    pub series: Vec<String>,

    #[arg(long, default_value = "3")]
    pub concurrent_requests: usize,

    /// Trailing moving-average window for the quarterly table (0 disables)
    #[arg(long, default_value = "4")]
    pub ma_window: usize,

    /// Bundle all outputs into a single ZIP archive
    #[arg(long)]
    pub archive: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system monitoring")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn start_date(&self) -> &str {
        &self.start_date
    }

    fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    fn extra_series(&self) -> &[String] {
        &self.series
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn ma_window(&self) -> usize {
        self.ma_window
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn archive_output(&self) -> bool {
        self.archive
    }
}

#[cfg(feature = "cli")]
impl validation::Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_non_empty_string("api_key", &self.api_key)?;
        let start = validate_date("start_date", &self.start_date)?;
        if let Some(end_str) = &self.end_date {
            let end = validate_date("end_date", end_str)?;
            if end < start {
                return Err(crate::utils::error::EtlError::InvalidConfigValueError {
                    field: "end_date".to_string(),
                    value: end_str.clone(),
                    reason: format!("End date precedes start date {}", self.start_date),
                });
            }
        }
        validate_path("output_path", &self.output_path)?;
        validate_positive_number("concurrent_requests", self.concurrent_requests, 1)?;
        validate_range("ma_window", self.ma_window, 0, 40)?;
        for id in &self.series {
            validate_series_id("series", id)?;
        }
        Ok(())
    }
}
