use crate::adapters::fred::DEFAULT_BASE_URL;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_date, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_series_id, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_START_DATE: &str = "1950-01-01";
const DEFAULT_CONCURRENT_REQUESTS: usize = 3;
const DEFAULT_MA_WINDOW: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub extract: ExtractConfig,
    pub transform: TransformConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: Option<String>,
    pub api_key: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub series: Option<Vec<String>>,
    pub concurrent_requests: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    pub ma_window: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` placeholders with environment values, so the API key
    /// can stay out of the config file (`api_key = "${FRED_API_KEY}"`).
    /// Unset variables are left as-is and caught by validation.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").expect("static pattern");

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("source.base_url", self.base_url())?;

        validate_non_empty_string("source.api_key", &self.source.api_key)?;
        // An unresolved placeholder means the environment variable was unset
        if self.source.api_key.starts_with("${") {
            return Err(EtlError::MissingConfigError {
                field: format!("source.api_key (unresolved {})", self.source.api_key),
            });
        }

        let start = validate_date("extract.start_date", self.start_date())?;
        if let Some(end_str) = self.end_date() {
            let end = validate_date("extract.end_date", end_str)?;
            if end < start {
                return Err(EtlError::InvalidConfigValueError {
                    field: "extract.end_date".to_string(),
                    value: end_str.to_string(),
                    reason: format!("End date precedes start date {}", self.start_date()),
                });
            }
        }

        if let Some(series) = &self.extract.series {
            for id in series {
                validate_series_id("extract.series", id)?;
            }
        }

        validate_positive_number(
            "extract.concurrent_requests",
            self.concurrent_requests(),
            1,
        )?;
        validate_range("transform.ma_window", self.ma_window(), 0, 40)?;
        validate_path("load.output_path", &self.load.output_path)?;

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.source.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn start_date(&self) -> &str {
        self.extract.start_date.as_deref().unwrap_or(DEFAULT_START_DATE)
    }

    pub fn end_date(&self) -> Option<&str> {
        self.extract.end_date.as_deref()
    }

    pub fn concurrent_requests(&self) -> usize {
        self.extract
            .concurrent_requests
            .unwrap_or(DEFAULT_CONCURRENT_REQUESTS)
    }

    pub fn ma_window(&self) -> usize {
        self.transform.ma_window.unwrap_or(DEFAULT_MA_WINDOW)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn compression_enabled(&self) -> bool {
        self.load
            .compression
            .as_ref()
            .map(|c| c.enabled)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    fn api_key(&self) -> &str {
        &self.source.api_key
    }

    fn start_date(&self) -> &str {
        self.start_date()
    }

    fn end_date(&self) -> Option<&str> {
        self.end_date()
    }

    fn extra_series(&self) -> &[String] {
        self.extract.series.as_deref().unwrap_or(&[])
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests()
    }

    fn ma_window(&self) -> usize {
        self.ma_window()
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn archive_output(&self) -> bool {
        self.compression_enabled()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
