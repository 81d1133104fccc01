use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("FRED API error {code}: {message}")]
    FredApiError { code: u32, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Date parsing error: {0}")]
    DateParseError(#[from] chrono::ParseError),

    #[error("Division by zero: profits before tax is zero at {period}")]
    DivisionByZero { period: String },

    #[error("Non-finite value in {context}")]
    NonFiniteValue { context: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::FredApiError { .. } => ErrorCategory::Network,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ZipError(_)
            | EtlError::DateParseError(_)
            | EtlError::DivisionByZero { .. }
            | EtlError::NonFiniteValue { .. }
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Network problems are usually transient
            EtlError::ApiError(_) | EtlError::FredApiError { .. } => ErrorSeverity::Medium,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ZipError(_)
            | EtlError::DateParseError(_)
            | EtlError::DivisionByZero { .. }
            | EtlError::NonFiniteValue { .. }
            | EtlError::ProcessingError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) => {
                "Check network connectivity and the FRED endpoint URL, then retry"
            }
            EtlError::FredApiError { .. } => {
                "Check the series id and API key; get a free key at https://fred.stlouisfed.org/docs/api/api_key.html"
            }
            EtlError::CsvError(_) => "Inspect the output data for malformed rows",
            EtlError::IoError(_) => "Check file permissions and available disk space",
            EtlError::SerializationError(_) => {
                "The API payload changed shape; re-run with --verbose to capture it"
            }
            EtlError::ZipError(_) => "Retry without archive output to write plain files",
            EtlError::DateParseError(_) => "Dates must use the YYYY-MM-DD format",
            EtlError::DivisionByZero { .. } => {
                "Narrow the date range to exclude periods with zero reported profits"
            }
            EtlError::NonFiniteValue { .. } => {
                "Narrow the date range to exclude the bad observation"
            }
            EtlError::ProcessingError { .. } => "Re-run with --verbose and inspect the logs",
            EtlError::MissingConfigError { .. } => "Add the missing field to the configuration",
            EtlError::InvalidConfigValueError { .. } | EtlError::ConfigValidationError { .. } => {
                "Fix the configuration value and re-run"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(e) => format!("Could not reach the FRED API: {}", e),
            EtlError::FredApiError { code, message } => {
                format!("FRED rejected the request ({}): {}", code, message)
            }
            EtlError::DivisionByZero { period } => format!(
                "Cannot compute an effective tax rate for {}: reported profits before tax are zero",
                period
            ),
            EtlError::MissingConfigError { field } => {
                format!("Configuration is missing '{}'", field)
            }
            EtlError::InvalidConfigValueError {
                field,
                value,
                reason,
            } => format!(
                "Configuration value '{}' is not valid for {}: {}",
                value, field, reason
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_by_zero_is_data_error() {
        let err = EtlError::DivisionByZero {
            period: "2020-04-01".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.to_string().contains("2020-04-01"));
    }

    #[test]
    fn test_fred_api_error_display() {
        let err = EtlError::FredApiError {
            code: 400,
            message: "Bad Request. Variable api_key is not registered.".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("400"));
    }

    #[test]
    fn test_config_errors_are_configuration_category() {
        let err = EtlError::MissingConfigError {
            field: "api_key".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
