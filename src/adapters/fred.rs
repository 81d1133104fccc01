use crate::domain::model::Series;
use crate::domain::ports::SeriesSource;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// FRED observations endpoint. Other FRED endpoints are out of scope.
pub const DEFAULT_BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";

/// Client for the FRED `series/observations` endpoint.
///
/// FRED allows 120 requests per minute per API key; backoff is the caller's
/// responsibility, so keep the pipeline's concurrency cap modest.
#[derive(Debug, Clone)]
pub struct FredClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<RawObservation>,
}

// FRED sends both fields as strings; "." marks a missing observation.
#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct FredErrorBody {
    error_code: u32,
    error_message: String,
}

impl FredClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SeriesSource for FredClient {
    async fn fetch_series(
        &self,
        series_id: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Series> {
        let mut params: Vec<(&str, &str)> = vec![
            ("series_id", series_id),
            ("api_key", &self.api_key),
            ("file_type", "json"),
            ("sort_order", "asc"),
        ];
        if let Some(start) = start_date {
            params.push(("observation_start", start));
        }
        if let Some(end) = end_date {
            params.push(("observation_end", end));
        }

        tracing::debug!("Fetching FRED series {}", series_id);
        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("FRED response status for {}: {}", series_id, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<FredErrorBody>(&body) {
                return Err(EtlError::FredApiError {
                    code: err.error_code,
                    message: err.error_message,
                });
            }
            return Err(EtlError::ProcessingError {
                message: format!("FRED returned HTTP {} for series {}", status, series_id),
            });
        }

        let payload: ObservationsResponse = response.json().await?;

        let mut series = Series::new(series_id);
        for obs in payload.observations {
            // "." is FRED's missing-value marker
            if obs.value == "." {
                continue;
            }
            let value: f64 = match obs.value.parse() {
                Ok(v) => v,
                Err(_) => {
                    tracing::warn!(
                        "Dropping unparseable value '{}' for {} at {}",
                        obs.value,
                        series_id,
                        obs.date
                    );
                    continue;
                }
            };
            let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")?;
            series.insert(date, value);
        }

        tracing::debug!("Series {}: {} observations", series_id, series.len());
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_series_sends_fred_query_params() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/fred/series/observations")
                .query_param("series_id", "FCTAX")
                .query_param("api_key", "testkey")
                .query_param("file_type", "json")
                .query_param("sort_order", "asc")
                .query_param("observation_start", "1950-01-01");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "observations": [
                        {"date": "1950-01-01", "value": "17.9"},
                        {"date": "1951-01-01", "value": "22.6"}
                    ]
                }));
        });

        let client = FredClient::new(server.url("/fred/series/observations"), "testkey");
        let series = client
            .fetch_series("FCTAX", Some("1950-01-01"), None)
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(series.id, "FCTAX");
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.get(NaiveDate::from_ymd_opt(1950, 1, 1).unwrap()),
            Some(17.9)
        );
    }

    #[tokio::test]
    async fn test_fetch_series_drops_missing_values() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/obs");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "observations": [
                        {"date": "2020-01-01", "value": "10.5"},
                        {"date": "2020-04-01", "value": "."},
                        {"date": "2020-07-01", "value": "garbage"},
                        {"date": "2020-10-01", "value": "12.0"}
                    ]
                }));
        });

        let client = FredClient::new(server.url("/obs"), "testkey");
        let series = client.fetch_series("CP", None, None).await.unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(
            series.get(NaiveDate::from_ymd_opt(2020, 4, 1).unwrap()),
            None
        );
        assert_eq!(
            series.get(NaiveDate::from_ymd_opt(2020, 7, 1).unwrap()),
            None
        );
    }

    #[tokio::test]
    async fn test_fetch_series_decodes_fred_error_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/obs");
            then.status(400)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "error_code": 400,
                    "error_message": "Bad Request. The value for variable api_key is not registered."
                }));
        });

        let client = FredClient::new(server.url("/obs"), "badkey");
        let err = client.fetch_series("FCTAX", None, None).await.unwrap_err();

        match err {
            EtlError::FredApiError { code, message } => {
                assert_eq!(code, 400);
                assert!(message.contains("api_key"));
            }
            other => panic!("expected FredApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_series_plain_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/obs");
            then.status(500).body("internal error");
        });

        let client = FredClient::new(server.url("/obs"), "testkey");
        let err = client.fetch_series("FCTAX", None, None).await.unwrap_err();

        assert!(matches!(err, EtlError::ProcessingError { .. }));
    }

    #[tokio::test]
    async fn test_fetch_series_empty_observations() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/obs");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({ "observations": [] }));
        });

        let client = FredClient::new(server.url("/obs"), "testkey");
        let series = client.fetch_series("FCTAX", None, None).await.unwrap();
        assert!(series.is_empty());
    }
}
