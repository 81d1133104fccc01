use crate::domain::model::{RateReport, Series};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn api_key(&self) -> &str;
    fn start_date(&self) -> &str;
    fn end_date(&self) -> Option<&str>;
    /// Extra series ids fetched and exported alongside the rate inputs.
    fn extra_series(&self) -> &[String];
    fn concurrent_requests(&self) -> usize;
    fn ma_window(&self) -> usize;
    fn output_path(&self) -> &str;
    fn archive_output(&self) -> bool;
}

/// Seam between the pipeline and the FRED HTTP client so tests can
/// substitute a canned source.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch_series(
        &self,
        series_id: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Series>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Series>>;
    async fn transform(&self, data: Vec<Series>) -> Result<RateReport>;
    async fn load(&self, report: RateReport) -> Result<String>;
}
