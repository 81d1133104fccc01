use crate::core::rate;
use crate::core::{ConfigProvider, Pipeline, RateReport, Series, SeriesSource, Storage};
use crate::domain::model::{
    AnnualRatePoint, RatePoint, SummaryStats, PROFITS_BEFORE_TAX_QUARTERLY,
    TAX_RECEIPTS_QUARTERLY,
};
use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use zip::write::{FileOptions, ZipWriter};

pub const ARCHIVE_FILENAME: &str = "corporate_tax_data.zip";

pub struct RatePipeline<S: Storage, C: ConfigProvider, F: SeriesSource> {
    storage: S,
    config: C,
    source: F,
}

impl<S: Storage, C: ConfigProvider, F: SeriesSource> RatePipeline<S, C, F> {
    pub fn new(storage: S, config: C, source: F) -> Self {
        Self {
            storage,
            config,
            source,
        }
    }

    /// The rate inputs plus any extra configured series, deduplicated,
    /// in a stable order.
    fn series_ids(&self) -> Vec<String> {
        let mut ids = vec![
            TAX_RECEIPTS_QUARTERLY.to_string(),
            PROFITS_BEFORE_TAX_QUARTERLY.to_string(),
        ];
        for id in self.config.extra_series() {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }
}

#[derive(Serialize)]
struct SummaryDocument {
    quarterly: Option<SummaryStats>,
    annual: Option<SummaryStats>,
}

fn quarterly_csv(points: &[RatePoint]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for point in points {
        writer.serialize(point)?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::ProcessingError {
            message: format!("CSV buffer error: {}", e),
        })
}

fn annual_csv(points: &[AnnualRatePoint]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for point in points {
        writer.serialize(point)?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::ProcessingError {
            message: format!("CSV buffer error: {}", e),
        })
}

fn series_csv(series: &Series) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["date", "value"])?;
    for (date, value) in &series.observations {
        writer.write_record([date.to_string(), value.to_string()])?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::ProcessingError {
            message: format!("CSV buffer error: {}", e),
        })
}

#[async_trait::async_trait]
impl<S, C, F> Pipeline for RatePipeline<S, C, F>
where
    S: Storage,
    C: ConfigProvider,
    F: SeriesSource + Clone + 'static,
{
    async fn extract(&self) -> Result<Vec<Series>> {
        let ids = self.series_ids();
        let limit = self.config.concurrent_requests().max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let start = self.config.start_date().to_string();
        let end = self.config.end_date().map(str::to_string);

        tracing::debug!(
            "Fetching {} series from {} (concurrency {})",
            ids.len(),
            start,
            limit
        );

        let mut tasks = JoinSet::new();
        for (idx, id) in ids.iter().cloned().enumerate() {
            let source = self.source.clone();
            let semaphore = Arc::clone(&semaphore);
            let start = start.clone();
            let end = end.clone();
            tasks.spawn(async move {
                let _permit =
                    semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| EtlError::ProcessingError {
                            message: "fetch semaphore closed".to_string(),
                        })?;
                let series = source.fetch_series(&id, Some(&start), end.as_deref()).await?;
                Ok::<(usize, Series), EtlError>((idx, series))
            });
        }

        let mut fetched: Vec<Option<Series>> = vec![None; ids.len()];
        while let Some(joined) = tasks.join_next().await {
            let (idx, series) = joined.map_err(|e| EtlError::ProcessingError {
                message: format!("fetch task failed: {}", e),
            })??;
            tracing::info!("Fetched {} ({} observations)", series.id, series.len());
            fetched[idx] = Some(series);
        }

        Ok(fetched.into_iter().flatten().collect())
    }

    async fn transform(&self, data: Vec<Series>) -> Result<RateReport> {
        let receipts = data
            .iter()
            .find(|s| s.id == TAX_RECEIPTS_QUARTERLY)
            .ok_or_else(|| EtlError::ProcessingError {
                message: format!("Missing series {}", TAX_RECEIPTS_QUARTERLY),
            })?;
        let profits = data
            .iter()
            .find(|s| s.id == PROFITS_BEFORE_TAX_QUARTERLY)
            .ok_or_else(|| EtlError::ProcessingError {
                message: format!("Missing series {}", PROFITS_BEFORE_TAX_QUARTERLY),
            })?;

        let quarterly = rate::compute_rate_series(receipts, profits, self.config.ma_window())?;
        let annual = rate::compute_annual_rates(receipts, profits)?;

        tracing::info!(
            "Computed {} quarterly and {} annual rate periods",
            quarterly.len(),
            annual.len()
        );

        let quarterly_summary = rate::summarize_quarterly(&quarterly);
        let annual_summary = rate::summarize_annual(&annual);

        Ok(RateReport {
            quarterly,
            annual,
            raw_series: data,
            quarterly_summary,
            annual_summary,
        })
    }

    async fn load(&self, report: RateReport) -> Result<String> {
        let mut files: Vec<(String, Vec<u8>)> = vec![
            (
                "effective_rate_quarterly.csv".to_string(),
                quarterly_csv(&report.quarterly)?,
            ),
            (
                "effective_rate_annual.csv".to_string(),
                annual_csv(&report.annual)?,
            ),
        ];
        for series in &report.raw_series {
            files.push((format!("series_{}.csv", series.id), series_csv(series)?));
        }
        files.push((
            "summary.json".to_string(),
            serde_json::to_vec_pretty(&SummaryDocument {
                quarterly: report.quarterly_summary,
                annual: report.annual_summary,
            })?,
        ));

        if self.config.archive_output() {
            tracing::debug!("Bundling {} files into {}", files.len(), ARCHIVE_FILENAME);
            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for (name, data) in &files {
                    zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
                    zip.write_all(data)?;
                }
                let cursor = zip.finish()?;
                cursor.into_inner()
            };
            self.storage.write_file(ARCHIVE_FILENAME, &zip_data).await?;
            Ok(format!(
                "{}/{}",
                self.config.output_path(),
                ARCHIVE_FILENAME
            ))
        } else {
            for (name, data) in &files {
                tracing::debug!("Writing {} ({} bytes)", name, data.len());
                self.storage.write_file(name, data).await?;
            }
            Ok(self.config.output_path().to_string())
        }
    }
}
