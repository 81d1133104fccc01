use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting effective tax rate ETL");

        tracing::info!("Extracting series...");
        let raw_series = self.pipeline.extract().await?;
        tracing::info!("Extracted {} series", raw_series.len());
        self.monitor.log_stats("Extract");

        tracing::info!("Computing rate tables...");
        let report = self.pipeline.transform(raw_series).await?;
        tracing::info!(
            "Transformed into {} quarterly / {} annual periods",
            report.quarterly.len(),
            report.annual.len()
        );
        self.monitor.log_stats("Transform");

        tracing::info!("Writing output...");
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
