use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct Engine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> Engine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    /// Runs read, compute and render once. The first error ends the run.
    pub async fn run(&self) -> Result<String> {
        tracing::info!("Reading habitat tables...");
        let counts = self.pipeline.extract().await?;
        tracing::info!(
            "Aggregated {} + {} species",
            counts.counts_a.len(),
            counts.counts_b.len()
        );
        self.monitor.log_phase("Extract");

        tracing::info!("Computing habitat splits...");
        let result = self.pipeline.transform(counts).await?;
        tracing::info!(
            "{} of {} species have observations to plot",
            result.plot.len(),
            result.normalized.len()
        );
        self.monitor.log_phase("Transform");

        tracing::info!("Rendering chart...");
        let output_path = self.pipeline.load(result).await?;
        self.monitor.log_phase("Load");
        self.monitor.log_final();

        Ok(output_path)
    }
}
