use crate::core::normalize::{normalize, HabitatTotals};
use crate::core::render::{parse_hex_color, render_chart, ChartStyle, OutputFormat};
use crate::core::{aggregate, loader, merge, report};
use crate::core::{ConfigProvider, HabitatCounts, Pipeline, PlotSpec, Storage, TransformResult};
use crate::domain::model::{NormalizeMode, SpeciesCounts};
use crate::utils::error::Result;

pub struct HabitatPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> HabitatPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    async fn load_counts(&self, path: &str, label: &str) -> Result<SpeciesCounts> {
        let format = loader::detect_format(path)?;
        tracing::info!("Reading {} observations from {}", label, path);

        let bytes = self.storage.read_file(path).await?;
        let table = loader::parse_table(path, format, bytes)?;
        let id_column = loader::resolve_id_column(&table, self.config.id_column())?;
        tracing::info!("{}: {} rows (id column '{}')", label, table.len(), id_column);

        aggregate::aggregate(&table, &id_column, self.config.count_column())
    }

    fn chart_style(&self) -> Result<ChartStyle> {
        let mode = match self.config.normalize_mode() {
            NormalizeMode::Raw => "observations",
            NormalizeMode::Effort => "effort-normalized observations",
        };
        Ok(ChartStyle {
            title: format!(
                "Share of {} per species: {} vs {}",
                mode,
                self.config.label_a(),
                self.config.label_b()
            ),
            label_a: self.config.label_a().to_string(),
            label_b: self.config.label_b().to_string(),
            color_a: parse_hex_color(self.config.color_a())?,
            color_b: parse_hex_color(self.config.color_b())?,
            orientation: self.config.orientation(),
        })
    }

    /// Writes the outputs in order. If one write fails, the ones already
    /// written are removed so a failed run leaves nothing behind.
    async fn write_outputs(&self, outputs: &[(&str, &[u8])]) -> Result<()> {
        for (i, (path, data)) in outputs.iter().enumerate() {
            tracing::debug!("Writing {} bytes to {}", data.len(), path);
            if let Err(e) = self.storage.write_file(path, data).await {
                for (written, _) in &outputs[..i] {
                    if let Err(cleanup) = self.storage.remove_file(written).await {
                        tracing::warn!("Could not remove {}: {}", written, cleanup);
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for HabitatPipeline<S, C> {
    async fn extract(&self) -> Result<HabitatCounts> {
        let counts_a = self
            .load_counts(self.config.habitat_a_path(), self.config.label_a())
            .await?;
        let counts_b = self
            .load_counts(self.config.habitat_b_path(), self.config.label_b())
            .await?;

        Ok(HabitatCounts { counts_a, counts_b })
    }

    async fn transform(&self, counts: HabitatCounts) -> Result<TransformResult> {
        let merged = merge::merge(&counts.counts_a, &counts.counts_b);
        let totals = HabitatTotals::of(&merged);
        tracing::info!(
            "Totals: {} = {}, {} = {} across {} species",
            self.config.label_a(),
            totals.total_a,
            self.config.label_b(),
            totals.total_b,
            merged.len()
        );

        let normalized = normalize(&merged, self.config.normalize_mode());
        let plot = PlotSpec::from_normalized(&normalized);
        let excluded = normalized.len() - plot.len();
        if excluded > 0 {
            tracing::warn!("{} species with no observations left out of the chart", excluded);
        }

        println!(
            "{}",
            report::format_table(&normalized, self.config.label_a(), self.config.label_b())
        );

        Ok(TransformResult {
            merged,
            normalized,
            plot,
            total_a: totals.total_a,
            total_b: totals.total_b,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_path = self.config.output_path();
        let format = OutputFormat::from_path(output_path)?;
        let style = self.chart_style()?;

        if result.plot.is_empty() {
            tracing::warn!("No species with observations; the chart will be empty");
        }

        // Everything is rendered before the first byte is written.
        let chart = render_chart(&result.plot, &style, format)?;
        let summary = match self.config.summary_path() {
            Some(path) => Some((path, report::summary_csv(&result.normalized)?)),
            None => None,
        };

        let mut outputs: Vec<(&str, &[u8])> = vec![(output_path, chart.as_slice())];
        if let Some((path, data)) = &summary {
            outputs.push((*path, data.as_slice()));
        }
        self.write_outputs(&outputs).await?;

        if let Some((path, _)) = summary {
            tracing::info!("Summary table saved to {}", path);
        }
        Ok(output_path.to_string())
    }
}
