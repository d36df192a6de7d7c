pub mod cli;
pub mod toml_config;

use crate::config::toml_config::TomlConfig;
use crate::core::ConfigProvider;
use crate::domain::model::{NormalizeMode, Orientation};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extension, validate_hex_color, validate_non_empty_string, validate_path,
    Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_LABEL_A: &str = "Agriculture";
pub const DEFAULT_LABEL_B: &str = "Forest";
pub const DEFAULT_COLOR_A: &str = "#8c6d31";
pub const DEFAULT_COLOR_B: &str = "#31a354";
pub const DEFAULT_OUTPUT_PATH: &str = "habitat_split.png";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "habitat-split")]
#[command(about = "Compare per-species observations between two habitats as a stacked bar chart")]
pub struct CliConfig {
    /// Observation table for habitat A (.csv, .xlsx, .xls, .xlsm, .xlsb, .ods)
    pub habitat_a: String,

    /// Observation table for habitat B
    pub habitat_b: String,

    /// TOML file with run settings; command-line flags take precedence
    #[arg(short, long)]
    pub config: Option<String>,

    /// Species identifier column [default: ID, then species]
    #[arg(long)]
    pub id_column: Option<String>,

    /// Sum this column per species instead of counting rows
    #[arg(long)]
    pub count_column: Option<String>,

    #[arg(long, help = "Display name of habitat A [default: Agriculture]")]
    pub label_a: Option<String>,

    #[arg(long, help = "Display name of habitat B [default: Forest]")]
    pub label_b: Option<String>,

    #[arg(long, help = "Bar color for habitat A as #RRGGBB")]
    pub color_a: Option<String>,

    #[arg(long, help = "Bar color for habitat B as #RRGGBB")]
    pub color_b: Option<String>,

    /// Chart destination, .png or .svg [default: habitat_split.png]
    #[arg(short, long)]
    pub output: Option<String>,

    /// raw splits counts directly; effort divides by each habitat's total first
    #[arg(long, value_enum)]
    pub mode: Option<NormalizeMode>,

    #[arg(long, value_enum)]
    pub orientation: Option<Orientation>,

    /// Also write the per-species table as CSV
    #[arg(long)]
    pub summary: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory use per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Layers command-line flags over the optional TOML settings.
    pub fn into_split_config(self, file: Option<&TomlConfig>) -> SplitConfig {
        let mut config = SplitConfig::new(self.habitat_a, self.habitat_b);
        if let Some(file) = file {
            config.apply_toml(file);
        }

        overwrite(&mut config.label_a, self.label_a);
        overwrite(&mut config.label_b, self.label_b);
        overwrite(&mut config.color_a, self.color_a);
        overwrite(&mut config.color_b, self.color_b);
        overwrite(&mut config.output_path, self.output);
        overwrite(&mut config.normalize_mode, self.mode);
        overwrite(&mut config.orientation, self.orientation);
        if self.id_column.is_some() {
            config.id_column = self.id_column;
        }
        if self.count_column.is_some() {
            config.count_column = self.count_column;
        }
        if self.summary.is_some() {
            config.summary_path = self.summary;
        }
        config
    }
}

fn overwrite<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// The resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitConfig {
    pub habitat_a: String,
    pub habitat_b: String,
    pub label_a: String,
    pub label_b: String,
    pub id_column: Option<String>,
    pub count_column: Option<String>,
    pub normalize_mode: NormalizeMode,
    pub color_a: String,
    pub color_b: String,
    pub orientation: Orientation,
    pub output_path: String,
    pub summary_path: Option<String>,
}

impl SplitConfig {
    pub fn new(habitat_a: impl Into<String>, habitat_b: impl Into<String>) -> Self {
        Self {
            habitat_a: habitat_a.into(),
            habitat_b: habitat_b.into(),
            label_a: DEFAULT_LABEL_A.to_string(),
            label_b: DEFAULT_LABEL_B.to_string(),
            id_column: None,
            count_column: None,
            normalize_mode: NormalizeMode::Raw,
            color_a: DEFAULT_COLOR_A.to_string(),
            color_b: DEFAULT_COLOR_B.to_string(),
            orientation: Orientation::Horizontal,
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            summary_path: None,
        }
    }

    pub fn apply_toml(&mut self, file: &TomlConfig) {
        let file = file.clone();
        overwrite(&mut self.label_a, file.habitats.label_a);
        overwrite(&mut self.label_b, file.habitats.label_b);
        overwrite(&mut self.color_a, file.plot.color_a);
        overwrite(&mut self.color_b, file.plot.color_b);
        overwrite(&mut self.output_path, file.plot.output_path);
        overwrite(&mut self.orientation, file.plot.orientation);
        overwrite(&mut self.normalize_mode, file.normalize.mode);
        if file.columns.id.is_some() {
            self.id_column = file.columns.id;
        }
        if file.columns.count.is_some() {
            self.count_column = file.columns.count;
        }
        if file.report.summary_path.is_some() {
            self.summary_path = file.report.summary_path;
        }
    }
}

impl Validate for SplitConfig {
    fn validate(&self) -> Result<()> {
        validate_path("habitat_a", &self.habitat_a)?;
        validate_path("habitat_b", &self.habitat_b)?;
        validate_non_empty_string("label_a", &self.label_a)?;
        validate_non_empty_string("label_b", &self.label_b)?;

        if let Some(column) = &self.id_column {
            validate_non_empty_string("id_column", column)?;
        }
        if let Some(column) = &self.count_column {
            validate_non_empty_string("count_column", column)?;
        }

        validate_hex_color("color_a", &self.color_a)?;
        validate_hex_color("color_b", &self.color_b)?;

        validate_path("output_path", &self.output_path)?;
        validate_file_extension("output_path", &self.output_path, &["png", "svg"])?;

        if let Some(summary) = &self.summary_path {
            validate_path("summary_path", summary)?;
            validate_file_extension("summary_path", summary, &["csv"])?;
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}

impl ConfigProvider for SplitConfig {
    fn habitat_a_path(&self) -> &str {
        &self.habitat_a
    }

    fn habitat_b_path(&self) -> &str {
        &self.habitat_b
    }

    fn label_a(&self) -> &str {
        &self.label_a
    }

    fn label_b(&self) -> &str {
        &self.label_b
    }

    fn id_column(&self) -> Option<&str> {
        self.id_column.as_deref()
    }

    fn count_column(&self) -> Option<&str> {
        self.count_column.as_deref()
    }

    fn normalize_mode(&self) -> NormalizeMode {
        self.normalize_mode
    }

    fn color_a(&self) -> &str {
        &self.color_a
    }

    fn color_b(&self) -> &str {
        &self.color_b
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn summary_path(&self) -> Option<&str> {
        self.summary_path.as_deref()
    }
}
