use crate::domain::model::{NormalizeMode, Orientation};
use crate::utils::error::{Result, SplitError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional run settings file. Every table and key may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub habitats: HabitatsConfig,
    pub columns: ColumnsConfig,
    pub normalize: NormalizeConfig,
    pub plot: PlotConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HabitatsConfig {
    pub label_a: Option<String>,
    pub label_b: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnsConfig {
    pub id: Option<String>,
    pub count: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeConfig {
    pub mode: Option<NormalizeMode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    pub color_a: Option<String>,
    pub color_b: Option<String>,
    pub output_path: Option<String>,
    pub orientation: Option<Orientation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub summary_path: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SplitError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => SplitError::Io(e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SplitError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SplitError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r##"
[habitats]
label_a = "Farmland"
label_b = "Woodland"

[columns]
id = "taxon"
count = "n"

[normalize]
mode = "effort"

[plot]
color_a = "#aa0000"
color_b = "#00aa00"
output_path = "out/split.svg"
orientation = "vertical"

[report]
summary_path = "out/split.csv"
"##;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.habitats.label_a.as_deref(), Some("Farmland"));
        assert_eq!(config.columns.id.as_deref(), Some("taxon"));
        assert_eq!(config.columns.count.as_deref(), Some("n"));
        assert_eq!(config.normalize.mode, Some(NormalizeMode::Effort));
        assert_eq!(config.plot.orientation, Some(Orientation::Vertical));
        assert_eq!(config.report.summary_path.as_deref(), Some("out/split.csv"));
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.columns.id.is_none());
        assert!(config.normalize.mode.is_none());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = TomlConfig::from_toml_str("[plot]\ncolour_a = \"#000000\"\n");
        assert!(matches!(result, Err(SplitError::ConfigError { .. })));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result = TomlConfig::from_toml_str("[normalize]\nmode = \"log\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("HABITAT_SPLIT_TEST_OUTPUT", "from-env.png");

        let config = TomlConfig::from_toml_str(
            "[plot]\noutput_path = \"${HABITAT_SPLIT_TEST_OUTPUT}\"\n",
        )
        .unwrap();
        assert_eq!(config.plot.output_path.as_deref(), Some("from-env.png"));

        std::env::remove_var("HABITAT_SPLIT_TEST_OUTPUT");
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[habitats]\nlabel_a = \"Meadow\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.habitats.label_a.as_deref(), Some("Meadow"));
    }

    #[test]
    fn test_config_file_missing() {
        assert!(matches!(
            TomlConfig::from_file("/definitely/not/here.toml"),
            Err(SplitError::FileNotFound { .. })
        ));
    }
}
