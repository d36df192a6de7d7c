pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig, SplitConfig};

pub use core::{etl::Engine, pipeline::HabitatPipeline};
pub use utils::error::{Result, SplitError};
