use clap::Parser;
use habitat_split::utils::{logger, validation::Validate};
use habitat_split::{CliConfig, Engine, HabitatPipeline, LocalStorage, SplitError, TomlConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = match CliConfig::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let err = SplitError::from(e);
            eprintln!("{}", err.user_friendly_message());
            eprintln!("hint: {}", err.recovery_suggestion());
            std::process::exit(err.exit_code());
        }
        Err(e) => {
            // --help and --version
            e.exit();
        }
    };

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let file_config = match cli.config.as_deref().map(TomlConfig::from_file).transpose() {
        Ok(file_config) => file_config,
        Err(e) => fail(e),
    };
    if let Some(path) = &cli.config {
        tracing::info!("Loaded settings from {}", path);
    }

    let monitor_enabled = cli.monitor;
    let config = cli.into_split_config(file_config.as_ref());
    if let Err(e) = config.validate() {
        fail(e);
    }

    let storage = LocalStorage::default();
    let pipeline = HabitatPipeline::new(storage, config);
    let engine = Engine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("Chart saved to {}", output_path);
            println!("Chart saved to: {}", output_path);
            Ok(())
        }
        Err(e) => fail(e),
    }
}

fn fail(e: SplitError) -> ! {
    tracing::error!("Run failed: {}", e);
    eprintln!("error: {}", e.user_friendly_message());
    eprintln!("hint: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}
