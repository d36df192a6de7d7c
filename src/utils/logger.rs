use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset. Dependencies stay at `warn` so
/// plotters and calamine do not flood the progress lines.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "warn,habitat_split=debug"
    } else {
        "warn,habitat_split=info"
    }
}

fn run_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Progress lines on stderr for interactive runs.
pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(run_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .init();
}

/// One JSON object per event, for batch runs whose stderr is collected.
pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(run_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json()
                .flatten_event(true),
        )
        .init();
}
