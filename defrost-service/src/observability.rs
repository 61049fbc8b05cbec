use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. `RUST_LOG` overrides the default filter.
///
/// Logs go to stderr so that a report printed on stdout stays clean.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("defrost_service=info,defrost_report=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
