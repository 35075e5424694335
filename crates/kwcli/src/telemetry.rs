use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber filtered by `log_level`.
///
/// `log_level` is a full filter directive; `RUST_LOG` has already been
/// folded into it by the config loader. Stdout stays reserved for results.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
