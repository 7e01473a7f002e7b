use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber. `log_level` seeds the filter
/// when `RUST_LOG` is unset; `log_format` switches between human-readable
/// text and newline-delimited JSON.
pub fn init(log_level: &str, log_format: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    if log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
