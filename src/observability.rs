//! Tracing subscriber setup for embedders and binaries

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// Filtering follows `RUST_LOG`, defaulting to `info`. With `json` set the
/// output is structured for log shippers; otherwise it is compact
/// human-readable text. Calling this twice is harmless.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .try_init();
    }
}
