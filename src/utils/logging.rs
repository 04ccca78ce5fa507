// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at `debug` when
/// `verbose` is on and `info` when it isn't, with dependencies held at `warn`.
pub fn setup_logging(verbose: bool) {
    let fallback = if verbose {
        "warn,filing_normalizer=debug"
    } else {
        "warn,filing_normalizer=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // Progress lines go to stderr so a piped stdout stays clean.
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Logging setup complete (verbose: {}).", verbose);
}
