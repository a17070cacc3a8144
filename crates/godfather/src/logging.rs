//! Log output for binaries built on this crate.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `default_directive` applies (for
/// example `"warn"` or `"godfather=debug"`). Calling it twice is harmless:
/// the second install is ignored.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    if installed.is_err() {
        tracing::debug!("a tracing subscriber was already installed");
    }
}
