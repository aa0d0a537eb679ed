//! Development-time tracing for debugging the listing CLI.
//!
//! Tracing is diagnostics only: output goes to stderr and is controlled by
//! `RUST_LOG`. User-visible feedback (toasts, rendered steps) goes to stdout
//! through the notifier and the renderer.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Compact format on stderr.
///
/// # Example
/// ```bash
/// RUST_LOG=listing=debug listing wizard --user <id> --answers answers.toml
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
