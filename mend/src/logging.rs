//! Development-time tracing for debugging mend.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Off by default, not part of mend product output.
//!
//! - **Operator output (`ui`)**: Install banners, failure notices, and
//!   dependency reports. Always shown, unaffected by `RUST_LOG`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format, so it never mixes with a wrapped
/// command's stdout.
///
/// # Example
/// ```bash
/// RUST_LOG=mend=debug cargo run -- run -- make build
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
