//! Logging setup for the command line.
//!
//! Logs go to stderr so the JSON report on stdout stays clean. Set
//! `DEBUG_LOGGING=1` to enable debug output for the aegis crates.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize stderr logging.
///
/// `RUST_LOG` takes precedence over the built-in directives when set.
pub fn init() {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let filter_directive = if debug_logging {
        // DEBUG_LOGGING=1: debug for aegis crates, warn for dependencies
        "warn,aegis=debug,aegis_core=debug"
    } else {
        "warn,aegis=info,aegis_core=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .init();

    tracing::debug!(debug_logging, "aegis logging initialized");
}
