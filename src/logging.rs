//! Browser console logging
//!
//! Routes `tracing` events to the browser console.

use std::sync::Once;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use tracing_web::MakeWebConsoleWriter;

static INIT: Once = Once::new();

/// Install the console subscriber.
///
/// Call once at application startup; later calls have no effect.
///
/// # Arguments
///
/// * `level` - Filter directive (e.g., "debug", "info", "yew_course_checkout=trace")
pub fn init_logging(level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

        // No wall clock in wasm32-unknown-unknown; the console stamps entries itself.
        let console = fmt::layer()
            .with_ansi(false)
            .without_time()
            .with_writer(MakeWebConsoleWriter::new());

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .try_init();
    });
}

/// Initialize logging with default "info" level
pub fn init_default_logging() {
    init_logging("info");
}
