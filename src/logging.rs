//! `tracing` subscriber setup for the `senti` binary.
//!
//! Diagnostics go to stderr so stdout stays reserved for model listings,
//! tool output and the classification table.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Fallback directive when the configured filter cannot be parsed.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber using `directive` as the filter.
///
/// An unparsable directive falls back to [`DEFAULT_DIRECTIVE`]. Calling this
/// more than once is harmless; later calls leave the first subscriber in
/// place.
pub fn init(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("Warning: invalid log filter \"{directive}\" ({e}), using \"{DEFAULT_DIRECTIVE}\"");
        EnvFilter::new(DEFAULT_DIRECTIVE)
    });
    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
    {
        tracing::debug!(error = %err, "subscriber already installed, keeping it");
    }
}
