//! Logging setup

use crate::commands::LogFormat;
use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity
#[must_use]
pub const fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber on stderr.
///
/// `RUST_LOG` overrides the verbosity flags. Returns `false` when a
/// subscriber was already installed, which leaves that one in place.
pub fn init_logging(verbose: u8, quiet: bool, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(verbose, quiet)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}
