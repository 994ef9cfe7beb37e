//! Log subscriber setup.
//!
//! Library crates log through `log`; the subscriber installed here also
//! receives those records.

use tracing_subscriber::EnvFilter;

/// The filter directive for the given verbosity flags.
///
/// `-q` wins over `-v`; with neither, `default` (the configured level) is used.
pub fn filter_directive(verbose: u8, quiet: bool, default: &str) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose {
        0 => default.to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the flags.
pub fn init(verbose: u8, quiet: bool, default: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose, quiet, default)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
