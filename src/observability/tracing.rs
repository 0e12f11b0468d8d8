//! Log subscriber setup.
//!
//! Filtering comes from `IMPLMAP_LOG` using the usual `EnvFilter` syntax.
//! Without it the level follows the number of `-v` flags. Output goes to
//! stderr so JSON on stdout stays clean.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "IMPLMAP_LOG";

/// Default directive for a given verbosity.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(2), "debug");
        assert_eq!(default_directive(9), "trace");
    }
}
