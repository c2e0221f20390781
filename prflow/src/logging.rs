//! Diagnostic tracing for prflow.
//!
//! Library code only emits `tracing` events. The subscriber is configured
//! once, by the binary, from a plain [`LogOptions`] value. Output goes to
//! stderr so stdout stays clean for command output and `--json`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// How the subscriber should be set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Filter used when `RUST_LOG` is unset or ignored (e.g. `warn`, `prflow=debug`).
    pub default_filter: String,
    /// Let `RUST_LOG` override `default_filter`.
    pub respect_env: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_filter: "warn".to_string(),
            respect_env: true,
        }
    }
}

impl LogOptions {
    /// Map `-v` / `-q` counts to a filter: quiet wins, each `-v` adds a level.
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let default_filter = if quiet {
            "error"
        } else {
            match verbose {
                0 => "warn",
                1 => "prflow=info",
                2 => "prflow=debug",
                _ => "trace",
            }
        };
        Self {
            default_filter: default_filter.to_string(),
            respect_env: verbose == 0 && !quiet,
        }
    }

    fn filter(&self) -> EnvFilter {
        if !self.respect_env {
            return EnvFilter::new(&self.default_filter);
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Install the stderr subscriber. Call once, from `main`.
///
/// # Example
/// ```bash
/// RUST_LOG=prflow=debug prflow status
/// ```
pub fn init(options: &LogOptions) {
    tracing_subscriber::registry()
        .with(options.filter())
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_filters() {
        assert_eq!(LogOptions::from_verbosity(0, false), LogOptions::default());
        assert_eq!(
            LogOptions::from_verbosity(2, false).default_filter,
            "prflow=debug"
        );
        let quiet = LogOptions::from_verbosity(3, true);
        assert_eq!(quiet.default_filter, "error");
        assert!(!quiet.respect_env);
    }
}
