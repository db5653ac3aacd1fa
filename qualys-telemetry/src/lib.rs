//! Observability utilities for the Qualys tool server.
//!
//! Standard output carries the protocol stream, so every log line goes to
//! standard error.

#![warn(missing_docs, clippy::pedantic)]

pub mod tracing_support {
    //! Structured tracing helpers.

    use tracing_subscriber::EnvFilter;

    /// Filter applied when `RUST_LOG` is unset or unparsable.
    pub const DEFAULT_FILTER: &str = "info";

    /// Builds the filter from `RUST_LOG`, falling back to `default`.
    #[must_use]
    pub fn env_filter(default: &str) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    }

    /// Installs the global `fmt` subscriber writing to stderr.
    ///
    /// Returns `false` when a global subscriber was already installed, which
    /// makes repeated calls harmless.
    pub fn init() -> bool {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter(DEFAULT_FILTER))
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(false)
            .try_init()
            .is_ok()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn repeated_init_is_harmless() {
            let _ = init();
            assert!(!init());
        }
    }
}

pub use tracing_support::init;
