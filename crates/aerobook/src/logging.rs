//! Logging setup.
//!
//! Installs the `tracing` subscriber used by the `aerobook` binary. The
//! library itself only emits events; callers embedding it choose their own
//! subscriber.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much the binary should log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Info and above.
    #[default]
    Normal,
    /// Debug and above.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Map onto a tracing level.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Build from the CLI's `-q` / `-v` flags.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }
}

/// Filter used when `RUST_LOG` is unset: only this crate's events, at the
/// level `verbosity` asks for.
fn default_directive(verbosity: Verbosity) -> String {
    format!("{}={}", env!("CARGO_CRATE_NAME"), verbosity.to_level_filter())
}

/// Install the global subscriber for the `aerobook` binary.
///
/// Events go to stderr so JSON written to stdout stays parseable. A set
/// `RUST_LOG` replaces the filter derived from `verbosity`. Only the first
/// call installs anything.
///
/// # Examples
///
/// ```no_run
/// use aerobook::{init_logging, Verbosity};
///
/// // `-v` on the command line
/// init_logging(Verbosity::from_flags(false, 1));
/// tracing::debug!("opening booking database");
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    // Timestamps are left on; the thread and source location are noise for
    // a single-threaded CLI.
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity >= Verbosity::Verbose)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}

/// Quiet subscriber for unit tests.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
