//! Logging setup for filtra.
//!
//! The engine logs through `tracing`. Nothing is printed unless the host
//! installs a subscriber, either its own or the one [`init`] installs when
//! the `tracing-subscriber` feature is enabled.
//!
//! # Environment Variables
//!
//! - `FILTRA_DEBUG=true|1|yes` - enable debug logging and per-leaf traces
//! - `FILTRA_LOG_LEVEL=trace|debug|info|warn|error` - set the level explicitly
//! - `FILTRA_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! ```rust,no_run
//! use filtra_query::logging;
//!
//! logging::init();
//! // or
//! logging::init_with_level("trace");
//! ```

use std::env;
use std::fmt;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

static INIT: Once = Once::new();
static FILTER_LOGGING: AtomicBool = AtomicBool::new(false);

const DEBUG_VAR: &str = "FILTRA_DEBUG";
const LEVEL_VAR: &str = "FILTRA_LOG_LEVEL";
const FORMAT_VAR: &str = "FILTRA_LOG_FORMAT";

/// Output format of the built-in subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    /// Parse a format name; unknown names fall back to JSON.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        })
    }
}

/// Check if debug logging is enabled, either through `FILTRA_DEBUG` or
/// [`set_filter_logging`].
#[inline]
pub fn is_debug_enabled() -> bool {
    FILTER_LOGGING.load(Ordering::Relaxed)
        || env::var(DEBUG_VAR)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false)
}

/// Turn per-leaf filter tracing on or off regardless of `FILTRA_DEBUG`.
pub fn set_filter_logging(enabled: bool) {
    FILTER_LOGGING.store(enabled, Ordering::Relaxed);
}

/// The configured log level: `FILTRA_LOG_LEVEL` if valid, else `debug` when
/// debugging is enabled, else `warn`.
pub fn log_level() -> &'static str {
    let explicit = env::var(LEVEL_VAR).ok().and_then(|level| {
        match level.to_ascii_lowercase().as_str() {
            "trace" => Some("trace"),
            "debug" => Some("debug"),
            "info" => Some("info"),
            "warn" => Some("warn"),
            "error" => Some("error"),
            _ => None,
        }
    });
    match explicit {
        Some(level) => level,
        None if is_debug_enabled() => "debug",
        None => "warn",
    }
}

/// The configured output format from `FILTRA_LOG_FORMAT`.
pub fn log_format() -> LogFormat {
    env::var(FORMAT_VAR)
        .map(|f| LogFormat::from_name(&f))
        .unwrap_or_default()
}

/// Install the filtra subscriber. Subsequent calls are no-ops.
///
/// Does nothing unless `FILTRA_DEBUG` or `FILTRA_LOG_LEVEL` is set, or the
/// `tracing-subscriber` feature is disabled.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = log_level();
            let filter = EnvFilter::try_new(format!(
                "filtra={level},filtra_query={level},filtra_schema={level}"
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let format = log_format();
            let registry = tracing_subscriber::registry().with(filter);
            let installed = match format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level, format = %format, "filtra logging initialized");
            }
        }
    });
}

/// Initialize logging at `level`.
///
/// # Safety
///
/// Sets `FILTRA_LOG_LEVEL`, which is unsound while other threads read the
/// environment. Call this at startup before spawning threads.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as startup-only.
    unsafe {
        env::set_var(LEVEL_VAR, level);
    }
    init();
}

/// Initialize debug logging; equivalent to `FILTRA_DEBUG=true` plus [`init`].
///
/// # Safety
///
/// Same constraint as [`init_with_level`].
pub fn init_debug() {
    // SAFETY: documented as startup-only.
    unsafe {
        env::set_var(DEBUG_VAR, "true");
    }
    init();
}

/// Debug event emitted only while debug logging is enabled.
#[macro_export]
macro_rules! filtra_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            $crate::__tracing::debug!($($arg)*);
        }
    };
}

/// Trace event emitted only while debug logging is enabled.
#[macro_export]
macro_rules! filtra_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            $crate::__tracing::trace!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_names() {
        assert_eq!(LogFormat::from_name("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_name("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::from_name("xml"), LogFormat::Json);
        assert_eq!(LogFormat::default().to_string(), "json");
    }

    #[test]
    fn test_filter_logging_override() {
        set_filter_logging(true);
        assert!(is_debug_enabled());
        set_filter_logging(false);
    }
}
