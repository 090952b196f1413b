//! Structured Logging Configuration
//!
//! Installs a `tracing-subscriber` registry for SubLedger processes:
//! - JSON output for log aggregation (`LOG_FORMAT=json`)
//! - Human-readable output for development (default)
//!
//! # Usage
//!
//! ```rust,ignore
//! use sl_common::logging::init_logging;
//!
//! fn main() {
//!     init_logging("sl-dev");
//!     tracing::info!(subscription_id = 1, "Subscription signed");
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: "json" or "text". Overrides the configured format.
//! - `RUST_LOG`: standard level filter, e.g. `RUST_LOG=sl_registry=debug`.
//!   Falls back to the configured default level.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Parse a format name. Anything other than "json" is text.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Defaults applied when the environment does not say otherwise.
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub default_level: String,
    pub format: LogFormat,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LogOptions {
    /// Apply `LOG_FORMAT` on top of these options.
    fn resolve_format(&self) -> LogFormat {
        match std::env::var("LOG_FORMAT") {
            Ok(val) if !val.trim().is_empty() => LogFormat::parse(&val),
            _ => self.format,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.default_level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize logging with the default options.
pub fn init_logging(service_name: &str) {
    init_logging_with(service_name, &LogOptions::default());
}

/// Initialize logging with explicit defaults (usually taken from config).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging_with(service_name: &str, options: &LogOptions) {
    let env_filter = options.env_filter();

    let installed = match options.resolve_format() {
        LogFormat::Json => init_json_logging(env_filter),
        LogFormat::Text => init_text_logging(env_filter),
    };

    if installed {
        tracing::debug!(service = service_name, "Logging initialized");
    }
}

fn init_json_logging(env_filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .flatten_event(true)
                .with_span_events(FmtSpan::CLOSE),
        )
        .try_init()
        .is_ok()
}

fn init_text_logging(env_filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(true),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
    }

    #[test]
    fn test_invalid_default_level_falls_back() {
        let options = LogOptions {
            default_level: "not a [valid filter".to_string(),
            format: LogFormat::Text,
        };
        // Must not panic whatever RUST_LOG holds
        drop(options.env_filter());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging("sl-common-test");
        init_logging("sl-common-test");
    }
}
