//! Structured logging to stderr.
//!
//! Stdout is reserved for compiled templates, so every layer writes to stderr.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber with either JSON or pretty format,
/// respecting the configured log level unless `RUST_LOG` is set.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .pretty()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// A service file is about to be compiled.
    pub const COMPILE_STARTED: &str = "compile_started";

    /// Compilation succeeded.
    pub const COMPILE_FINISHED: &str = "compile_finished";

    /// Event validation succeeded (`validate` subcommand).
    pub const VALIDATION_FINISHED: &str = "validation_finished";

    /// A non-fatal problem in the service configuration.
    pub const CONFIG_WARNING: &str = "config_warning";

    /// The compiled template has been written out.
    pub const TEMPLATE_WRITTEN: &str = "template_written";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_compile_started {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::COMPILE_STARTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_compile_finished {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::COMPILE_FINISHED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_validation_finished {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::VALIDATION_FINISHED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_config_warning {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::CONFIG_WARNING,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_template_written {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::TEMPLATE_WRITTEN,
            $($field)*
        )
    };
}
