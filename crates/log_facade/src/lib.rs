//! `log_facade` hands out consistently configured structured loggers, so that CLI tools and
//! server processes don't each re-implement format, level and destination policy.
//!
//! It offers:
//! - A declarative factory ([`build`], [`build_handler`]) that turns a list of
//!   [`LoggerOption`]s into a ready-to-use [`Logger`] or its emitting [`Handler`].
//! - A [`LevelVar`] that changes the threshold of already-built loggers.
//! - A process-wide [`GlobalLogger`] configured from the `UNSTRUCTURED_LOGS` environment toggle
//!   and a [`DebugProvider`], with convenience functions ([`global::info`], [`global::warn_kv`],
//!   ...) that always reach the most recently installed logger.
//! - [`tracing_subscriber::Layer`] implementations ([`Handler`], [`GlobalLayer`]) for hosts that
//!   log through the [`tracing`] macros.
//!
//! # Example
//!
//! ```
//! use log_facade::{Format, Level, fields, with_format, with_level, with_output};
//!
//! let logger = log_facade::build([
//!     with_format(Format::Text),
//!     with_level(Level::Debug),
//!     with_output(std::io::sink),
//! ]);
//!
//! logger.debug("cache warmed");
//! logger.info_kv("request served", fields!("status" => 200, "path" => "/health"));
//! logger.warn_fmt(format_args!("{} retries left", 2));
//! ```

mod factory;
mod format;
pub mod global;
mod handler;
mod level;
mod logger;

pub use self::{
    factory::{
        FatalHook, LoggerConfig, LoggerOption, build, build_handler, with_caller, with_color,
        with_development, with_fatal_hook, with_format, with_level, with_output, with_stacktrace,
        with_time_format,
    },
    format::{Format, TimeFormat},
    global::{DebugProvider, EnvironmentReader, GlobalLayer, GlobalLogger, NoDebug, ProcessEnvironment},
    handler::{Caller, Field, Handler, Record},
    level::{Level, LevelSetting, LevelVar, ParseLevelError},
    logger::Logger,
};

mod keys {
    pub(crate) const TIME: &str = "time";
    pub(crate) const LEVEL: &str = "level";
    pub(crate) const MESSAGE: &str = "msg";
    pub(crate) const CALLER: &str = "caller";
    pub(crate) const STACKTRACE: &str = "stacktrace";

    /// Name of the field that carries the message of a `tracing` event.
    pub(crate) const TRACING_MESSAGE: &str = "message";
}

/// Errors that can occur while emitting a record.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Represents a failure to write to the output destination.
    #[error("Failed to write log record: {0}")]
    Io(#[from] std::io::Error),

    /// Represents an error during JSON serialization.
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// Represents an error while rendering the record timestamp.
    #[error("Failed to format timestamp: {0}")]
    TimestampFormat(#[from] time::error::Format),

    /// Represents an error while normalizing the record timestamp.
    #[error("Failed to normalize timestamp: {0}")]
    TimestampComponent(#[from] time::error::ComponentRange),
}

/// Builds a `Vec<Field>` from `key => value` pairs.
///
/// Keys convert into [`String`] and values into [`serde_json::Value`].
///
/// ```
/// let fields = log_facade::fields!("user" => "alice", "attempt" => 3, "admin" => false);
/// assert_eq!(fields.len(), 3);
/// assert_eq!(fields[1].key, "attempt");
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        ::std::vec::Vec::<$crate::Field>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Field::new($key, $value)),+]
    };
}
