//! Declarative construction of loggers and handlers from a list of [`LoggerOption`]s.

use std::fmt;

use tracing_subscriber::fmt::{MakeWriter, writer::BoxMakeWriter};

use crate::{Format, Handler, Level, LevelSetting, Logger, TimeFormat};

/// Action taken after a [`Level::Fatal`] record has been written.
///
/// The hook receives the rendered message and must not return.
pub type FatalHook = fn(&str) -> !;

fn exit_process(_message: &str) -> ! {
    std::process::exit(1)
}

/// Resolved configuration for a [`Logger`] or [`Handler`].
///
/// The configuration is only used during construction and is not retained afterwards. It is
/// usually assembled by applying [`LoggerOption`]s to [`LoggerConfig::default`]; the defaults
/// are JSON output, [`Level::Info`] and the process's standard error stream.
pub struct LoggerConfig {
    /// Encoding of emitted records.
    pub format: Format,

    /// Minimum level of emitted records.
    pub level: LevelSetting,

    /// Destination of emitted records.
    pub output: BoxMakeWriter,

    /// Textual profile of the `time` attribute.
    pub time_format: TimeFormat,

    /// Whether text output colors the level label.
    pub color: bool,

    /// Whether records carry the `caller` attribute.
    pub caller: bool,

    /// Level at and above which records carry a `stacktrace` attribute. If `None`, no stack
    /// traces are captured.
    pub stacktrace: Option<Level>,

    /// If `true`, [`Level::DPanic`] records panic after being written.
    pub development: bool,

    /// Action taken after a [`Level::Fatal`] record has been written.
    pub fatal_hook: FatalHook,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: Format::default(),
            level: LevelSetting::default(),
            output: BoxMakeWriter::new(std::io::stderr),
            time_format: TimeFormat::default(),
            color: false,
            caller: false,
            stacktrace: None,
            development: false,
            fatal_hook: exit_process,
        }
    }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("time_format", &self.time_format)
            .field("color", &self.color)
            .field("caller", &self.caller)
            .field("stacktrace", &self.stacktrace)
            .field("development", &self.development)
            .finish_non_exhaustive()
    }
}

impl LoggerConfig {
    /// Applies `options` in order. An option overrides whatever earlier options set for the same
    /// field.
    pub fn apply(mut self, options: impl IntoIterator<Item = LoggerOption>) -> Self {
        for option in options {
            (option.0)(&mut self);
        }
        self
    }

    /// Builds a [`Handler`] from this configuration.
    pub fn into_handler(self) -> Handler {
        Handler::new(self)
    }

    /// Builds a [`Logger`] from this configuration.
    pub fn into_logger(self) -> Logger {
        let development = self.development;
        let fatal_hook = self.fatal_hook;
        Logger::new(Handler::new(self), development, fatal_hook)
    }
}

/// A single configuration step applied to a [`LoggerConfig`].
pub struct LoggerOption(Box<dyn FnOnce(&mut LoggerConfig) + Send>);

impl LoggerOption {
    /// Creates an option from an arbitrary configuration step.
    ///
    /// ```
    /// use log_facade::{Format, LoggerOption};
    ///
    /// let text_without_color = LoggerOption::new(|config| {
    ///     config.format = Format::Text;
    ///     config.color = false;
    /// });
    /// let _logger = log_facade::build([text_without_color]);
    /// ```
    pub fn new(apply: impl FnOnce(&mut LoggerConfig) + Send + 'static) -> Self {
        Self(Box::new(apply))
    }
}

impl fmt::Debug for LoggerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerOption").finish_non_exhaustive()
    }
}

/// Selects the encoding of emitted records.
pub fn with_format(format: Format) -> LoggerOption {
    LoggerOption::new(move |config| config.format = format)
}

/// Sets the minimum level, either fixed or shared through a [`LevelVar`][crate::LevelVar].
pub fn with_level(level: impl Into<LevelSetting>) -> LoggerOption {
    let level = level.into();
    LoggerOption::new(move |config| config.level = level)
}

/// Redirects emitted records to `output`.
///
/// Each record is handed to a writer obtained from `output` in a single `write_all` call, so
/// records from concurrent emitters don't interleave as long as the writer itself is atomic
/// per call (as with [`std::io::Stderr`] or a [`std::sync::Mutex`]-guarded writer).
pub fn with_output<W>(output: W) -> LoggerOption
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let output = BoxMakeWriter::new(output);
    LoggerOption::new(move |config| config.output = output)
}

/// Selects the textual profile of the `time` attribute.
pub fn with_time_format(time_format: TimeFormat) -> LoggerOption {
    LoggerOption::new(move |config| config.time_format = time_format)
}

/// Enables or disables colored level labels in text output.
pub fn with_color(color: bool) -> LoggerOption {
    LoggerOption::new(move |config| config.color = color)
}

/// Enables or disables the `caller` attribute.
pub fn with_caller(caller: bool) -> LoggerOption {
    LoggerOption::new(move |config| config.caller = caller)
}

/// Attaches a stack trace to records at or above `level`, or disables stack traces for `None`.
pub fn with_stacktrace(level: Option<Level>) -> LoggerOption {
    LoggerOption::new(move |config| config.stacktrace = level)
}

/// Sets the development posture, which makes [`Level::DPanic`] records panic.
pub fn with_development(development: bool) -> LoggerOption {
    LoggerOption::new(move |config| config.development = development)
}

/// Replaces the action taken after a [`Level::Fatal`] record has been written.
pub fn with_fatal_hook(hook: FatalHook) -> LoggerOption {
    LoggerOption::new(move |config| config.fatal_hook = hook)
}

/// Builds a [`Logger`] from `options`, applied in order over the defaults.
///
/// Construction has no side effects on global state and may be called concurrently.
///
/// ```
/// use log_facade::{Level, LevelVar, with_level, with_output};
///
/// let level = LevelVar::new(Level::Info);
/// let logger = log_facade::build([with_level(&level), with_output(std::io::sink)]);
/// assert!(!logger.enabled(Level::Debug));
///
/// level.set(Level::Debug);
/// assert!(logger.enabled(Level::Debug));
/// ```
pub fn build(options: impl IntoIterator<Item = LoggerOption>) -> Logger {
    LoggerConfig::default().apply(options).into_logger()
}

/// Builds only the emitting [`Handler`], for callers that compose their own logger (for example a
/// [`tracing_subscriber::Registry`]) around it.
pub fn build_handler(options: impl IntoIterator<Item = LoggerOption>) -> Handler {
    LoggerConfig::default().apply(options).into_handler()
}
