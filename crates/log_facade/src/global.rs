//! The process-wide logger and its convenience functions.
//!
//! A [`GlobalLogger`] holds the currently installed [`Logger`] behind an atomically swappable
//! pointer. It starts out with [`Logger::noop`] and is replaced wholesale by each call to one of
//! the initializers; there is no teardown. Readers always see either the previous or the new
//! logger in full.
//!
//! Initialization resolves one of two profiles from the `UNSTRUCTURED_LOGS` environment
//! variable:
//!
//! | | unstructured (`true`, unset or unparseable) | structured (`false`) |
//! |---|---|---|
//! | format | [`Format::Text`], colored levels | [`Format::Json`] |
//! | `time` | [`TimeFormat::TimeOfDay`] | [`TimeFormat::Rfc3339`] |
//! | `caller` | omitted | included |
//! | `stacktrace` | omitted | at [`Level::Error`] and above |
//! | output | standard error | standard output |
//! | [`Level::DPanic`] | panics (development posture) | logs only |
//!
//! The threshold is [`Level::Debug`] if the [`DebugProvider`] reports debug mode, and
//! [`Level::Info`] otherwise.
//!
//! The free functions in this module ([`info`], [`warn_kv`], [`error_fmt`], ...) operate on the
//! process-wide instance returned by [`global()`] and look up the installed logger on every call.
//!
//! ```
//! use log_facade::{fields, global};
//!
//! global::initialize();
//! global::info("service started");
//! global::warn_kv("slow request", fields!("elapsed_ms" => 912));
//! ```

mod env;
mod layer;

use std::{
    fmt,
    sync::{Arc, LazyLock},
};

use arc_swap::ArcSwap;

pub use self::{
    env::{DebugProvider, EnvironmentReader, NoDebug, ProcessEnvironment},
    layer::GlobalLayer,
};
use crate::{
    Field, Format, Level, Logger, LoggerOption, TimeFormat, build, with_caller, with_color,
    with_development, with_format, with_level, with_output, with_stacktrace, with_time_format,
};

/// Name of the environment variable selecting between the unstructured and structured profiles.
pub const UNSTRUCTURED_LOGS: &str = "UNSTRUCTURED_LOGS";

/// Interprets the value of [`UNSTRUCTURED_LOGS`].
///
/// Empty and unparseable values select unstructured output, so that tools are legible out of the
/// box in interactive and local contexts.
///
/// ```
/// use log_facade::global::parse_unstructured_flag;
///
/// assert!(parse_unstructured_flag(""));
/// assert!(parse_unstructured_flag("true"));
/// assert!(!parse_unstructured_flag("false"));
/// assert!(parse_unstructured_flag("not-a-bool"));
/// ```
pub fn parse_unstructured_flag(value: &str) -> bool {
    env::parse_bool(value).unwrap_or(true)
}

/// Human-readable profile for interactive and local use.
fn unstructured_profile() -> Vec<LoggerOption> {
    vec![
        with_format(Format::Text),
        with_color(true),
        with_time_format(TimeFormat::TimeOfDay),
        with_caller(false),
        with_stacktrace(None),
        with_output(std::io::stderr),
        with_development(true),
    ]
}

/// Machine-readable profile for deployed services.
fn structured_profile() -> Vec<LoggerOption> {
    vec![
        with_format(Format::Json),
        with_time_format(TimeFormat::Rfc3339),
        with_caller(true),
        with_stacktrace(Some(Level::Error)),
        with_output(std::io::stdout),
        with_development(false),
    ]
}

/// Resolves the options for a global logger from the environment toggle and the debug signal.
fn resolve_options(env: &dyn EnvironmentReader, debug: &dyn DebugProvider) -> Vec<LoggerOption> {
    let value = env.getenv(UNSTRUCTURED_LOGS);
    if !value.is_empty() && env::parse_bool(&value).is_none() {
        tracing::warn!(
            "`{UNSTRUCTURED_LOGS}` has the non-boolean value `{value}`. Using unstructured logs."
        );
    }

    let mut options = if parse_unstructured_flag(&value) {
        unstructured_profile()
    } else {
        structured_profile()
    };

    let level = if debug.is_debug() {
        Level::Debug
    } else {
        Level::Info
    };
    options.push(with_level(level));

    options
}

/// Holder of a swappable [`Logger`].
///
/// Most programs use the process-wide instance through [`global()`] and the free functions of
/// this module; separate instances are useful to hosts that manage their own lifecycle, and to
/// tests.
pub struct GlobalLogger {
    current: ArcSwap<Logger>,
}

impl fmt::Debug for GlobalLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalLogger")
            .field("current", &self.current.load_full())
            .finish()
    }
}

impl Default for GlobalLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalLogger {
    /// Creates a holder with a logger that discards every record.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Logger::noop()),
        }
    }

    /// Returns the currently installed logger.
    ///
    /// The returned logger keeps working after a re-initialization, but it is no longer the one
    /// that the convenience functions write to.
    pub fn logger(&self) -> Arc<Logger> {
        self.current.load_full()
    }

    /// Atomically replaces the installed logger.
    pub fn install(&self, logger: Logger) {
        self.current.store(Arc::new(logger));
    }

    /// Initializes from the process environment, without debug mode.
    pub fn initialize(&self) {
        self.initialize_with_options(&ProcessEnvironment, &NoDebug);
    }

    /// Initializes from the process environment, with the debug signal of `debug`.
    pub fn initialize_with_debug_provider(&self, debug: &dyn DebugProvider) {
        self.initialize_with_options(&ProcessEnvironment, debug);
    }

    /// Initializes from `env` and `debug`.
    pub fn initialize_with_options(&self, env: &dyn EnvironmentReader, debug: &dyn DebugProvider) {
        self.initialize_with_overrides(env, debug, std::iter::empty());
    }

    /// Initializes from `env` and `debug`, then applies `overrides` on top of the resolved
    /// profile (for example, to redirect the output).
    pub fn initialize_with_overrides(
        &self,
        env: &dyn EnvironmentReader,
        debug: &dyn DebugProvider,
        overrides: impl IntoIterator<Item = LoggerOption>,
    ) {
        let options = resolve_options(env, debug).into_iter().chain(overrides);
        self.install(build(options));
    }

    /// Returns a [`tracing_subscriber::Layer`] forwarding `tracing` events to this holder.
    pub fn layer(&'static self) -> GlobalLayer {
        GlobalLayer::new(self)
    }
}

static GLOBAL: LazyLock<GlobalLogger> = LazyLock::new(GlobalLogger::new);

/// The process-wide [`GlobalLogger`].
pub fn global() -> &'static GlobalLogger {
    &GLOBAL
}

/// Initializes the process-wide logger from the process environment, without debug mode.
pub fn initialize() {
    global().initialize();
}

/// Initializes the process-wide logger from the process environment, with the debug signal of
/// `debug`.
pub fn initialize_with_debug_provider(debug: &dyn DebugProvider) {
    global().initialize_with_debug_provider(debug);
}

/// Initializes the process-wide logger from `env` and `debug`.
pub fn initialize_with_options(env: &dyn EnvironmentReader, debug: &dyn DebugProvider) {
    global().initialize_with_options(env, debug);
}

/// Returns the logger currently installed in the process-wide holder.
pub fn logger() -> Arc<Logger> {
    global().logger()
}

/// Returns a [`tracing_subscriber::Layer`] forwarding `tracing` events to the process-wide
/// holder.
pub fn layer() -> GlobalLayer {
    global().layer()
}

macro_rules! convenience_functions {
    ($($level:ident => $plain:ident, $formatted:ident, $with_fields:ident;)+) => {
        $(
            #[doc = concat!(
                "Logs `msg` at [`Level::",
                stringify!($level),
                "`] through the installed logger."
            )]
            #[track_caller]
            pub fn $plain(msg: impl fmt::Display) {
                global().current.load().$plain(msg);
            }

            #[doc = concat!(
                "Logs a message built with [`format_args!`] at [`Level::",
                stringify!($level),
                "`] through the installed logger."
            )]
            #[track_caller]
            pub fn $formatted(args: fmt::Arguments<'_>) {
                global().current.load().$formatted(args);
            }

            #[doc = concat!(
                "Logs `msg` with key-value context at [`Level::",
                stringify!($level),
                "`] through the installed logger."
            )]
            #[track_caller]
            pub fn $with_fields<F>(msg: impl fmt::Display, fields: impl IntoIterator<Item = F>)
            where
                F: Into<Field>,
            {
                global().current.load().$with_fields(msg, fields);
            }
        )+
    };
}

convenience_functions! {
    Debug => debug, debug_fmt, debug_kv;
    Info => info, info_fmt, info_kv;
    Warn => warn, warn_fmt, warn_kv;
    Error => error, error_fmt, error_kv;
    DPanic => dpanic, dpanic_fmt, dpanic_kv;
}

/// Logs `msg` at [`Level::Panic`] through the installed logger, then panics with it.
///
/// # Panics
///
/// Always.
#[track_caller]
pub fn panic(msg: impl fmt::Display) -> ! {
    global().logger().panic(msg)
}

/// Logs a message built with [`format_args!`] at [`Level::Panic`] through the installed logger,
/// then panics with it.
///
/// # Panics
///
/// Always.
#[track_caller]
pub fn panic_fmt(args: fmt::Arguments<'_>) -> ! {
    global().logger().panic_fmt(args)
}

/// Logs `msg` with key-value context at [`Level::Panic`] through the installed logger, then
/// panics with it.
///
/// # Panics
///
/// Always.
#[track_caller]
pub fn panic_kv<F>(msg: impl fmt::Display, fields: impl IntoIterator<Item = F>) -> !
where
    F: Into<Field>,
{
    global().logger().panic_kv(msg, fields)
}

/// Logs `msg` at [`Level::Fatal`] through the installed logger, then invokes its fatal hook.
#[track_caller]
pub fn fatal(msg: impl fmt::Display) -> ! {
    global().logger().fatal(msg)
}

/// Logs a message built with [`format_args!`] at [`Level::Fatal`] through the installed logger,
/// then invokes its fatal hook.
#[track_caller]
pub fn fatal_fmt(args: fmt::Arguments<'_>) -> ! {
    global().logger().fatal_fmt(args)
}

/// Logs `msg` with key-value context at [`Level::Fatal`] through the installed logger, then
/// invokes its fatal hook.
#[track_caller]
pub fn fatal_kv<F>(msg: impl fmt::Display, fields: impl IntoIterator<Item = F>) -> !
where
    F: Into<Field>,
{
    global().logger().fatal_kv(msg, fields)
}
