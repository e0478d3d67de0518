//! The [`Logger`] type and its per-level entry points.

use std::{fmt, panic::Location, sync::Arc};

use time::OffsetDateTime;

use crate::{Caller, FatalHook, Field, Handler, Level, Record};

/// A configured structured logger.
///
/// Every level has three entry points: a plain message (`info`), a pre-formatted message built
/// with [`format_args!`] (`info_fmt`), and a message with key-value context (`info_kv`).
///
/// Records at [`Level::Panic`] and [`Level::Fatal`], and at [`Level::DPanic`] in development
/// posture, transfer control after being written: see [`Logger::log`]. These control effects are
/// requested by the caller and happen even if the record itself is filtered out.
#[derive(Clone)]
pub struct Logger {
    handler: Handler,
    context: Arc<[Field]>,
    development: bool,
    fatal_hook: FatalHook,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("handler", &self.handler)
            .field("context", &self.context)
            .field("development", &self.development)
            .finish_non_exhaustive()
    }
}

/// Panics with `message`, reporting the location of the logging call.
#[track_caller]
#[allow(clippy::panic, reason = "panicking is the requested effect of these levels")]
fn panic_with(message: &str) -> ! {
    panic!("{message}")
}

macro_rules! leveled_methods {
    ($($level:ident => $plain:ident, $formatted:ident, $with_fields:ident;)+) => {
        $(
            #[doc = concat!("Logs `msg` at [`Level::", stringify!($level), "`].")]
            #[track_caller]
            pub fn $plain(&self, msg: impl fmt::Display) {
                self.log(Level::$level, msg, Vec::<Field>::new());
            }

            #[doc = concat!(
                "Logs a message built with [`format_args!`] at [`Level::",
                stringify!($level),
                "`]."
            )]
            #[track_caller]
            pub fn $formatted(&self, args: fmt::Arguments<'_>) {
                self.log(Level::$level, args, Vec::<Field>::new());
            }

            #[doc = concat!(
                "Logs `msg` with key-value context at [`Level::",
                stringify!($level),
                "`]."
            )]
            #[track_caller]
            pub fn $with_fields<F>(&self, msg: impl fmt::Display, fields: impl IntoIterator<Item = F>)
            where
                F: Into<Field>,
            {
                self.log(Level::$level, msg, fields);
            }
        )+
    };
}

impl Logger {
    pub(crate) fn new(handler: Handler, development: bool, fatal_hook: FatalHook) -> Self {
        Self {
            handler,
            context: Arc::from(Vec::new()),
            development,
            fatal_hook,
        }
    }

    /// A logger that discards every record. Control effects still apply.
    pub fn noop() -> Self {
        crate::build([crate::with_output(std::io::sink)])
    }

    /// The emitting layer of this logger.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Returns `true` if records at `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        self.handler.enabled(level)
    }

    /// Returns `true` if [`Level::DPanic`] records panic.
    pub fn is_development(&self) -> bool {
        self.development
    }

    /// Returns a logger that writes through the same handler and adds `fields` to every record,
    /// ahead of the fields supplied at the call site.
    ///
    /// ```
    /// use log_facade::{fields, with_output};
    ///
    /// let logger = log_facade::build([with_output(std::io::sink)]);
    /// let request_logger = logger.with_fields(fields!("request_id" => "8f2c"));
    /// request_logger.info("handled");
    /// ```
    pub fn with_fields<F>(&self, fields: impl IntoIterator<Item = F>) -> Self
    where
        F: Into<Field>,
    {
        let context = self
            .context
            .iter()
            .cloned()
            .chain(fields.into_iter().map(Into::into))
            .collect::<Vec<_>>();

        Self {
            context: Arc::from(context),
            ..self.clone()
        }
    }

    /// Logs `msg` with key-value context at `level`.
    ///
    /// The message is only rendered if the record is written or a control effect needs it.
    ///
    /// # Panics
    ///
    /// Panics with the rendered message after writing a [`Level::Panic`] record, or a
    /// [`Level::DPanic`] record in development posture. After a [`Level::Fatal`] record, the fatal
    /// hook is invoked instead, which by default exits the process with status 1.
    #[track_caller]
    pub fn log<F>(&self, level: Level, msg: impl fmt::Display, fields: impl IntoIterator<Item = F>)
    where
        F: Into<Field>,
    {
        let transfers_control = match level {
            Level::Panic | Level::Fatal => true,
            Level::DPanic => self.development,
            Level::Debug | Level::Info | Level::Warn | Level::Error => false,
        };
        if !transfers_control && !self.enabled(level) {
            return;
        }

        let message = msg.to_string();
        self.write(level, &message, fields);

        if transfers_control {
            self.transfer_control(level, &message);
        }
    }

    #[track_caller]
    fn write<F>(&self, level: Level, message: &str, fields: impl IntoIterator<Item = F>)
    where
        F: Into<Field>,
    {
        if !self.enabled(level) {
            return;
        }

        let record = Record {
            time: OffsetDateTime::now_utc(),
            level,
            message: message.to_owned(),
            fields: self
                .context
                .iter()
                .cloned()
                .chain(fields.into_iter().map(Into::into))
                .collect(),
            caller: Some(Caller::from(Location::caller())),
        };

        // Emission failures are not surfaced to logging call sites.
        let _ = self.handler.handle(&record);
    }

    #[track_caller]
    fn transfer_control(&self, level: Level, message: &str) -> ! {
        if level == Level::Fatal {
            (self.fatal_hook)(message)
        }
        panic_with(message)
    }

    leveled_methods! {
        Debug => debug, debug_fmt, debug_kv;
        Info => info, info_fmt, info_kv;
        Warn => warn, warn_fmt, warn_kv;
        Error => error, error_fmt, error_kv;
        DPanic => dpanic, dpanic_fmt, dpanic_kv;
    }

    /// Logs `msg` at [`Level::Panic`], then panics with it.
    ///
    /// # Panics
    ///
    /// Always.
    #[track_caller]
    pub fn panic(&self, msg: impl fmt::Display) -> ! {
        self.panic_kv(msg, Vec::<Field>::new())
    }

    /// Logs a message built with [`format_args!`] at [`Level::Panic`], then panics with it.
    ///
    /// # Panics
    ///
    /// Always.
    #[track_caller]
    pub fn panic_fmt(&self, args: fmt::Arguments<'_>) -> ! {
        self.panic_kv(args, Vec::<Field>::new())
    }

    /// Logs `msg` with key-value context at [`Level::Panic`], then panics with it.
    ///
    /// # Panics
    ///
    /// Always.
    #[track_caller]
    pub fn panic_kv<F>(&self, msg: impl fmt::Display, fields: impl IntoIterator<Item = F>) -> !
    where
        F: Into<Field>,
    {
        let message = msg.to_string();
        self.write(Level::Panic, &message, fields);
        panic_with(&message)
    }

    /// Logs `msg` at [`Level::Fatal`], then invokes the fatal hook.
    #[track_caller]
    pub fn fatal(&self, msg: impl fmt::Display) -> ! {
        self.fatal_kv(msg, Vec::<Field>::new())
    }

    /// Logs a message built with [`format_args!`] at [`Level::Fatal`], then invokes the fatal
    /// hook.
    #[track_caller]
    pub fn fatal_fmt(&self, args: fmt::Arguments<'_>) -> ! {
        self.fatal_kv(args, Vec::<Field>::new())
    }

    /// Logs `msg` with key-value context at [`Level::Fatal`], then invokes the fatal hook.
    #[track_caller]
    pub fn fatal_kv<F>(&self, msg: impl fmt::Display, fields: impl IntoIterator<Item = F>) -> !
    where
        F: Into<Field>,
    {
        let message = msg.to_string();
        self.write(Level::Fatal, &message, fields);
        (self.fatal_hook)(&message)
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use serde_json::Value;

    use super::*;
    use crate::{
        Format, LevelVar, build, fields, handler::tests::Buffer, with_caller, with_development,
        with_fatal_hook, with_format, with_level, with_output,
    };

    fn panicking_exit(message: &str) -> ! {
        panic!("fatal: {message}")
    }

    fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
        payload
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_default()
    }

    fn parse(line: &str) -> Value {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn info_threshold_suppresses_debug() {
        let buffer = Buffer::default();
        let logger = build([with_output(buffer.clone()), with_level(Level::Info)]);

        logger.debug("hidden");
        logger.info("shown");

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(parse(&lines[0])["level"], "INFO");
    }

    #[test]
    fn three_call_shapes_render_the_same_message() {
        let buffer = Buffer::default();
        let logger = build([with_output(buffer.clone())]);

        logger.warn("retry 2");
        logger.warn_fmt(format_args!("retry {}", 2));
        logger.warn_kv("retry 2", fields!("attempt" => 2));

        let lines = buffer.lines();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert_eq!(parse(line)["msg"], "retry 2");
        }
        assert_eq!(parse(&lines[2])["attempt"], 2);
    }

    #[test]
    fn child_logger_prepends_context_fields() {
        let buffer = Buffer::default();
        let logger = build([with_output(buffer.clone()), with_format(Format::Text)])
            .with_fields([("service", "billing")]);
        let request = logger.with_fields(fields!("request_id" => 7));

        request.info_kv("charged", fields!("amount" => 12.5));
        logger.info("idle");

        let lines = buffer.lines();
        assert!(lines[0].ends_with("msg=charged service=billing request_id=7 amount=12.5"));
        assert!(lines[1].ends_with("msg=idle service=billing"));
    }

    #[test]
    fn caller_points_at_the_logging_call() {
        let buffer = Buffer::default();
        let logger = build([with_output(buffer.clone()), with_caller(true)]);

        let line = line!() + 1;
        logger.error("failed");

        let record = parse(&buffer.lines()[0]);
        assert_eq!(record["caller"], format!("{}:{line}", file!()));
    }

    #[test]
    fn level_var_changes_apply_without_rebuilding() {
        let buffer = Buffer::default();
        let level = LevelVar::new(Level::Warn);
        let logger = build([with_output(buffer.clone()), with_level(&level)]);

        logger.info("suppressed");
        level.set(Level::Info);
        logger.info("emitted");

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(parse(&lines[0])["msg"], "emitted");
    }

    #[test]
    fn panic_writes_then_unwinds_with_message() {
        let buffer = Buffer::default();
        let logger = build([with_output(buffer.clone())]);

        let result = catch_unwind(AssertUnwindSafe(|| {
            logger.panic_fmt(format_args!("invariant {} broken", "x"))
        }));

        assert_eq!(panic_message(result.unwrap_err()), "invariant x broken");
        assert_eq!(parse(&buffer.lines()[0])["level"], "PANIC");
    }

    #[test]
    fn panic_happens_even_when_filtered_out() {
        let logger = build([with_output(std::io::sink), with_level(Level::Fatal)]);
        let result = catch_unwind(AssertUnwindSafe(|| logger.panic("unreachable state")));
        assert!(result.is_err());
    }

    #[test]
    fn dpanic_only_panics_in_development() {
        let buffer = Buffer::default();
        let production = build([with_output(buffer.clone())]);
        production.dpanic("tolerated");
        assert_eq!(parse(&buffer.lines()[0])["level"], "DPANIC");

        let development = build([with_output(std::io::sink), with_development(true)]);
        assert!(development.is_development());
        let result = catch_unwind(AssertUnwindSafe(|| development.dpanic("not tolerated")));
        assert_eq!(panic_message(result.unwrap_err()), "not tolerated");
    }

    #[test]
    fn fatal_writes_then_invokes_hook() {
        let buffer = Buffer::default();
        let logger = build([
            with_output(buffer.clone()),
            with_fatal_hook(panicking_exit),
        ]);

        let result = catch_unwind(AssertUnwindSafe(|| {
            logger.fatal_kv("cannot bind", fields!("port" => 8080))
        }));

        assert_eq!(panic_message(result.unwrap_err()), "fatal: cannot bind");
        let record = parse(&buffer.lines()[0]);
        assert_eq!(record["level"], "FATAL");
        assert_eq!(record["port"], 8080);
    }

    #[test]
    fn generic_log_routes_fatal_to_hook() {
        let logger = build([with_output(std::io::sink), with_fatal_hook(panicking_exit)]);
        let result = catch_unwind(AssertUnwindSafe(|| {
            logger.log(Level::Fatal, "bye", Vec::<Field>::new())
        }));
        assert_eq!(panic_message(result.unwrap_err()), "fatal: bye");
    }
}
