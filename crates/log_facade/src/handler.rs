//! The emitting layer: [`Handler`] turns a [`Record`] into bytes and writes them to the output
//! destination in a single call.

mod json;
mod text;
mod visitor;

use std::{backtrace::Backtrace, fmt, io::Write, panic::Location, sync::Arc};

use serde_json::Value;
use time::OffsetDateTime;
use tracing::{Event, Metadata, Subscriber, subscriber::Interest};
use tracing_subscriber::{
    Layer,
    fmt::{MakeWriter, writer::BoxMakeWriter},
    layer::Context,
};

use crate::{Format, Level, LevelSetting, LoggerConfig, LoggerError, TimeFormat};

/// A caller-supplied key-value pair attached to a record.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// The key, written verbatim.
    pub key: String,

    /// The value.
    pub value: Value,
}

impl Field {
    /// Creates a new field.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K, V> From<(K, V)> for Field
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Source location that emitted a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller {
    /// Source file path.
    pub file: &'static str,

    /// Line number within `file`.
    pub line: u32,
}

impl From<&'static Location<'static>> for Caller {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A single log entry, before encoding.
#[derive(Clone, Debug)]
pub struct Record {
    /// Wall-clock time at which the record was created.
    pub time: OffsetDateTime,

    /// Severity.
    pub level: Level,

    /// Rendered message.
    pub message: String,

    /// Key-value pairs, in the order they were supplied.
    pub fields: Vec<Field>,

    /// Where the record was emitted from, if known.
    pub caller: Option<Caller>,
}

impl Record {
    /// Creates a record timestamped with the current time, without fields or caller.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: OffsetDateTime::now_utc(),
            level,
            message: message.into(),
            fields: Vec::new(),
            caller: None,
        }
    }
}

/// Everything the encoders need, with the timestamp already normalized.
struct Entry<'a> {
    time: String,
    level: Level,
    message: &'a str,
    caller: Option<Caller>,
    fields: &'a [Field],
    stacktrace: Option<String>,
}

/// Encodes records and writes them to an output destination.
///
/// A handler is what [`build_handler`][crate::build_handler] returns and what every
/// [`Logger`][crate::Logger] wraps. It can also be added to a [`tracing_subscriber::Registry`]
/// as a [`Layer`], in which case `tracing` events are filtered against the handler's level and
/// encoded the same way.
///
/// Cloning is cheap and clones share the output destination and any [`LevelVar`][crate::LevelVar].
#[derive(Clone)]
pub struct Handler {
    writer: Arc<BoxMakeWriter>,
    format: Format,
    level: LevelSetting,
    time_format: TimeFormat,
    color: bool,
    caller: bool,
    stacktrace: Option<Level>,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("time_format", &self.time_format)
            .field("color", &self.color)
            .field("caller", &self.caller)
            .field("stacktrace", &self.stacktrace)
            .finish_non_exhaustive()
    }
}

impl Handler {
    pub(crate) fn new(config: LoggerConfig) -> Self {
        Self {
            writer: Arc::new(config.output),
            format: config.format,
            level: config.level,
            time_format: config.time_format,
            color: config.color,
            caller: config.caller,
            stacktrace: config.stacktrace,
        }
    }

    /// Returns `true` if records at `level` pass the handler's current threshold.
    pub fn enabled(&self, level: Level) -> bool {
        level.is_enabled_at(self.level.level())
    }

    /// The encoding used by this handler.
    pub fn format(&self) -> Format {
        self.format
    }

    /// The threshold in effect right now.
    pub fn level(&self) -> Level {
        self.level.level()
    }

    /// Encodes `record` and writes it to the output destination.
    ///
    /// The record is written regardless of the handler's level; callers are expected to check
    /// [`Handler::enabled`] first.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError`] if the timestamp cannot be rendered, the record cannot be
    /// serialized, or the output destination rejects the write.
    pub fn handle(&self, record: &Record) -> Result<(), LoggerError> {
        let stacktrace = self
            .stacktrace
            .filter(|threshold| record.level.is_enabled_at(*threshold))
            .map(|_| Backtrace::force_capture().to_string());

        let entry = Entry {
            time: self.time_format.render(record.time)?,
            level: record.level,
            message: &record.message,
            caller: record.caller.filter(|_| self.caller),
            fields: &record.fields,
            stacktrace,
        };

        let buffer = match self.format {
            Format::Json => json::encode(&entry)?,
            Format::Text => text::encode(&entry, self.color),
        };

        self.flush(buffer)
    }

    /// Flush memory buffer into an output stream with a trailing newline.
    ///
    /// Should be done by a single `write_all` call to avoid fragmentation of log because of
    /// multithreading.
    fn flush(&self, mut buffer: Vec<u8>) -> Result<(), LoggerError> {
        buffer.write_all(b"\n")?;
        MakeWriter::make_writer(&*self.writer).write_all(&buffer)?;
        Ok(())
    }

    pub(crate) fn handle_event(&self, event: &Event<'_>) {
        let record = visitor::record_from_event(event);
        if self.enabled(record.level) {
            let _ = self.handle(&record);
        }
    }

    pub(crate) fn enabled_for_metadata(&self, metadata: &Metadata<'_>) -> bool {
        self.enabled(Level::from(*metadata.level()))
    }
}

impl<S> Layer<S> for Handler
where
    S: Subscriber,
{
    fn register_callsite(&self, metadata: &'static Metadata<'static>) -> Interest {
        // A `LevelVar` may change at any time, so the answer must not be cached.
        if self.level.is_dynamic() {
            Interest::sometimes()
        } else if self.enabled_for_metadata(metadata) {
            Interest::always()
        } else {
            Interest::never()
        }
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.enabled_for_metadata(metadata)
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.handle_event(event);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        io::{self, Write},
        sync::{Arc, Mutex, MutexGuard},
    };

    use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt};

    use super::*;
    use crate::{LevelVar, build_handler, with_caller, with_format, with_level, with_output};

    /// In-memory output destination shared between a handler and the test inspecting it.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }

        pub(crate) fn lines(&self) -> Vec<String> {
            self.contents().lines().map(str::to_owned).collect()
        }
    }

    pub(crate) struct BufferWriter<'a>(MutexGuard<'a, Vec<u8>>);

    impl Write for BufferWriter<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = BufferWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            BufferWriter(self.0.lock().unwrap())
        }
    }

    #[test]
    fn handle_writes_one_line_per_record() {
        let buffer = Buffer::default();
        let handler = build_handler([with_output(buffer.clone())]);

        handler.handle(&Record::new(Level::Info, "first")).unwrap();
        handler.handle(&Record::new(Level::Warn, "second")).unwrap();

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""msg":"first""#));
        assert!(lines[1].contains(r#""level":"WARN""#));
    }

    #[test]
    fn caller_is_only_written_when_enabled() {
        let record = Record {
            caller: Some(Caller {
                file: "src/main.rs",
                line: 7,
            }),
            ..Record::new(Level::Info, "hello")
        };

        let without = Buffer::default();
        build_handler([with_output(without.clone())])
            .handle(&record)
            .unwrap();
        assert!(!without.contents().contains("caller"));

        let with = Buffer::default();
        build_handler([with_output(with.clone()), with_caller(true)])
            .handle(&record)
            .unwrap();
        assert!(with.contents().contains(r#""caller":"src/main.rs:7""#));
    }

    #[test]
    fn handler_filters_tracing_events() {
        let buffer = Buffer::default();
        let handler = build_handler([
            with_output(buffer.clone()),
            with_format(Format::Text),
            with_level(Level::Info),
        ]);
        let subscriber = tracing_subscriber::registry().with(handler);

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("hidden");
            tracing::info!(user = "alice", attempt = 2, "signed in");
        });

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("level=INFO"));
        assert!(lines[0].contains(r#"msg="signed in""#));
        assert!(lines[0].contains("user=alice attempt=2"));
    }

    #[test]
    fn handler_layer_follows_level_var() {
        let buffer = Buffer::default();
        let level = LevelVar::new(Level::Warn);
        let handler = build_handler([with_output(buffer.clone()), with_level(&level)]);
        let subscriber = tracing_subscriber::registry().with(handler);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("suppressed");
            level.set(Level::Info);
            tracing::info!("emitted");
        });

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(r#""msg":"emitted""#));
    }
}
