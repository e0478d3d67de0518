//! Captures the fields of a `tracing` event into a [`Record`].

use std::fmt;

use serde_json::Value;
use tracing::{
    Event,
    field::{Field as TracingField, Visit},
};

use super::{Caller, Field, Record};
use crate::{Level, keys};

/// Collects event fields in the order they are visited, separating out the message.
#[derive(Debug, Default)]
struct FieldVisitor {
    fields: Vec<Field>,
    message: Option<String>,
}

impl FieldVisitor {
    fn record_value(&mut self, field: &TracingField, value: Value) {
        if field.name() == keys::TRACING_MESSAGE {
            if self.message.is_none() {
                self.message = Some(match value {
                    Value::String(message) => message,
                    other => other.to_string(),
                });
            }
        } else {
            self.fields.push(Field::new(field.name(), value));
        }
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.record_value(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.record_value(field, Value::from(value));
    }

    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == keys::TRACING_MESSAGE {
            self.message = Some(value.to_string()); // `record_str()` is preferred for `message`
        } else {
            self.record_value(field, Value::from(value));
        }
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        match field.name() {
            // Skip fields added by the `log` compatibility layer
            name if name.starts_with("log.") => (),
            name if name.starts_with("r#") => {
                let name = name.get(2..).unwrap_or(name);
                self.fields
                    .push(Field::new(name, Value::from(format!("{value:?}"))));
            }
            _ => self.record_value(field, Value::from(format!("{value:?}"))),
        }
    }
}

/// Builds a record from a `tracing` event, using the event target as the message if the event
/// has none.
pub(super) fn record_from_event(event: &Event<'_>) -> Record {
    let mut visitor = FieldVisitor::default();
    event.record(&mut visitor);

    let metadata = event.metadata();
    let message = visitor
        .message
        .unwrap_or_else(|| metadata.target().to_string());
    let caller = metadata
        .file()
        .zip(metadata.line())
        .map(|(file, line)| Caller { file, line });

    Record {
        fields: visitor.fields,
        caller,
        ..Record::new(Level::from(*metadata.level()), message)
    }
}
