//! Human-readable `key=value` encoding of records.

use serde_json::Value;

use super::Entry;
use crate::{Level, keys};

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";

/// Serializes `entry` into a single line of space-separated `key=value` tokens, using the same
/// key order as the JSON encoding.
pub(super) fn encode(entry: &Entry<'_>, color: bool) -> Vec<u8> {
    let mut line = String::new();

    push_pair(&mut line, keys::TIME, &entry.time);
    push_level(&mut line, entry.level, color);
    push_pair(&mut line, keys::MESSAGE, entry.message);

    if let Some(caller) = entry.caller {
        push_pair(&mut line, keys::CALLER, &caller.to_string());
    }

    for field in entry.fields {
        match &field.value {
            Value::String(value) => push_pair(&mut line, &field.key, value),
            value => push_pair(&mut line, &field.key, &value.to_string()),
        }
    }

    if let Some(stacktrace) = &entry.stacktrace {
        push_pair(&mut line, keys::STACKTRACE, stacktrace);
    }

    line.into_bytes()
}

fn push_level(line: &mut String, level: Level, color: bool) {
    line.push(' ');
    line.push_str(keys::LEVEL);
    line.push('=');
    if color {
        line.push_str(level_color(level));
        line.push_str(level.as_str());
        line.push_str(RESET);
    } else {
        line.push_str(level.as_str());
    }
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Debug => MAGENTA,
        Level::Info => BLUE,
        Level::Warn => YELLOW,
        Level::Error | Level::DPanic | Level::Panic | Level::Fatal => RED,
    }
}

fn push_pair(line: &mut String, key: &str, value: &str) {
    if !line.is_empty() {
        line.push(' ');
    }
    push_token(line, key);
    line.push('=');
    push_token(line, value);
}

fn push_token(line: &mut String, token: &str) {
    if needs_quoting(token) {
        line.push_str(&format!("{token:?}"));
    } else {
        line.push_str(token);
    }
}

fn needs_quoting(token: &str) -> bool {
    token.is_empty()
        || token
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '=' || c == '"')
}
