//! JSON encoding of records.

use serde::ser::{SerializeMap, Serializer};

use super::Entry;
use crate::{LoggerError, keys};

/// Serializes `entry` into a single compact JSON object.
///
/// Keys are written in a fixed order: `time`, `level`, `msg`, `caller`, the caller-supplied
/// fields, then `stacktrace`.
pub(super) fn encode(entry: &Entry<'_>) -> Result<Vec<u8>, LoggerError> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::new(&mut buffer);
    let mut map_serializer = serializer.serialize_map(None)?;

    map_serializer.serialize_entry(keys::TIME, &entry.time)?;
    map_serializer.serialize_entry(keys::LEVEL, &entry.level)?;
    map_serializer.serialize_entry(keys::MESSAGE, entry.message)?;

    if let Some(caller) = entry.caller {
        map_serializer.serialize_entry(keys::CALLER, &format_args!("{caller}"))?;
    }

    for field in entry.fields {
        map_serializer.serialize_entry(&field.key, &field.value)?;
    }

    if let Some(stacktrace) = &entry.stacktrace {
        map_serializer.serialize_entry(keys::STACKTRACE, stacktrace)?;
    }

    map_serializer.end()?;
    Ok(buffer)
}
