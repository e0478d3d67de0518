//! Output encodings and timestamp profiles.

use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::LoggerError;

/// Encoding used for emitted records.
///
/// The format only affects how a record is serialized: which records are emitted and which
/// fields they carry are the same for both variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// One compact JSON object per line.
    #[default]
    Json,

    /// One line of space-separated `key=value` tokens.
    Text,
}

/// Textual profile used for the `time` attribute of every record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeFormat {
    /// RFC 3339 date-time with second precision and UTC offset, e.g. `2024-05-01T12:30:45Z`.
    #[default]
    Rfc3339,

    /// Compact UTC time of day, e.g. `12:30:45`.
    TimeOfDay,
}

impl TimeFormat {
    /// Renders `time` according to this profile.
    pub(crate) fn render(self, time: OffsetDateTime) -> Result<String, LoggerError> {
        let rendered = match self {
            Self::Rfc3339 => time.replace_nanosecond(0)?.format(&Rfc3339)?,
            Self::TimeOfDay => time.format(format_description!("[hour]:[minute]:[second]"))?,
        };
        Ok(rendered)
    }
}
