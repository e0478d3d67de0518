//! Severity levels and the shared, mutable level reference ([`LevelVar`]).

use std::{
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

use serde::{Deserialize, Serialize};

/// Severity of a log record.
///
/// Variants are declared from least to most severe. For threshold comparisons
/// ([`Level::is_enabled_at`]), [`Level::DPanic`] and [`Level::Panic`] rank the same as
/// [`Level::Error`]; they only differ from it in the control effect they trigger after the record
/// is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Verbose diagnostics, usually disabled in production.
    Debug,

    /// Regular operational messages.
    Info,

    /// Something unexpected that does not prevent progress.
    Warn,

    /// An operation failed.
    Error,

    /// An error that panics when the logger is in development posture.
    DPanic,

    /// An error that always panics after being written.
    Panic,

    /// An error that terminates the process after being written.
    Fatal,
}

impl Level {
    /// All levels, from least to most severe.
    pub const ALL: [Self; 7] = [
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::DPanic,
        Self::Panic,
        Self::Fatal,
    ];

    /// The uppercase name written into records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::DPanic => "DPANIC",
            Self::Panic => "PANIC",
            Self::Fatal => "FATAL",
        }
    }

    /// Returns `true` if a record at this level passes the given `threshold`.
    pub const fn is_enabled_at(self, threshold: Self) -> bool {
        self.filter_rank() >= threshold.filter_rank()
    }

    const fn filter_rank(self) -> u8 {
        match self {
            Self::Debug => 0,
            Self::Info => 1,
            Self::Warn => 2,
            Self::Error | Self::DPanic | Self::Panic => 3,
            Self::Fatal => 4,
        }
    }

    const fn to_bits(self) -> u8 {
        match self {
            Self::Debug => 0,
            Self::Info => 1,
            Self::Warn => 2,
            Self::Error => 3,
            Self::DPanic => 4,
            Self::Panic => 5,
            Self::Fatal => 6,
        }
    }

    const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Debug),
            1 => Some(Self::Info),
            2 => Some(Self::Warn),
            3 => Some(Self::Error),
            4 => Some(Self::DPanic),
            5 => Some(Self::Panic),
            6 => Some(Self::Fatal),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level `{0}`")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        if level == tracing::Level::ERROR {
            Self::Error
        } else if level == tracing::Level::WARN {
            Self::Warn
        } else if level == tracing::Level::INFO {
            Self::Info
        } else {
            // `TRACE` has no counterpart and is folded into `DEBUG`.
            Self::Debug
        }
    }
}

/// A shared severity threshold that can be changed after loggers have been built.
///
/// Cloning a [`LevelVar`] yields another handle to the same cell. Every logger built with
/// [`with_level`][crate::with_level] against a handle observes [`LevelVar::set`] on its very next
/// emission.
///
/// ```
/// use log_facade::{Level, LevelVar};
///
/// let level = LevelVar::new(Level::Info);
/// let handle = level.clone();
/// handle.set(Level::Warn);
/// assert_eq!(level.level(), Level::Warn);
/// ```
#[derive(Clone, Debug)]
pub struct LevelVar(Arc<AtomicU8>);

impl LevelVar {
    /// Creates a new cell holding `level`.
    pub fn new(level: Level) -> Self {
        Self(Arc::new(AtomicU8::new(level.to_bits())))
    }

    /// Returns the current threshold.
    pub fn level(&self) -> Level {
        Level::from_bits(self.0.load(Ordering::Acquire)).unwrap_or(Level::Info)
    }

    /// Replaces the current threshold.
    pub fn set(&self, level: Level) {
        self.0.store(level.to_bits(), Ordering::Release);
    }
}

impl Default for LevelVar {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

/// The threshold a handler filters against: either fixed at construction or read from a
/// [`LevelVar`] on every check.
#[derive(Clone, Debug)]
pub enum LevelSetting {
    /// A threshold that never changes.
    Fixed(Level),

    /// A threshold shared with (and owned by) the caller.
    Dynamic(LevelVar),
}

impl LevelSetting {
    /// The threshold in effect right now.
    pub fn level(&self) -> Level {
        match self {
            Self::Fixed(level) => *level,
            Self::Dynamic(var) => var.level(),
        }
    }

    pub(crate) fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl Default for LevelSetting {
    fn default() -> Self {
        Self::Fixed(Level::Info)
    }
}

impl From<Level> for LevelSetting {
    fn from(level: Level) -> Self {
        Self::Fixed(level)
    }
}

impl From<LevelVar> for LevelSetting {
    fn from(var: LevelVar) -> Self {
        Self::Dynamic(var)
    }
}

impl From<&LevelVar> for LevelSetting {
    fn from(var: &LevelVar) -> Self {
        Self::Dynamic(var.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn panic_levels_filter_like_error() {
        assert!(Level::DPanic.is_enabled_at(Level::Error));
        assert!(Level::Panic.is_enabled_at(Level::Error));
        assert!(Level::Error.is_enabled_at(Level::Panic));
        assert!(!Level::Panic.is_enabled_at(Level::Fatal));
        assert!(Level::Fatal.is_enabled_at(Level::Panic));
        assert!(!Level::Debug.is_enabled_at(Level::Info));
    }

    #[test]
    fn level_names_round_trip_case_insensitively() {
        for level in Level::ALL {
            assert_eq!(level.as_str().to_lowercase().parse::<Level>(), Ok(level));
        }
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn level_serializes_as_uppercase_name() {
        let serialized = serde_json::to_string(&Level::DPanic).unwrap();
        assert_eq!(serialized, r#""DPANIC""#);
    }

    #[test]
    fn tracing_levels_are_mapped() {
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Debug);
        assert_eq!(Level::from(tracing::Level::DEBUG), Level::Debug);
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
        assert_eq!(Level::from(tracing::Level::ERROR), Level::Error);
    }

    #[test]
    fn level_var_updates_are_shared_between_clones() {
        let var = LevelVar::default();
        let setting = LevelSetting::from(&var);
        assert_eq!(setting.level(), Level::Info);

        var.set(Level::Warn);
        assert_eq!(setting.level(), Level::Warn);
        assert!(setting.is_dynamic());
    }

    #[test]
    fn level_var_is_visible_across_threads() {
        let var = LevelVar::new(Level::Debug);
        let writer = var.clone();
        std::thread::spawn(move || writer.set(Level::Error))
            .join()
            .unwrap();
        assert_eq!(var.level(), Level::Error);
    }
}
