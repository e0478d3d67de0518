//! Capabilities consulted while initializing the global logger.

use std::collections::HashMap;

/// Reads environment variables.
///
/// The initializer never touches the process environment directly; production code passes
/// [`ProcessEnvironment`], tests pass a deterministic stand-in such as a `HashMap`.
pub trait EnvironmentReader {
    /// Returns the value of `name`, or an empty string if it is unset.
    fn getenv(&self, name: &str) -> String;
}

/// Reads the real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnvironment;

impl EnvironmentReader for ProcessEnvironment {
    fn getenv(&self, name: &str) -> String {
        std::env::var(name).unwrap_or_default()
    }
}

impl EnvironmentReader for HashMap<String, String> {
    fn getenv(&self, name: &str) -> String {
        self.get(name).cloned().unwrap_or_default()
    }
}

/// Reports whether the host runs in debug mode, which lowers the global threshold to
/// [`Level::Debug`][crate::Level::Debug].
pub trait DebugProvider {
    /// Returns `true` in debug mode.
    fn is_debug(&self) -> bool;
}

/// A [`DebugProvider`] that never reports debug mode.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDebug;

impl DebugProvider for NoDebug {
    fn is_debug(&self) -> bool {
        false
    }
}

impl DebugProvider for bool {
    fn is_debug(&self) -> bool {
        *self
    }
}

/// Parses a boolean token the way the `UNSTRUCTURED_LOGS` toggle is read.
///
/// `1`, `t` and `true` are true, `0`, `f` and `false` are false (all case-insensitive).
/// Anything else, including an empty value, is not a boolean.
pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}
