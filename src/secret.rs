//! In-memory signing PIN.
use std::fmt;

/// Placeholder shown wherever the PIN would otherwise be rendered.
pub const REDACTED: &str = "***";

/// Digital signature PIN held for the duration of one run.
///
/// The value is only reachable through [`Pin::expose`]; `Debug` and
/// `Display` print a placeholder so the PIN cannot leak into logs or error
/// chains.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pin({REDACTED})")
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}
