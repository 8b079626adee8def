// jmap-client/src/id.rs
use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PREFIX: &str = "call";

/// Opaque method call identifier, unique within one request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CallId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CallId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Monotonic call ID source owned by a single request builder.
///
/// IDs take the form `<prefix>-<n>`. Each builder starts its own sequence, so
/// two builders in flight at once never share state.
#[derive(Debug, Default, Clone)]
pub struct CallIdGenerator {
    next: u64,
}

impl CallIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, prefix: &str) -> CallId {
        let id = format!("{}-{}", prefix, self.next);
        self.next += 1;
        CallId(id)
    }

    /// Restart the sequence at zero
    pub fn reset(&mut self) {
        self.next = 0;
    }
}
