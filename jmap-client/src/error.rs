// jmap-client/src/error.rs
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::MailboxRole;

pub type Result<T, E = JmapError> = std::result::Result<T, E>;

/// Method-level error returned in place of a method response (RFC 8620 §3.6.2)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodError {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Any further properties the server attached to the error
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {}", self.kind, description),
            None => f.write_str(&self.kind),
        }
    }
}

/// Per-record error found in `notCreated`/`notUpdated`/`notDestroyed` (RFC 8620 §5.3)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetError {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
}

impl fmt::Display for SetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description.as_deref().unwrap_or(&self.kind))?;
        if let Some(properties) = self.properties.as_ref().filter(|p| !p.is_empty()) {
            write!(f, " (Failed properties: {})", properties.join(", "))?;
        }
        Ok(())
    }
}

/// Which half of a `/set` call rejected a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperation {
    Create,
    Update,
    Destroy,
}

impl fmt::Display for SetOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
            Self::Destroy => f.write_str("destroy"),
        }
    }
}

#[derive(Debug, Error)]
pub enum JmapError {
    /// The HTTP exchange failed as a whole
    #[error("{}", transport_message(.status, .message))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Failed to discover JMAP session: HTTP {status}")]
    SessionDiscoveryFailed { status: u16 },

    #[error("No mail account found in session")]
    NoMailAccount,

    /// One call inside an otherwise successful batch failed
    #[error("JMAP method error in call {call_id}: {error}")]
    Method { call_id: String, error: MethodError },

    #[error("Failed to {operation} {id}: {error}")]
    SetRejected {
        operation: SetOperation,
        id: String,
        error: SetError,
    },

    #[error("Unknown call ID: {0}")]
    UnknownCallId(String),

    #[error("Unknown creation ID: {0}")]
    UnknownCreationId(String),

    #[error("Duplicate call ID: {0}")]
    DuplicateCallId(String),

    #[error("No {method} response for call ID {call_id}")]
    UnexpectedResponse { call_id: String, method: String },

    #[error("No {0} mailbox found")]
    MailboxRoleNotFound(MailboxRole),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not decode response to call {call_id}: {source}")]
    Decode {
        call_id: String,
        #[source]
        source: serde_json::Error,
    },
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("HTTP {}: {}", status, message),
        None => format!("HTTP error: {}", message),
    }
}

impl JmapError {
    /// Remote error type tag, for both method-level and record-level failures
    pub fn remote_kind(&self) -> Option<&str> {
        match self {
            Self::Method { error, .. } => Some(&error.kind),
            Self::SetRejected { error, .. } => Some(&error.kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_error_lists_failed_properties() {
        let error = SetError {
            kind: "invalidProperties".to_string(),
            description: Some("Bad recipient".to_string()),
            properties: Some(vec!["to".to_string(), "from".to_string()]),
        };
        assert_eq!(error.to_string(), "Bad recipient (Failed properties: to, from)");
    }

    #[test]
    fn test_set_error_falls_back_to_type() {
        let error = SetError {
            kind: "forbidden".to_string(),
            description: None,
            properties: None,
        };
        assert_eq!(error.to_string(), "forbidden");
    }

    #[test]
    fn test_transport_display() {
        let err = JmapError::Transport {
            status: Some(503),
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
    }
}
