// webmail-cli/src/output.rs
use serde::Serialize;
use std::fmt;
use webmail_client::JmapError;

/// Standard JSON response envelope
#[derive(Debug, Serialize)]
pub struct Response<T> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<Meta>,
}

impl<T> Response<T> {
    pub fn ok(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            meta: None,
        }
    }

    pub fn ok_with_meta(result: T, meta: Meta) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            meta: Some(meta),
        }
    }

    pub fn error(error: ErrorResponse) -> Response<()> {
        Response::<()> {
            ok: false,
            result: None,
            error: Some(error),
            meta: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    type_: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
    /// Error type reported by the JMAP server
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_type: Option<String>,
}

impl ErrorResponse {
    fn new(type_: &'static str, message: String, retryable: bool) -> Self {
        Self {
            type_,
            message,
            retryable: Some(retryable),
            remote_type: None,
        }
    }

    pub fn safety_rejected(message: String) -> Self {
        Self::new("safety_rejected", message, false)
    }

    pub fn not_found(message: String) -> Self {
        Self::new("not_found", message, false)
    }

    pub fn validation_failed(message: String) -> Self {
        Self::new("validation_failed", message, false)
    }

    /// Classify an error chain, looking through context for a [`JmapError`]
    pub fn from_error(err: &anyhow::Error) -> (Self, ExitCode) {
        let message = format!("{:#}", err);
        let Some(jmap) = err.downcast_ref::<JmapError>() else {
            return (Self::new("error", message, false), ExitCode::PermanentError);
        };

        let (type_, exit) = match jmap {
            JmapError::Unauthorized => ("unauthorized", ExitCode::PermanentError),
            JmapError::Transport { status, .. } => match status {
                Some(s) if *s == 429 || *s >= 500 => ("transport_error", ExitCode::TransientError),
                None => ("transport_error", ExitCode::TransientError),
                Some(_) => ("transport_error", ExitCode::PermanentError),
            },
            JmapError::SessionDiscoveryFailed { .. } | JmapError::NoMailAccount => {
                ("session_error", ExitCode::PermanentError)
            }
            JmapError::Method { .. } | JmapError::SetRejected { .. } => {
                ("remote_error", ExitCode::PermanentError)
            }
            JmapError::MailboxRoleNotFound(_) => ("not_found", ExitCode::PermanentError),
            _ => ("protocol_error", ExitCode::PermanentError),
        };

        let mut error = Self::new(type_, message, matches!(exit, ExitCode::TransientError));
        error.remote_type = jmap.remote_kind().map(str::to_string);
        (error, exit)
    }
}

#[derive(Debug, Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

/// Exit codes for agent decision making
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    TransientError = 1,
    PermanentError = 2,
    SafetyRejected = 3,
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::TransientError => write!(f, "transient_error"),
            Self::PermanentError => write!(f, "permanent_error"),
            Self::SafetyRejected => write!(f, "safety_rejected"),
        }
    }
}

impl ExitCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

// Print response to stdout
pub fn print_response<T: Serialize>(resp: &Response<T>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(resp)?);
    Ok(())
}

/// Print an error envelope and exit with `code`
pub fn fail(error: ErrorResponse, code: ExitCode) -> ! {
    let _ = print_response(&Response::<()>::error(error));
    std::process::exit(code.code());
}

/// Print a styled success message
pub fn print_success(message: &str) {
    let term = console::Term::stderr();
    let _ = term.write_line(&format!("{} {}", console::style("✓").green(), message));
}

/// Print a styled error message
pub fn print_error(message: &str) {
    let term = console::Term::stderr();
    let _ = term.write_line(&format!("{} {}", console::style("Error:").red(), message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_ok_envelope() {
        let resp = Response::ok_with_meta(
            vec!["e1"],
            Meta {
                account_id: Some("A1".to_string()),
                dry_run: None,
            },
        );
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"ok":true,"result":["e1"],"meta":{"account_id":"A1"}}"#
        );
    }

    #[test]
    fn test_unauthorized_through_context() {
        let err = Err::<(), _>(JmapError::Unauthorized)
            .context("Failed to log in")
            .unwrap_err();
        let (error, code) = ErrorResponse::from_error(&err);
        assert_eq!(error.type_, "unauthorized");
        assert_eq!(error.message, "Failed to log in: Invalid credentials");
        assert_eq!(code, ExitCode::PermanentError);
    }

    #[test]
    fn test_server_failure_is_transient() {
        let err = anyhow::Error::from(JmapError::Transport {
            status: Some(503),
            message: "Service Unavailable".to_string(),
        });
        let (error, code) = ErrorResponse::from_error(&err);
        assert_eq!(error.retryable, Some(true));
        assert_eq!(code, ExitCode::TransientError);
    }

    #[test]
    fn test_plain_error() {
        let err = anyhow::anyhow!("Mailbox not found: Foo");
        let (error, code) = ErrorResponse::from_error(&err);
        assert_eq!(error.type_, "error");
        assert!(error.remote_type.is_none());
        assert_eq!(code, ExitCode::PermanentError);
    }
}
