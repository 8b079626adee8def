// jmap-client/src/session.rs
use tracing::debug;

use crate::capability;
use crate::error::{JmapError, Result};
use crate::http::{Credentials, HttpClient};
use crate::types::Session;

pub const WELL_KNOWN_PATH: &str = "/.well-known/jmap";

/// Outcome of session discovery
#[derive(Debug, Clone)]
pub struct DiscoveredSession {
    pub session: Session,
    pub api_url: String,
    /// Primary account for the mail capability
    pub account_id: String,
}

pub fn well_known_url(server_url: &str) -> String {
    let base = server_url.strip_suffix('/').unwrap_or(server_url);
    format!("{}{}", base, WELL_KNOWN_PATH)
}

/// Fetch the session resource for `server_url` and pick the mail account
pub async fn discover_session<C: HttpClient + ?Sized>(
    http: &C,
    server_url: &str,
    credentials: &Credentials,
) -> Result<DiscoveredSession> {
    let url = well_known_url(server_url);
    debug!(%url, "discovering JMAP session");

    let resp = http
        .get(&url, credentials)
        .await
        .map_err(|e| JmapError::Transport {
            status: None,
            message: e.message,
        })?;

    match resp.status {
        401 => return Err(JmapError::Unauthorized),
        status if !resp.is_success() => return Err(JmapError::SessionDiscoveryFailed { status }),
        _ => {}
    }

    let session: Session = serde_json::from_slice(&resp.body)?;
    let account_id = session
        .primary_account(capability::MAIL)
        .map(str::to_string)
        .ok_or(JmapError::NoMailAccount)?;

    debug!(api_url = %session.api_url, %account_id, "session discovered");
    Ok(DiscoveredSession {
        api_url: session.api_url.clone(),
        account_id,
        session,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockHttp;
    use serde_json::json;

    fn session_json() -> serde_json::Value {
        json!({
            "capabilities": {"urn:ietf:params:jmap:core": {}, "urn:ietf:params:jmap:mail": {}},
            "accounts": {"A1": {"name": "me@example.com", "isPersonal": true, "isReadOnly": false}},
            "primaryAccounts": {"urn:ietf:params:jmap:mail": "A1"},
            "username": "me@example.com",
            "apiUrl": "https://mail.example.com/jmap/api",
            "state": "s0"
        })
    }

    #[test]
    fn test_well_known_url_trims_one_slash() {
        assert_eq!(
            well_known_url("https://mail.example.com/"),
            "https://mail.example.com/.well-known/jmap"
        );
        assert_eq!(
            well_known_url("https://mail.example.com"),
            "https://mail.example.com/.well-known/jmap"
        );
    }

    #[tokio::test]
    async fn test_discover_session() {
        let http = MockHttp::new();
        http.push_json(session_json());

        let found = discover_session(&http, "https://mail.example.com/", &Credentials::basic("u", "p"))
            .await
            .unwrap();
        assert_eq!(found.account_id, "A1");
        assert_eq!(found.api_url, "https://mail.example.com/jmap/api");
        assert_eq!(found.session.username, "me@example.com");
        assert_eq!(http.urls(), vec!["GET https://mail.example.com/.well-known/jmap"]);
    }

    #[tokio::test]
    async fn test_discover_unauthorized() {
        let http = MockHttp::new();
        http.push_status(401, "Unauthorized");
        let err = discover_session(&http, "https://x", &Credentials::basic("u", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, JmapError::Unauthorized));
    }

    #[tokio::test]
    async fn test_discover_other_failure() {
        let http = MockHttp::new();
        http.push_status(500, "Internal Server Error");
        let err = discover_session(&http, "https://x", &Credentials::basic("u", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, JmapError::SessionDiscoveryFailed { status: 500 }));
    }

    #[tokio::test]
    async fn test_discover_without_mail_account() {
        let mut session = session_json();
        session["primaryAccounts"] = json!({"urn:ietf:params:jmap:core": "A1"});
        let http = MockHttp::new();
        http.push_json(session);
        let err = discover_session(&http, "https://x", &Credentials::basic("u", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, JmapError::NoMailAccount));
    }
}
