// webmail-client/src/client.rs
use anyhow::{anyhow, Context, Result};
use jmap_client::{
    find_by_role, Credentials, DeleteOutcome, Email, EmailGetOptions, EmailListItem,
    EmailQueryOptions, HttpClient, Identity, JmapClient, JmapError, Mailbox, MailboxRole,
    ReqwestClient, SearchOptions, SentEmail,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::compose::{ComposeMessage, DraftMessage};
use crate::config::{Config, MailConfig};

/// One page of a mailbox
#[derive(Debug, Clone, Serialize)]
pub struct EmailList {
    pub emails: Vec<EmailListItem>,
    pub total: u64,
    pub position: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub emails: Vec<EmailListItem>,
    pub total: u64,
}

/// Webmail actions over one logged-in account
pub struct Webmail<C: HttpClient = ReqwestClient> {
    inner: JmapClient<C>,
    mail: MailConfig,
}

impl Webmail<ReqwestClient> {
    /// Log in with a username and password over HTTPS
    pub async fn login(server_url: &str, username: &str, password: &str) -> Result<(Self, Config)> {
        Self::login_with(ReqwestClient::new(), server_url, username, password).await
    }

    /// Open the account stored in `config`, discovering the endpoint if needed
    pub async fn open(config: &mut Config) -> Result<Self> {
        Self::open_with(ReqwestClient::new(), config).await
    }
}

impl<C: HttpClient> Webmail<C> {
    pub fn new(inner: JmapClient<C>, mail: MailConfig) -> Self {
        Self { inner, mail }
    }

    /// Discover the session with Basic credentials and return the config to persist
    pub async fn login_with(
        http: C,
        server_url: &str,
        username: &str,
        password: &str,
    ) -> Result<(Self, Config)> {
        let credentials = Credentials::basic(username, password);
        let token = match &credentials {
            Credentials::Basic(token) => token.clone(),
            Credentials::Bearer(token) => token.clone(),
        };

        let (inner, discovered) = JmapClient::connect(http, server_url, credentials)
            .await
            .with_context(|| format!("Failed to log in to {}", server_url))?;
        debug!(username, account_id = %discovered.account_id, "logged in");

        let config = Config {
            server_url: Some(server_url.to_string()),
            username: Some(username.to_string()),
            access_token: token,
            api_url: Some(discovered.api_url),
            account_id: Some(discovered.account_id),
            mail: MailConfig::default(),
        };
        Ok((Self::new(inner, config.mail.clone()), config))
    }

    /// Open the stored account; caches the discovered endpoint into `config`
    pub async fn open_with(http: C, config: &mut Config) -> Result<Self> {
        if !config.is_logged_in() {
            return Err(anyhow!("Not logged in. Run: webmail setup"));
        }
        let credentials = Credentials::Basic(config.access_token.clone());

        let inner = match (&config.api_url, &config.account_id) {
            (Some(api_url), Some(account_id)) => {
                JmapClient::new(http, api_url.clone(), account_id.clone(), credentials)
            }
            _ => {
                let server_url = config
                    .server_url
                    .clone()
                    .ok_or_else(|| anyhow!("No server URL configured"))?;
                let (inner, discovered) = JmapClient::connect(http, &server_url, credentials)
                    .await
                    .with_context(|| format!("Failed to connect to {}", server_url))?;
                config.api_url = Some(discovered.api_url);
                config.account_id = Some(discovered.account_id);
                inner
            }
        };
        Ok(Self::new(inner, config.mail.clone()))
    }

    pub fn account_id(&self) -> &str {
        self.inner.account_id()
    }

    pub fn jmap(&self) -> &JmapClient<C> {
        &self.inner
    }

    // Mailboxes

    pub async fn mailboxes(&self) -> Result<Vec<Mailbox>> {
        Ok(self.inner.mailbox_get_all().await?.list)
    }

    /// Resolve a mailbox given by ID, role or (case-insensitive) name
    pub async fn resolve_mailbox(&self, name: &str) -> Result<Mailbox> {
        let mailboxes = self.mailboxes().await?;
        let lower = name.to_lowercase();
        mailboxes
            .iter()
            .find(|m| m.id == name)
            .or_else(|| {
                mailboxes
                    .iter()
                    .find(|m| m.role.is_some_and(|r| r.as_str() == lower))
            })
            .or_else(|| mailboxes.iter().find(|m| m.name.to_lowercase() == lower))
            .cloned()
            .ok_or_else(|| anyhow!("Mailbox not found: {}", name))
    }

    pub async fn create_mailbox(&self, name: &str, parent_id: Option<&str>) -> Result<Mailbox> {
        Ok(self.inner.mailbox_create(name, parent_id).await?)
    }

    pub async fn delete_mailbox(&self, id: &str) -> Result<()> {
        Ok(self.inner.mailbox_destroy(id).await?)
    }

    // Emails

    pub async fn list_emails(
        &self,
        mailbox_id: &str,
        limit: Option<u64>,
        position: Option<u64>,
    ) -> Result<EmailList> {
        let options = EmailQueryOptions {
            limit: limit.unwrap_or(self.mail.page_size),
            position: position.unwrap_or(0),
            ..EmailQueryOptions::in_mailbox(mailbox_id)
        };
        let page = self.inner.email_query_and_get(options).await?;
        Ok(EmailList {
            total: page.query.total.unwrap_or(0),
            position: page.query.position,
            emails: page.emails,
        })
    }

    pub async fn get_email(&self, id: &str) -> Result<Option<Email>> {
        let options = EmailGetOptions {
            max_body_value_bytes: self.mail.max_body_value_bytes,
            ..Default::default()
        };
        Ok(self.inner.email_get_one(id, &options).await?)
    }

    pub async fn search(
        &self,
        query: &str,
        mailbox_id: Option<&str>,
        limit: Option<u64>,
    ) -> Result<SearchResults> {
        let options = SearchOptions {
            in_mailbox: mailbox_id.map(str::to_string),
            limit: limit.unwrap_or(self.mail.page_size),
        };
        let page = self.inner.email_search(query, &options).await?;
        Ok(SearchResults {
            total: page.total(),
            emails: page.emails,
        })
    }

    pub async fn mark_read(&self, id: &str) -> Result<()> {
        Ok(self.inner.email_mark_read(id).await?)
    }

    pub async fn mark_unread(&self, id: &str) -> Result<()> {
        Ok(self.inner.email_mark_unread(id).await?)
    }

    pub async fn set_starred(&self, id: &str, starred: bool) -> Result<()> {
        if starred {
            self.inner.email_star(id).await?;
        } else {
            self.inner.email_unstar(id).await?;
        }
        Ok(())
    }

    /// Move into `to`; with `from`, only that membership is replaced
    pub async fn move_email(&self, id: &str, from: Option<&str>, to: &str) -> Result<()> {
        match from {
            Some(from) => self.inner.email_move_between(id, from, to).await?,
            None => self.inner.email_move_to(id, to).await?,
        }
        Ok(())
    }

    pub async fn archive(&self, id: &str) -> Result<String> {
        Ok(self.inner.email_archive(id).await?)
    }

    pub async fn delete(&self, id: &str, permanent: bool) -> Result<DeleteOutcome> {
        Ok(self.inner.email_delete(id, permanent).await?)
    }

    // Sending

    pub async fn identities(&self) -> Result<Vec<Identity>> {
        Ok(self.inner.identity_get_all().await?.list)
    }

    /// Compose and send in one batch, filing the message under sent
    pub async fn send(&self, message: &ComposeMessage) -> Result<SentEmail> {
        message.validate()?;

        let identity = self
            .identities()
            .await?
            .into_iter()
            .find(|i| i.id == message.identity_id)
            .ok_or_else(|| anyhow!("Identity not found: {}", message.identity_id))?;

        let mailboxes = self.mailboxes().await?;
        let sent = find_by_role(&mailboxes, MailboxRole::Sent)
            .ok_or(JmapError::MailboxRoleNotFound(MailboxRole::Sent))?;
        // Without a drafts mailbox the email is created directly in sent
        let origin = find_by_role(&mailboxes, MailboxRole::Drafts).unwrap_or(sent);

        let email = message.to_email(&identity, &origin.id);
        let result = self
            .inner
            .email_submission_create_and_send(&identity.id, &sent.id, email)
            .await
            .context("Failed to send email")?;

        if !result.moved_to_sent {
            warn!(email_id = %result.email_id, "sent email was not filed under sent");
        }
        Ok(result)
    }

    /// Store a draft, replacing `draft_id` when set; returns the new draft ID
    pub async fn save_draft(&self, draft: &DraftMessage) -> Result<String> {
        let mailboxes = self.mailboxes().await?;
        let drafts = find_by_role(&mailboxes, MailboxRole::Drafts)
            .ok_or(JmapError::MailboxRoleNotFound(MailboxRole::Drafts))?;

        let identity = self
            .identities()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No identity found"))?;

        let email = draft.to_email(&identity, &drafts.id);
        let saved = match &draft.draft_id {
            Some(old) => {
                debug!(draft_id = %old, "replacing draft");
                self.inner.email_replace_draft(old, email).await
            }
            None => self.inner.email_create_draft(email).await,
        };
        let id = saved.context("Failed to save draft")?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{batch_calls, mailboxes, webmail, MockHttp, ACCOUNT_ID, API_URL};
    use jmap_client::EmailAddress;
    use serde_json::json;

    fn identities() -> serde_json::Value {
        json!([["Identity/get", {
            "accountId": ACCOUNT_ID,
            "list": [
                {"id": "I1", "name": "Me", "email": "me@example.com"},
                {"id": "I2", "name": "", "email": "alias@example.com"}
            ]
        }, "call-0"]])
    }

    fn message() -> ComposeMessage {
        ComposeMessage {
            identity_id: "I2".to_string(),
            to: vec![EmailAddress::new("you@example.com")],
            subject: "Hello".to_string(),
            text_body: Some("Hi there".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_login_stores_basic_token_and_endpoint() {
        let http = MockHttp::new();
        http.push_json(json!({
            "primaryAccounts": {"urn:ietf:params:jmap:mail": ACCOUNT_ID},
            "apiUrl": API_URL
        }));

        let (client, config) = Webmail::login_with(http, "https://mail.example.com/", "me", "pw")
            .await
            .unwrap();
        assert_eq!(client.account_id(), ACCOUNT_ID);
        assert_eq!(config.access_token, "bWU6cHc=");
        assert_eq!(config.api_url.as_deref(), Some(API_URL));
        assert_eq!(
            client.jmap().http().urls(),
            vec!["GET https://mail.example.com/.well-known/jmap"]
        );
    }

    #[tokio::test]
    async fn test_login_rejected_credentials() {
        let http = MockHttp::new();
        http.push_status(401, "Unauthorized");

        let err = Webmail::login_with(http, "https://mail.example.com", "me", "bad")
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<JmapError>(),
            Some(JmapError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_open_uses_cached_endpoint() {
        let mut config = Config {
            access_token: "dTpw".to_string(),
            api_url: Some(API_URL.to_string()),
            account_id: Some(ACCOUNT_ID.to_string()),
            ..Default::default()
        };
        let client = Webmail::open_with(MockHttp::new(), &mut config).await.unwrap();
        assert_eq!(client.account_id(), ACCOUNT_ID);
        assert!(client.jmap().http().urls().is_empty());
    }

    #[tokio::test]
    async fn test_open_requires_login() {
        let mut config = Config::default();
        assert!(Webmail::open_with(MockHttp::new(), &mut config).await.is_err());
    }

    #[tokio::test]
    async fn test_send_resolves_identity_and_mailboxes() {
        let client = webmail();
        let http = client.jmap().http();
        http.push_batch(identities());
        http.push_batch(mailboxes(true));
        http.push_batch(json!([
            ["Email/set", {"accountId": ACCOUNT_ID, "created": {"email": {"id": "E1"}}}, "call-0"],
            ["EmailSubmission/set", {"accountId": ACCOUNT_ID, "created": {"submission": {"id": "S1"}}}, "call-1"],
            ["Email/set", {"accountId": ACCOUNT_ID, "updated": {"E1": null}}, "call-1"]
        ]));

        let sent = client.send(&message()).await.unwrap();
        assert_eq!(sent.email_id, "E1");

        let calls = batch_calls(http, 2);
        let email = &calls[0][1]["create"]["email"];
        assert_eq!(email["mailboxIds"], json!({"drafts": true}));
        assert_eq!(email["from"], json!([{"name": null, "email": "alias@example.com"}]));
        assert_eq!(calls[1][1]["create"]["submission"]["identityId"], "I2");
    }

    #[tokio::test]
    async fn test_send_unknown_identity() {
        let client = webmail();
        client.jmap().http().push_batch(identities());

        let message = ComposeMessage {
            identity_id: "I9".to_string(),
            ..message()
        };
        let err = client.send(&message).await.unwrap_err();
        assert!(err.to_string().contains("Identity not found"));
        assert_eq!(client.jmap().http().batches().len(), 1);
    }

    #[tokio::test]
    async fn test_send_without_sent_mailbox() {
        let client = webmail();
        let http = client.jmap().http();
        http.push_batch(identities());
        http.push_batch(json!([["Mailbox/get", {
            "accountId": ACCOUNT_ID,
            "list": [{"id": "inbox", "name": "Inbox", "role": "inbox"}]
        }, "call-0"]]));

        let err = client.send(&message()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JmapError>(),
            Some(JmapError::MailboxRoleNotFound(MailboxRole::Sent))
        ));
    }

    #[tokio::test]
    async fn test_save_draft_replaces_previous() {
        let client = webmail();
        let http = client.jmap().http();
        http.push_batch(mailboxes(true));
        http.push_batch(identities());
        http.push_batch(json!([["Email/set", {
            "accountId": ACCOUNT_ID,
            "created": {"draft": {"id": "D2"}},
            "destroyed": ["D1"]
        }, "call-0"]]));

        let draft = DraftMessage {
            subject: Some("WIP".to_string()),
            draft_id: Some("D1".to_string()),
            ..Default::default()
        };
        assert_eq!(client.save_draft(&draft).await.unwrap(), "D2");

        assert_eq!(http.batches().len(), 3);
        let calls = batch_calls(http, 2);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][1]["destroy"], json!(["D1"]));
        let created = &calls[0][1]["create"]["draft"];
        assert_eq!(created["mailboxIds"], json!({"drafts": true}));
        assert_eq!(created["keywords"], json!({"$draft": true}));
        assert_eq!(created["from"][0]["email"], "me@example.com");
    }

    #[tokio::test]
    async fn test_save_draft_requires_drafts_mailbox() {
        let client = webmail();
        client.jmap().http().push_batch(mailboxes(false));

        let err = client.save_draft(&DraftMessage::default()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JmapError>(),
            Some(JmapError::MailboxRoleNotFound(MailboxRole::Drafts))
        ));
    }

    #[tokio::test]
    async fn test_list_emails_page() {
        let client = webmail();
        let http = client.jmap().http();
        http.push_batch(json!([
            ["Email/query", {"accountId": ACCOUNT_ID, "ids": ["e3"], "position": 20, "total": 21}, "call-0"],
            ["Email/get", {"accountId": ACCOUNT_ID, "list": [{"id": "e3"}]}, "call-1"]
        ]));

        let page = client.list_emails("inbox", None, Some(20)).await.unwrap();
        assert_eq!(page.total, 21);
        assert_eq!(page.position, 20);
        assert_eq!(page.emails[0].id, "e3");
        assert_eq!(batch_calls(http, 0)[0][1]["limit"], 50);
    }

    #[tokio::test]
    async fn test_search_total_falls_back_to_hits() {
        let client = webmail();
        client.jmap().http().push_batch(json!([
            ["Email/query", {"accountId": ACCOUNT_ID, "ids": ["e1", "e2"]}, "call-0"],
            ["Email/get", {"accountId": ACCOUNT_ID, "list": [{"id": "e1"}, {"id": "e2"}]}, "call-1"]
        ]));

        let results = client.search("invoice", None, None).await.unwrap();
        assert_eq!(results.total, 2);
    }

    #[tokio::test]
    async fn test_resolve_mailbox_by_role_or_name() {
        let client = webmail();
        let http = client.jmap().http();
        http.push_batch(mailboxes(true));
        http.push_batch(mailboxes(true));

        assert_eq!(client.resolve_mailbox("trash").await.unwrap().id, "trash");
        assert_eq!(client.resolve_mailbox("lists").await.unwrap().id, "lists");
    }
}
