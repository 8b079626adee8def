// jmap-client/src/methods/email.rs
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::single;
use crate::capability;
use crate::client::JmapClient;
use crate::error::{JmapError, Result};
use crate::http::HttpClient;
use crate::request::{Argument, Arguments, PatchObject, RequestBuilder};
use crate::types::{
    keyword, ChangesResponse, Comparator, Email, EmailCreate, EmailFilter, EmailFilterCondition,
    EmailListItem, GetResponse, Keywords, MailboxRole, QueryResponse, SetResponse,
    EMAIL_FULL_PROPERTIES, EMAIL_LIST_PROPERTIES,
};

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const DEFAULT_MAX_BODY_VALUE_BYTES: u64 = 1024 * 1024;

/// Query half and property set of a query-then-get batch
#[derive(Debug, Clone)]
pub struct EmailQueryOptions {
    pub filter: Option<EmailFilter>,
    pub sort: Vec<Comparator>,
    pub position: u64,
    pub limit: u64,
    pub properties: Vec<String>,
}

impl Default for EmailQueryOptions {
    fn default() -> Self {
        Self {
            filter: None,
            sort: vec![Comparator::descending("receivedAt")],
            position: 0,
            limit: DEFAULT_PAGE_SIZE,
            properties: EMAIL_LIST_PROPERTIES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl EmailQueryOptions {
    pub fn in_mailbox(mailbox_id: impl Into<String>) -> Self {
        Self {
            filter: Some(EmailFilter::in_mailbox(mailbox_id)),
            ..Default::default()
        }
    }
}

/// One page of a mailbox listing or search
#[derive(Debug, Clone)]
pub struct EmailPage {
    pub query: QueryResponse,
    pub emails: Vec<EmailListItem>,
}

impl EmailPage {
    /// Server total, or the number of hits when none was calculated
    pub fn total(&self) -> u64 {
        self.query.total.unwrap_or(self.emails.len() as u64)
    }
}

#[derive(Debug, Clone)]
pub struct EmailGetOptions {
    pub properties: Vec<String>,
    pub max_body_value_bytes: u64,
}

impl Default for EmailGetOptions {
    fn default() -> Self {
        Self {
            properties: EMAIL_FULL_PROPERTIES.iter().map(|p| p.to_string()).collect(),
            max_body_value_bytes: DEFAULT_MAX_BODY_VALUE_BYTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub in_mailbox: Option<String>,
    pub limit: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            in_mailbox: None,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// What [`JmapClient::email_delete`] did with the email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DeleteOutcome {
    MovedToTrash { mailbox_id: String },
    Destroyed,
}

impl<C: HttpClient> JmapClient<C> {
    /// Query and fetch one page in a single batch.
    ///
    /// The get call selects its IDs through a back-reference to the query's
    /// `/ids`, so both calls travel in one round trip.
    pub async fn email_query_and_get(&self, options: EmailQueryOptions) -> Result<EmailPage> {
        let mut builder = RequestBuilder::new();
        builder.add_capability(capability::MAIL);

        let mut query = Arguments::account(self.account_id())
            .serialized("sort", &options.sort)?
            .arg("position", options.position)
            .arg("limit", options.limit)
            .arg("calculateTotal", true);
        if let Some(filter) = &options.filter {
            query = query.serialized("filter", filter)?;
        }
        let query_id = builder.call("Email/query", query);

        let ids = builder.reference(&query_id, "/ids")?;
        let get = Arguments::account(self.account_id())
            .argument::<Value>("ids", Argument::Result(ids))
            .arg("properties", options.properties);
        let get_id = builder.call("Email/get", get);

        debug!(limit = options.limit, position = options.position, "querying emails");
        let parser = self.execute(builder).await?;
        let query: QueryResponse = parser.get(&query_id)?;
        let got: GetResponse<EmailListItem> = parser.get(&get_id)?;
        Ok(EmailPage {
            query,
            emails: got.list,
        })
    }

    /// Fetch emails with their body values
    pub async fn email_get(
        &self,
        ids: &[String],
        options: &EmailGetOptions,
    ) -> Result<GetResponse<Email>> {
        let args = Arguments::account(self.account_id())
            .arg("ids", ids.to_vec())
            .arg("properties", options.properties.clone())
            .arg("fetchTextBodyValues", true)
            .arg("fetchHTMLBodyValues", true)
            .arg("fetchAllBodyValues", true)
            .arg("maxBodyValueBytes", options.max_body_value_bytes);
        self.call("Email/get", args, &[capability::MAIL]).await
    }

    /// Single email, or `None` when the server reports it not found
    pub async fn email_get_one(&self, id: &str, options: &EmailGetOptions) -> Result<Option<Email>> {
        let resp = self.email_get(&[id.to_string()], options).await?;
        Ok(resp.list.into_iter().find(|e| e.id == id))
    }

    /// Apply one patch to one email
    pub async fn email_update(&self, id: &str, patch: PatchObject) -> Result<()> {
        debug!(id, paths = patch.len(), "updating email");
        let args = Arguments::account(self.account_id()).arg("update", single(id, patch.into_value()));
        let resp: SetResponse = self.call("Email/set", args, &[capability::MAIL]).await?;
        resp.check()
    }

    /// Replace the whole keyword map
    pub async fn email_set_keywords(&self, id: &str, keywords: &Keywords) -> Result<()> {
        let patch = PatchObject::new().set("keywords", serde_json::to_value(keywords)?);
        self.email_update(id, patch).await
    }

    pub async fn email_add_keyword(&self, id: &str, keyword: &str) -> Result<()> {
        self.email_update(id, PatchObject::new().keyword(keyword, true)).await
    }

    pub async fn email_remove_keyword(&self, id: &str, keyword: &str) -> Result<()> {
        self.email_update(id, PatchObject::new().keyword(keyword, false)).await
    }

    pub async fn email_mark_read(&self, id: &str) -> Result<()> {
        self.email_add_keyword(id, keyword::SEEN).await
    }

    pub async fn email_mark_unread(&self, id: &str) -> Result<()> {
        self.email_remove_keyword(id, keyword::SEEN).await
    }

    pub async fn email_star(&self, id: &str) -> Result<()> {
        self.email_add_keyword(id, keyword::FLAGGED).await
    }

    pub async fn email_unstar(&self, id: &str) -> Result<()> {
        self.email_remove_keyword(id, keyword::FLAGGED).await
    }

    /// Make `mailbox_id` the email's only mailbox
    pub async fn email_move_to(&self, id: &str, mailbox_id: &str) -> Result<()> {
        let patch = PatchObject::new().set("mailboxIds", single(mailbox_id, Value::Bool(true)));
        self.email_update(id, patch).await
    }

    /// Move between two mailboxes in one update, leaving other memberships
    pub async fn email_move_between(&self, id: &str, from: &str, to: &str) -> Result<()> {
        let patch = PatchObject::new().mailbox(from, false).mailbox(to, true);
        self.email_update(id, patch).await
    }

    /// Permanently destroy emails, returning the destroyed IDs
    pub async fn email_destroy(&self, ids: &[String]) -> Result<Vec<String>> {
        let args = Arguments::account(self.account_id()).arg("destroy", ids.to_vec());
        let resp: SetResponse = self.call("Email/set", args, &[capability::MAIL]).await?;
        resp.check()?;
        Ok(resp.destroyed.unwrap_or_default())
    }

    /// Create a draft and return its server ID; `$draft` is always set
    pub async fn email_create_draft(&self, draft: EmailCreate) -> Result<String> {
        self.set_draft(draft, None).await
    }

    /// Create a draft and destroy `old_id` in the same `Email/set`.
    ///
    /// A rejected create fails the call. A draft that could not be destroyed
    /// is only logged, since the new draft is already stored.
    pub async fn email_replace_draft(&self, old_id: &str, draft: EmailCreate) -> Result<String> {
        self.set_draft(draft, Some(old_id)).await
    }

    async fn set_draft(&self, mut draft: EmailCreate, replaces: Option<&str>) -> Result<String> {
        const CREATION_ID: &str = "draft";

        draft.keywords.insert(keyword::DRAFT.to_string(), true);
        let mut args = Arguments::account(self.account_id())
            .arg("create", single(CREATION_ID, serde_json::to_value(&draft)?));
        if let Some(old_id) = replaces {
            args = args.arg("destroy", vec![old_id]);
        }
        let mut resp: SetResponse = self.call("Email/set", args, &[capability::MAIL]).await?;
        let created = resp.take_created(CREATION_ID)?;
        if let Err(e) = resp.check() {
            warn!(id = %created.id, error = %e, "draft saved but previous draft kept");
        }
        debug!(id = %created.id, replaced = ?replaces, "draft saved");
        Ok(created.id)
    }

    pub async fn email_changes(
        &self,
        since_state: &str,
        max_changes: Option<u64>,
    ) -> Result<ChangesResponse> {
        let mut args = Arguments::account(self.account_id()).arg("sinceState", since_state);
        if let Some(max) = max_changes {
            args = args.arg("maxChanges", max);
        }
        self.call("Email/changes", args, &[capability::MAIL]).await
    }

    /// Full-text search, optionally within one mailbox
    pub async fn email_search(&self, text: &str, options: &SearchOptions) -> Result<EmailPage> {
        let condition = EmailFilterCondition {
            text: Some(text.to_string()),
            in_mailbox: options.in_mailbox.clone(),
            ..Default::default()
        };
        self.email_query_and_get(EmailQueryOptions {
            filter: Some(condition.into()),
            limit: options.limit,
            ..Default::default()
        })
        .await
    }

    /// Move into the archive mailbox, which must exist
    pub async fn email_archive(&self, id: &str) -> Result<String> {
        let archive = self
            .mailbox_find_by_role(MailboxRole::Archive)
            .await?
            .ok_or(JmapError::MailboxRoleNotFound(MailboxRole::Archive))?;
        self.email_move_to(id, &archive.id).await?;
        Ok(archive.id)
    }

    /// Move to trash, or destroy when `permanent` is set or there is no trash
    pub async fn email_delete(&self, id: &str, permanent: bool) -> Result<DeleteOutcome> {
        if !permanent {
            if let Some(trash) = self.mailbox_find_by_role(MailboxRole::Trash).await? {
                self.email_move_to(id, &trash.id).await?;
                return Ok(DeleteOutcome::MovedToTrash {
                    mailbox_id: trash.id,
                });
            }
            debug!(id, "no trash mailbox, destroying");
        }
        self.email_destroy(&[id.to_string()]).await?;
        Ok(DeleteOutcome::Destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetOperation;
    use crate::test_support::{self, calls, mailboxes_response};
    use serde_json::json;

    /// Update response acknowledging `id`
    fn updated(id: &str) -> Value {
        json!([["Email/set", {"accountId": "A1", "updated": {id: null}}, "call-0"]])
    }

    fn list_item(id: &str) -> Value {
        json!({"id": id, "mailboxIds": {"inbox": true}, "keywords": {}, "subject": id})
    }

    #[tokio::test]
    async fn test_query_and_get_single_batch_with_back_reference() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Email/query", {"accountId": "A1", "ids": ["e1", "e2"], "position": 0, "total": 120}, "call-0"],
            ["Email/get", {"accountId": "A1", "list": [list_item("e1"), list_item("e2")]}, "call-1"]
        ]));

        let options = EmailQueryOptions {
            limit: 2,
            ..EmailQueryOptions::in_mailbox("inbox")
        };
        let page = client.email_query_and_get(options).await.unwrap();
        assert_eq!(page.emails.len(), 2);
        assert_eq!(page.total(), 120);

        let batches = client.http().batches();
        assert_eq!(batches.len(), 1);
        let calls = calls(&client, 0);
        assert_eq!(calls.len(), 2);

        let query = &calls[0][1];
        assert_eq!(calls[0][0], "Email/query");
        assert_eq!(query["filter"], json!({"inMailbox": "inbox"}));
        assert_eq!(query["sort"], json!([{"property": "receivedAt", "isAscending": false}]));
        assert_eq!(query["limit"], 2);
        assert_eq!(query["calculateTotal"], true);

        let get = &calls[1][1];
        assert_eq!(calls[1][0], "Email/get");
        assert!(get.get("ids").is_none());
        assert_eq!(
            get["#ids"],
            json!({"resultOf": "call-0", "name": "Email/query", "path": "/ids"})
        );
    }

    #[tokio::test]
    async fn test_query_defaults() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Email/query", {"accountId": "A1", "ids": []}, "call-0"],
            ["Email/get", {"accountId": "A1", "list": []}, "call-1"]
        ]));

        let page = client.email_query_and_get(EmailQueryOptions::default()).await.unwrap();
        assert_eq!(page.total(), 0);

        let query = &calls(&client, 0)[0][1];
        assert!(query.get("filter").is_none());
        assert_eq!(query["limit"], DEFAULT_PAGE_SIZE);
        assert_eq!(query["position"], 0);
    }

    #[tokio::test]
    async fn test_get_requests_body_values() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Email/get", {"accountId": "A1", "list": [], "notFound": ["e9"]}, "call-0"]
        ]));

        let email = client
            .email_get_one("e9", &EmailGetOptions::default())
            .await
            .unwrap();
        assert!(email.is_none());

        let args = &calls(&client, 0)[0][1];
        assert_eq!(args["ids"], json!(["e9"]));
        assert_eq!(args["fetchHTMLBodyValues"], true);
        assert_eq!(args["maxBodyValueBytes"], DEFAULT_MAX_BODY_VALUE_BYTES);
    }

    #[tokio::test]
    async fn test_move_between_is_one_patch() {
        let client = test_support::client();
        client.http().push_batch(updated("e1"));

        client.email_move_between("e1", "A", "B").await.unwrap();

        let calls = calls(&client, 0);
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0][1]["update"],
            json!({"e1": {"mailboxIds/A": null, "mailboxIds/B": true}})
        );
    }

    #[tokio::test]
    async fn test_keyword_helpers_use_patch_paths() {
        let client = test_support::client();
        client.http().push_batch(updated("e1"));
        client.http().push_batch(updated("e1"));

        client.email_mark_read("e1").await.unwrap();
        client.email_unstar("e1").await.unwrap();

        assert_eq!(
            calls(&client, 0)[0][1]["update"],
            json!({"e1": {"keywords/$seen": true}})
        );
        assert_eq!(
            calls(&client, 1)[0][1]["update"],
            json!({"e1": {"keywords/$flagged": null}})
        );
    }

    #[tokio::test]
    async fn test_update_rejection_carries_properties() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Email/set", {
                "accountId": "A1",
                "notUpdated": {"e1": {"type": "invalidProperties", "properties": ["keywords"]}}
            }, "call-0"]
        ]));

        let err = client.email_mark_read("e1").await.unwrap_err();
        assert!(matches!(
            &err,
            JmapError::SetRejected { operation: SetOperation::Update, id, .. } if id == "e1"
        ));
        assert!(err.to_string().contains("Failed properties: keywords"));
    }

    #[tokio::test]
    async fn test_delete_moves_to_trash_when_present() {
        let client = test_support::client();
        client.http().push_batch(mailboxes_response("call-0"));
        client.http().push_batch(updated("e1"));

        let outcome = client.email_delete("e1", false).await.unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome::MovedToTrash {
                mailbox_id: "trash".to_string()
            }
        );

        let set = &calls(&client, 1)[0][1];
        assert!(set.get("destroy").is_none());
        assert_eq!(set["update"], json!({"e1": {"mailboxIds": {"trash": true}}}));
    }

    #[tokio::test]
    async fn test_delete_destroys_without_trash() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Mailbox/get", {
                "accountId": "A1",
                "list": [{"id": "inbox", "name": "Inbox", "role": "inbox"}]
            }, "call-0"]
        ]));
        client.http().push_batch(json!([
            ["Email/set", {"accountId": "A1", "destroyed": ["e1"]}, "call-0"]
        ]));

        let outcome = client.email_delete("e1", false).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Destroyed);

        let set = &calls(&client, 1)[0][1];
        assert_eq!(set["destroy"], json!(["e1"]));
        assert!(set.get("update").is_none());
    }

    #[tokio::test]
    async fn test_permanent_delete_skips_mailbox_lookup() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Email/set", {"accountId": "A1", "destroyed": ["e1"]}, "call-0"]
        ]));

        client.email_delete("e1", true).await.unwrap();
        assert_eq!(client.http().batches().len(), 1);
        assert_eq!(calls(&client, 0)[0][0], "Email/set");
    }

    #[tokio::test]
    async fn test_archive_requires_archive_mailbox() {
        let client = test_support::client();
        client.http().push_batch(mailboxes_response("call-0"));

        let err = client.email_archive("e1").await.unwrap_err();
        assert!(matches!(err, JmapError::MailboxRoleNotFound(MailboxRole::Archive)));
        assert_eq!(client.http().batches().len(), 1);
    }

    #[tokio::test]
    async fn test_create_draft_forces_draft_keyword() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Email/set", {"accountId": "A1", "created": {"draft": {"id": "d1", "blobId": "b1"}}}, "call-0"]
        ]));

        let draft = EmailCreate {
            subject: "Notes".to_string(),
            ..Default::default()
        }
        .with_text_body("remember");
        let id = client.email_create_draft(draft).await.unwrap();
        assert_eq!(id, "d1");

        let created = &calls(&client, 0)[0][1]["create"]["draft"];
        assert_eq!(created["keywords"], json!({"$draft": true}));
        assert_eq!(created["bodyValues"]["text"]["value"], "remember");
    }

    #[tokio::test]
    async fn test_replace_draft_is_one_set() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Email/set", {
                "accountId": "A1",
                "created": {"draft": {"id": "d2"}},
                "destroyed": ["d1"]
            }, "call-0"]
        ]));

        let id = client
            .email_replace_draft("d1", EmailCreate::default())
            .await
            .unwrap();
        assert_eq!(id, "d2");

        let calls = calls(&client, 0);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][1]["destroy"], json!(["d1"]));
        assert_eq!(calls[0][1]["create"]["draft"]["keywords"], json!({"$draft": true}));
    }

    #[tokio::test]
    async fn test_replace_draft_rejected_create_fails() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Email/set", {
                "accountId": "A1",
                "notCreated": {"draft": {"type": "overQuota"}},
                "notDestroyed": {"d1": {"type": "willDestroy"}}
            }, "call-0"]
        ]));

        let err = client
            .email_replace_draft("d1", EmailCreate::default())
            .await
            .unwrap_err();
        assert_eq!(err.remote_kind(), Some("overQuota"));
    }

    #[tokio::test]
    async fn test_search_combines_text_and_mailbox() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Email/query", {"accountId": "A1", "ids": ["e1"]}, "call-0"],
            ["Email/get", {"accountId": "A1", "list": [list_item("e1")]}, "call-1"]
        ]));

        let options = SearchOptions {
            in_mailbox: Some("inbox".to_string()),
            limit: 10,
        };
        let page = client.email_search("invoice", &options).await.unwrap();
        assert_eq!(page.total(), 1);

        let query = &calls(&client, 0)[0][1];
        assert_eq!(query["filter"], json!({"inMailbox": "inbox", "text": "invoice"}));
        assert_eq!(query["limit"], 10);
    }

    #[tokio::test]
    async fn test_changes_omits_unset_max() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Email/changes", {
                "accountId": "A1", "oldState": "1", "newState": "2",
                "created": ["e3"], "updated": [], "destroyed": ["e1"]
            }, "call-0"]
        ]));

        let changes = client.email_changes("1", None).await.unwrap();
        assert_eq!(changes.created, vec!["e3"]);
        assert!(calls(&client, 0)[0][1].get("maxChanges").is_none());
    }
}
