// jmap-client/src/methods/mailbox.rs
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::capability;
use crate::client::JmapClient;
use crate::error::Result;
use crate::http::HttpClient;
use crate::request::{Arguments, PatchObject};
use crate::types::{GetResponse, Mailbox, MailboxRole, SetResponse};

/// New mailbox properties
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxCreate {
    pub name: String,
    pub parent_id: Option<String>,
}

/// Arguments of one `Mailbox/set` call
#[derive(Debug, Clone, Default)]
pub struct MailboxSet {
    pub create: BTreeMap<String, MailboxCreate>,
    pub update: BTreeMap<String, PatchObject>,
    pub destroy: Vec<String>,
    /// Destroy mailboxes even when they still contain emails
    pub on_destroy_remove_emails: bool,
}

/// First mailbox carrying `role`.
///
/// Servers should give each standard role to at most one mailbox; when more
/// than one matches, the first one in server order is taken.
pub fn find_by_role(mailboxes: &[Mailbox], role: MailboxRole) -> Option<&Mailbox> {
    let mut matches = mailboxes.iter().filter(|m| m.role == Some(role));
    let first = matches.next()?;
    let others = matches.count();
    if others > 0 {
        warn!(%role, mailbox = %first.id, others, "several mailboxes share a role, using the first");
    }
    Some(first)
}

impl<C: HttpClient> JmapClient<C> {
    /// Get all mailboxes
    pub async fn mailbox_get_all(&self) -> Result<GetResponse<Mailbox>> {
        self.call(
            "Mailbox/get",
            Arguments::account(self.account_id()).arg("ids", Value::Null),
            &[capability::MAIL],
        )
        .await
    }

    pub async fn mailbox_get(&self, ids: &[String]) -> Result<GetResponse<Mailbox>> {
        self.call(
            "Mailbox/get",
            Arguments::account(self.account_id()).arg("ids", ids.to_vec()),
            &[capability::MAIL],
        )
        .await
    }

    /// Raw `Mailbox/set`; rejections are left in the response
    pub async fn mailbox_set(&self, set: MailboxSet) -> Result<SetResponse> {
        let mut args = Arguments::account(self.account_id());
        if !set.create.is_empty() {
            args = args.serialized("create", &set.create)?;
        }
        if !set.update.is_empty() {
            args = args.serialized("update", &set.update)?;
        }
        if !set.destroy.is_empty() {
            args = args
                .arg("destroy", set.destroy)
                .arg("onDestroyRemoveEmails", set.on_destroy_remove_emails);
        }
        self.call("Mailbox/set", args, &[capability::MAIL]).await
    }

    pub async fn mailbox_create(&self, name: &str, parent_id: Option<&str>) -> Result<Mailbox> {
        const CREATION_ID: &str = "newMailbox";

        let create = MailboxCreate {
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
        };
        let mut set = MailboxSet::default();
        set.create.insert(CREATION_ID.to_string(), create.clone());

        let mut resp = self.mailbox_set(set).await?;
        let created = resp.take_created(CREATION_ID)?;
        debug!(id = %created.id, name, "mailbox created");

        // The server echoes only the properties it set itself
        let mut record = serde_json::to_value(&create)?;
        if let Value::Object(map) = &mut record {
            map.extend(created.properties);
            map.insert("id".to_string(), Value::String(created.id));
        }
        Ok(serde_json::from_value(record)?)
    }

    pub async fn mailbox_destroy(&self, id: &str) -> Result<()> {
        let set = MailboxSet {
            destroy: vec![id.to_string()],
            ..Default::default()
        };
        self.mailbox_set(set).await?.check()
    }

    /// Fetch every mailbox and pick the one holding `role`
    pub async fn mailbox_find_by_role(&self, role: MailboxRole) -> Result<Option<Mailbox>> {
        let mailboxes = self.mailbox_get_all().await?;
        Ok(find_by_role(&mailboxes.list, role).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{JmapError, SetOperation};
    use crate::test_support::{self, calls, mailboxes_response};
    use serde_json::json;

    fn mailbox(id: &str, role: Option<MailboxRole>) -> Mailbox {
        Mailbox {
            id: id.to_string(),
            name: id.to_string(),
            role,
            ..Default::default()
        }
    }

    #[test]
    fn test_find_by_role_first_match() {
        let mailboxes = vec![
            mailbox("custom", None),
            mailbox("t1", Some(MailboxRole::Trash)),
            mailbox("t2", Some(MailboxRole::Trash)),
        ];
        assert_eq!(find_by_role(&mailboxes, MailboxRole::Trash).unwrap().id, "t1");
        assert!(find_by_role(&mailboxes, MailboxRole::Archive).is_none());
    }

    #[tokio::test]
    async fn test_get_all_requests_every_id() {
        let client = test_support::client();
        client.http().push_batch(mailboxes_response("call-0"));

        let resp = client.mailbox_get_all().await.unwrap();
        assert_eq!(resp.list.len(), 5);

        let calls = calls(&client, 0);
        assert_eq!(calls[0][0], "Mailbox/get");
        assert_eq!(calls[0][1], json!({"accountId": "A1", "ids": null}));
        assert_eq!(
            client.http().batches()[0]["using"],
            json!([capability::CORE, capability::MAIL])
        );
    }

    #[tokio::test]
    async fn test_create_merges_requested_properties() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Mailbox/set", {
                "accountId": "A1",
                "newState": "m2",
                "created": {"newMailbox": {"id": "M7", "sortOrder": 3}}
            }, "call-0"]
        ]));

        let created = client.mailbox_create("Receipts", Some("inbox")).await.unwrap();
        assert_eq!(created.id, "M7");
        assert_eq!(created.name, "Receipts");
        assert_eq!(created.parent_id.as_deref(), Some("inbox"));
        assert_eq!(created.sort_order, 3);

        let calls = calls(&client, 0);
        assert_eq!(
            calls[0][1]["create"],
            json!({"newMailbox": {"name": "Receipts", "parentId": "inbox"}})
        );
    }

    #[tokio::test]
    async fn test_destroy_rejection() {
        let client = test_support::client();
        client.http().push_batch(json!([
            ["Mailbox/set", {
                "accountId": "A1",
                "notDestroyed": {"M1": {"type": "mailboxHasEmail", "description": "Mailbox is not empty"}}
            }, "call-0"]
        ]));

        let err = client.mailbox_destroy("M1").await.unwrap_err();
        match err {
            JmapError::SetRejected { operation, id, error } => {
                assert_eq!(operation, SetOperation::Destroy);
                assert_eq!(id, "M1");
                assert_eq!(error.kind, "mailboxHasEmail");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
