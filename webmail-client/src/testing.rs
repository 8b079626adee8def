// webmail-client/src/testing.rs
use jmap_client::{Credentials, JmapClient};
use serde_json::{json, Value};

pub use jmap_client::test_support::{MockHttp, ACCOUNT_ID, API_URL};

use crate::client::Webmail;
use crate::config::MailConfig;

pub fn webmail() -> Webmail<MockHttp> {
    let inner = JmapClient::new(
        MockHttp::new(),
        API_URL.to_string(),
        ACCOUNT_ID.to_string(),
        Credentials::Basic("dTpw".to_string()),
    );
    Webmail::new(inner, MailConfig::default())
}

pub fn batch_calls(http: &MockHttp, n: usize) -> Vec<Value> {
    http.batches()[n]["methodCalls"]
        .as_array()
        .cloned()
        .unwrap_or_default()
}

pub fn mailboxes(with_drafts: bool) -> Value {
    let mut list = vec![
        json!({"id": "inbox", "name": "Inbox", "role": "inbox"}),
        json!({"id": "sent", "name": "Sent", "role": "sent"}),
        json!({"id": "trash", "name": "Trash", "role": "trash"}),
        json!({"id": "lists", "name": "Lists"}),
    ];
    if with_drafts {
        list.push(json!({"id": "drafts", "name": "Drafts", "role": "drafts"}));
    }
    json!([["Mailbox/get", {"accountId": ACCOUNT_ID, "state": "m1", "list": list}, "call-0"]])
}
