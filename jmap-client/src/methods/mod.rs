// jmap-client/src/methods/mod.rs
//! Per-entity helpers layered on [`crate::JmapClient`].
//!
//! Each helper builds exactly the batch its protocol needs, executes it in a
//! single round trip and turns `notCreated`/`notUpdated`/`notDestroyed`
//! entries into [`crate::JmapError::SetRejected`].

pub mod email;
pub mod identity;
pub mod mailbox;
pub mod submission;

pub use email::{
    DeleteOutcome, EmailGetOptions, EmailPage, EmailQueryOptions, SearchOptions,
    DEFAULT_MAX_BODY_VALUE_BYTES, DEFAULT_PAGE_SIZE,
};
pub use mailbox::{find_by_role, MailboxCreate, MailboxSet};
pub use submission::SentEmail;

use serde_json::{Map, Value};

/// `{key: value}`, as used for `create` and `update` maps with one entry
pub(crate) fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}
