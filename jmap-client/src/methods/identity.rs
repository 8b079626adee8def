// jmap-client/src/methods/identity.rs
use serde_json::Value;

use crate::capability;
use crate::client::JmapClient;
use crate::error::Result;
use crate::http::HttpClient;
use crate::request::Arguments;
use crate::types::{GetResponse, Identity};

impl<C: HttpClient> JmapClient<C> {
    /// Get every sending identity of the account
    pub async fn identity_get_all(&self) -> Result<GetResponse<Identity>> {
        self.call(
            "Identity/get",
            Arguments::account(self.account_id()).arg("ids", Value::Null),
            &[capability::SUBMISSION],
        )
        .await
    }

    pub async fn identity_get(&self, ids: &[String]) -> Result<GetResponse<Identity>> {
        self.call(
            "Identity/get",
            Arguments::account(self.account_id()).arg("ids", ids.to_vec()),
            &[capability::SUBMISSION],
        )
        .await
    }
}
