// jmap-client/src/client.rs
use crate::error::{JmapError, Result};
use crate::http::{Credentials, HttpClient};
use crate::request::{Arguments, Request, RequestBuilder};
use crate::response::{Response, ResponseParser};
use crate::session::{discover_session, DiscoveredSession};
use serde::de::DeserializeOwned;
use tracing::debug;

/// POST one batch to `api_url` and decode the batch response
pub async fn execute_batch<C: HttpClient + ?Sized>(
    http: &C,
    api_url: &str,
    credentials: &Credentials,
    request: &Request,
) -> Result<Response> {
    debug!(
        calls = request.method_calls.len(),
        using = ?request.using,
        "executing JMAP batch"
    );

    let body = serde_json::to_vec(request)?;
    let resp = http
        .post_json(api_url, credentials, body)
        .await
        .map_err(|e| JmapError::Transport {
            status: None,
            message: e.message,
        })?;

    if !resp.is_success() {
        return Err(JmapError::Transport {
            status: Some(resp.status),
            message: resp.status_text,
        });
    }

    Ok(serde_json::from_slice(&resp.body)?)
}

/// Executes batches against one account's API endpoint
pub struct JmapClient<C: HttpClient> {
    http: C,
    api_url: String,
    account_id: String,
    credentials: Credentials,
}

impl<C: HttpClient> JmapClient<C> {
    pub fn new(http: C, api_url: String, account_id: String, credentials: Credentials) -> Self {
        Self {
            http,
            api_url,
            account_id,
            credentials,
        }
    }

    /// Discover the session at `server_url` and bind to its mail account
    pub async fn connect(
        http: C,
        server_url: &str,
        credentials: Credentials,
    ) -> Result<(Self, DiscoveredSession)> {
        let discovered = discover_session(&http, server_url, &credentials).await?;
        let client = Self::new(
            http,
            discovered.api_url.clone(),
            discovered.account_id.clone(),
            credentials,
        );
        Ok((client, discovered))
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn http(&self) -> &C {
        &self.http
    }

    /// Send a finished builder as one round trip
    pub async fn execute(&self, builder: RequestBuilder) -> Result<ResponseParser> {
        let request = builder.build();
        let response = execute_batch(&self.http, &self.api_url, &self.credentials, &request).await?;
        Ok(ResponseParser::new(response))
    }

    /// Batch of a single method call
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        arguments: Arguments,
        capabilities: &[&str],
    ) -> Result<T> {
        let mut builder = RequestBuilder::new();
        builder.add_capabilities(capabilities);
        let call_id = builder.call(method, arguments);

        let parser = self.execute(builder).await?;
        parser.get(&call_id)
    }
}
