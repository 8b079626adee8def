// jmap-client/src/http/reqwest.rs
use super::{Credentials, HttpClient, HttpError, HttpResponse};
use async_trait::async_trait;

#[cfg(feature = "reqwest")]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

#[cfg(feature = "reqwest")]
impl ReqwestClient {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Wrap a preconfigured client (timeouts, proxies, TLS roots)
    pub fn with_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<HttpResponse, HttpError> {
        let resp = req.send().await.map_err(|e| HttpError {
            message: e.to_string(),
        })?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| HttpError {
                message: e.to_string(),
            })?
            .to_vec();

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[cfg(feature = "reqwest")]
impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "reqwest")]
#[async_trait]
impl HttpClient for ReqwestClient {
    async fn post_json(
        &self,
        url: &str,
        credentials: &Credentials,
        body: Vec<u8>,
    ) -> Result<HttpResponse, HttpError> {
        let req = self
            .inner
            .post(url)
            .header("authorization", credentials.header_value())
            .header("content-type", "application/json")
            .body(body);
        self.send(req).await
    }

    async fn get(&self, url: &str, credentials: &Credentials) -> Result<HttpResponse, HttpError> {
        let req = self
            .inner
            .get(url)
            .header("authorization", credentials.header_value())
            .header("accept", "application/json");
        self.send(req).await
    }
}
