// jmap-client/src/http/mod.rs
use async_trait::async_trait;
use base64::prelude::*;

/// Error from an HTTP request that produced no response at all
#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP error: {}", self.message)
    }
}

impl std::error::Error for HttpError {}

/// Raw HTTP response; status classification is left to the caller
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Value of the `Authorization` header sent with every request
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Pre-encoded `base64(username:password)`
    Basic(String),
    Bearer(String),
}

impl Credentials {
    pub fn basic(username: &str, password: &str) -> Self {
        Self::Basic(BASE64_STANDARD.encode(format!("{}:{}", username, password)))
    }

    pub fn header_value(&self) -> String {
        match self {
            Self::Basic(token) => format!("Basic {}", token),
            Self::Bearer(token) => format!("Bearer {}", token),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic(_) => f.write_str("Basic(***)"),
            Self::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

/// Generic HTTP client trait - users can implement their own
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST JSON data to URL
    async fn post_json(
        &self,
        url: &str,
        credentials: &Credentials,
        body: Vec<u8>,
    ) -> Result<HttpResponse, HttpError>;

    /// GET a JSON document, used for session discovery
    async fn get(&self, url: &str, credentials: &Credentials) -> Result<HttpResponse, HttpError>;
}

#[cfg(feature = "reqwest")]
pub mod reqwest;

#[cfg(feature = "reqwest")]
pub use reqwest::ReqwestClient;
