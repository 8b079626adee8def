// jmap-client/src/test_support.rs
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::JmapClient;
use crate::http::{Credentials, HttpClient, HttpError, HttpResponse};

pub const API_URL: &str = "https://mail.example.com/jmap/api";
pub const ACCOUNT_ID: &str = "A1";

#[derive(Debug)]
struct Recorded {
    method: &'static str,
    url: String,
    body: Option<Value>,
}

/// Scripted transport: replays queued responses and records every request
#[derive(Debug, Default)]
pub struct MockHttp {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, value: Value) {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            body: serde_json::to_vec(&value).unwrap(),
        });
    }

    /// Queue a batch response made of `[name, args, id]` triples
    pub fn push_batch(&self, method_responses: Value) {
        self.push_json(serde_json::json!({
            "methodResponses": method_responses,
            "sessionState": "s0"
        }));
    }

    pub fn push_status(&self, status: u16, status_text: &str) {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            status_text: status_text.to_string(),
            body: Vec::new(),
        });
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| format!("{} {}", r.method, r.url))
            .collect()
    }

    /// Bodies of every POSTed batch, in send order
    pub fn batches(&self) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.body.clone())
            .collect()
    }

    fn next(&self) -> Result<HttpResponse, HttpError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| HttpError {
                message: "no response queued".to_string(),
            })
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn post_json(
        &self,
        url: &str,
        _credentials: &Credentials,
        body: Vec<u8>,
    ) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(Recorded {
            method: "POST",
            url: url.to_string(),
            body: Some(serde_json::from_slice(&body).unwrap()),
        });
        self.next()
    }

    async fn get(&self, url: &str, _credentials: &Credentials) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(Recorded {
            method: "GET",
            url: url.to_string(),
            body: None,
        });
        self.next()
    }
}

pub fn client() -> JmapClient<MockHttp> {
    JmapClient::new(
        MockHttp::new(),
        API_URL.to_string(),
        ACCOUNT_ID.to_string(),
        Credentials::Basic("dGVzdDp0ZXN0".to_string()),
    )
}

/// Method calls of the `n`th batch sent through `client`
pub fn calls(client: &JmapClient<MockHttp>, n: usize) -> Vec<Value> {
    let batches = client.http().batches();
    batches[n]["methodCalls"]
        .as_array()
        .cloned()
        .unwrap_or_default()
}

pub fn mailboxes_response(id: &str) -> Value {
    serde_json::json!([
        ["Mailbox/get", {
            "accountId": ACCOUNT_ID,
            "state": "m1",
            "list": [
                {"id": "inbox", "name": "Inbox", "role": "inbox"},
                {"id": "drafts", "name": "Drafts", "role": "drafts"},
                {"id": "sent", "name": "Sent", "role": "sent"},
                {"id": "trash", "name": "Trash", "role": "trash"},
                {"id": "lists", "name": "Lists", "role": null}
            ],
            "notFound": []
        }, id]
    ])
}
