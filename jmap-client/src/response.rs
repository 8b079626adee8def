// jmap-client/src/response.rs
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{JmapError, MethodError, Result};
use crate::id::CallId;

/// Method name the server uses in place of a response name on failure
pub const ERROR_METHOD: &str = "error";

/// `[name, arguments, callId]` as sent by the server
#[derive(Debug, Clone, PartialEq)]
pub struct MethodResponse {
    pub name: String,
    pub arguments: Value,
    pub id: CallId,
}

impl Serialize for MethodResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.name, &self.arguments, &self.id).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MethodResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (name, arguments, id) = <(String, Value, CallId)>::deserialize(deserializer)?;
        Ok(Self {
            name,
            arguments,
            id,
        })
    }
}

/// JMAP response object (RFC 8620 §3.4)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub method_responses: Vec<MethodResponse>,
    #[serde(default)]
    pub session_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_ids: Option<HashMap<String, String>>,
}

/// One method response, decoded once
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResult {
    Success { method: String, data: Value },
    Failure(MethodError),
}

impl MethodResult {
    fn decode(response: &MethodResponse) -> Self {
        if response.name != ERROR_METHOD {
            return Self::Success {
                method: response.name.clone(),
                data: response.arguments.clone(),
            };
        }
        match serde_json::from_value(response.arguments.clone()) {
            Ok(error) => Self::Failure(error),
            // An error without a readable type still is an error
            Err(_) => Self::Failure(MethodError {
                kind: "serverFail".to_string(),
                description: Some(response.arguments.to_string()),
                extra: Default::default(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Read-only index of a batch response by call ID.
///
/// Responses may arrive in any order. If the server repeats a call ID, the
/// last response carrying it answers [`Self::get`]; [`Self::get_method`]
/// picks a specific method among them.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    responses: Vec<MethodResponse>,
    results: Vec<MethodResult>,
    index: HashMap<CallId, Vec<usize>>,
    session_state: String,
}

impl ResponseParser {
    pub fn new(response: Response) -> Self {
        let mut index: HashMap<CallId, Vec<usize>> = HashMap::new();
        let mut results = Vec::with_capacity(response.method_responses.len());
        for (i, method_response) in response.method_responses.iter().enumerate() {
            results.push(MethodResult::decode(method_response));
            index.entry(method_response.id.clone()).or_default().push(i);
        }
        Self {
            responses: response.method_responses,
            results,
            index,
            session_state: response.session_state,
        }
    }

    /// Decoded result for `call_id`, if the server answered it
    pub fn result(&self, call_id: impl AsRef<str>) -> Option<&MethodResult> {
        self.index
            .get(call_id.as_ref())
            .and_then(|positions| positions.last())
            .map(|&i| &self.results[i])
    }

    pub fn get<T: DeserializeOwned>(&self, call_id: impl AsRef<str>) -> Result<T> {
        let call_id = call_id.as_ref();
        let result = self
            .result(call_id)
            .ok_or_else(|| JmapError::UnknownCallId(call_id.to_string()))?;
        decode(call_id, result)
    }

    /// Like [`Self::get`], but only accepts a response named `method`.
    ///
    /// An error response for the call ID still fails with its remote error.
    pub fn get_method<T: DeserializeOwned>(
        &self,
        call_id: impl AsRef<str>,
        method: &str,
    ) -> Result<T> {
        let call_id = call_id.as_ref();
        let positions = self
            .index
            .get(call_id)
            .ok_or_else(|| JmapError::UnknownCallId(call_id.to_string()))?;

        let mut matched = None;
        for &i in positions {
            match &self.results[i] {
                MethodResult::Failure(error) => {
                    return Err(JmapError::Method {
                        call_id: call_id.to_string(),
                        error: error.clone(),
                    })
                }
                result @ MethodResult::Success { method: name, .. } if name == method => {
                    matched = Some(result);
                }
                MethodResult::Success { .. } => {}
            }
        }

        let result = matched.ok_or_else(|| JmapError::UnexpectedResponse {
            call_id: call_id.to_string(),
            method: method.to_string(),
        })?;
        decode(call_id, result)
    }

    /// `true` only when a response exists for `call_id` and it is an error
    pub fn is_error(&self, call_id: impl AsRef<str>) -> bool {
        self.result(call_id).is_some_and(MethodResult::is_error)
    }

    /// Every method response, in the order the server sent them
    pub fn get_all(&self) -> &[MethodResponse] {
        &self.responses
    }

    pub fn session_state(&self) -> &str {
        &self.session_state
    }
}

fn decode<T: DeserializeOwned>(call_id: &str, result: &MethodResult) -> Result<T> {
    match result {
        MethodResult::Success { data, .. } => {
            serde_json::from_value(data.clone()).map_err(|source| JmapError::Decode {
                call_id: call_id.to_string(),
                source,
            })
        }
        MethodResult::Failure(error) => Err(JmapError::Method {
            call_id: call_id.to_string(),
            error: error.clone(),
        }),
    }
}
