// jmap-client/src/request.rs
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::capability;
use crate::error::{JmapError, Result};
use crate::id::{CallId, CallIdGenerator, DEFAULT_PREFIX};

impl Borrow<str> for CallId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

/// Back-reference to a field of an earlier call's result (RFC 8620 §3.7).
///
/// Only [`RequestBuilder::reference`] can construct one, after checking that
/// the source call is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultReference {
    result_of: CallId,
    name: String,
    path: String,
}

impl ResultReference {
    pub fn result_of(&self) -> &CallId {
        &self.result_of
    }

    /// Method name of the referenced call
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Creation ID of a record created earlier in the same request.
///
/// Referenced as the literal `#<id>` rather than through a result path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreationId(String);

impl CreationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `#<id>` token standing in for the created record's server ID
    pub fn reference(&self) -> String {
        format!("#{}", self.0)
    }
}

/// An argument that is either known now or resolved by the server
#[derive(Debug, Clone, PartialEq)]
pub enum Argument<T> {
    Value(T),
    Result(ResultReference),
    Creation(CreationId),
}

impl<T> From<T> for Argument<T> {
    fn from(v: T) -> Self {
        Self::Value(v)
    }
}

/// Argument object of a single method call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments scoped to an account, as almost every mail method needs
    pub fn account(account_id: &str) -> Self {
        Self::new().arg("accountId", account_id)
    }

    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.remove(&format!("#{}", key));
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn serialized<T: Serialize + ?Sized>(self, key: &str, value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        Ok(self.arg(key, value))
    }

    /// Insert an [`Argument`]: result references go under `#key`, creation
    /// references become the literal `#<id>` under `key`. A key holds either
    /// a literal or a result reference, never both.
    pub fn argument<T: Into<Value>>(mut self, key: &str, argument: Argument<T>) -> Self {
        match argument {
            Argument::Value(v) => {
                self = self.arg(key, v);
            }
            Argument::Result(reference) => {
                self.0.remove(key);
                self.0.insert(
                    format!("#{}", key),
                    serde_json::json!({
                        "resultOf": reference.result_of,
                        "name": reference.name,
                        "path": reference.path,
                    }),
                );
            }
            Argument::Creation(id) => {
                self = self.arg(key, id.reference());
            }
        }
        self
    }

    pub fn reference(self, key: &str, reference: ResultReference) -> Self {
        self.argument::<Value>(key, Argument::Result(reference))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Escape a single JSON Pointer segment (RFC 6901)
fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Sparse update of one record (RFC 8620 §5.3).
///
/// Keys are property paths such as `keywords/$seen`; `true` sets a member,
/// `null` removes it, and untouched members stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchObject(BTreeMap<String, Value>);

impl PatchObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(path.into(), value.into());
        self
    }

    pub fn unset(mut self, path: impl Into<String>) -> Self {
        self.0.insert(path.into(), Value::Null);
        self
    }

    pub fn keyword(self, keyword: &str, present: bool) -> Self {
        let path = format!("keywords/{}", escape_segment(keyword));
        if present {
            self.set(path, true)
        } else {
            self.unset(path)
        }
    }

    pub fn mailbox(self, mailbox_id: &str, member: bool) -> Self {
        let path = format!("mailboxIds/{}", escape_segment(mailbox_id));
        if member {
            self.set(path, true)
        } else {
            self.unset(path)
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.get(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }
}

/// `[name, arguments, callId]`
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub name: String,
    pub arguments: Arguments,
    pub id: CallId,
}

impl Serialize for MethodCall {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.name, &self.arguments, &self.id).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MethodCall {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (name, arguments, id) = <(String, Arguments, CallId)>::deserialize(deserializer)?;
        Ok(Self {
            name,
            arguments,
            id,
        })
    }
}

/// JMAP request object (RFC 8620 §3.3)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub using: Vec<String>,
    pub method_calls: Vec<MethodCall>,
}

/// Accumulates the calls of one batch.
///
/// A builder is scoped to a single request: its call IDs, creation IDs and
/// capabilities never leak into another builder.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    using: BTreeSet<String>,
    method_calls: Vec<MethodCall>,
    call_ids: HashMap<CallId, usize>,
    creation_ids: BTreeSet<String>,
    ids: CallIdGenerator,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        let mut using = BTreeSet::new();
        using.insert(capability::CORE.to_string());
        Self {
            using,
            method_calls: Vec::new(),
            call_ids: HashMap::new(),
            creation_ids: BTreeSet::new(),
            ids: CallIdGenerator::new(),
        }
    }

    pub fn add_capability(&mut self, urn: &str) -> &mut Self {
        self.using.insert(urn.to_string());
        self
    }

    pub fn add_capabilities<I, S>(&mut self, urns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for urn in urns {
            self.add_capability(urn.as_ref());
        }
        self
    }

    /// Register a call under a freshly generated ID
    pub fn call(&mut self, name: &str, arguments: Arguments) -> CallId {
        let id = loop {
            let candidate = self.ids.next(DEFAULT_PREFIX);
            if !self.call_ids.contains_key(&candidate) {
                break candidate;
            }
        };
        self.push(name, arguments, id.clone());
        id
    }

    /// Register a call under a caller-chosen ID
    pub fn call_with_id(
        &mut self,
        name: &str,
        arguments: Arguments,
        id: impl Into<CallId>,
    ) -> Result<CallId> {
        let id = id.into();
        if self.call_ids.contains_key(&id) {
            return Err(JmapError::DuplicateCallId(id.to_string()));
        }
        self.push(name, arguments, id.clone());
        Ok(id)
    }

    fn push(&mut self, name: &str, arguments: Arguments, id: CallId) {
        if let Some(required) = capability::required_for(name) {
            self.using.insert(required.to_string());
        }
        self.call_ids.insert(id.clone(), self.method_calls.len());
        self.method_calls.push(MethodCall {
            name: name.to_string(),
            arguments,
            id,
        });
    }

    /// Reference `path` in the result of an already registered call
    pub fn reference(&self, call_id: impl AsRef<str>, path: &str) -> Result<ResultReference> {
        let call_id = call_id.as_ref();
        let index = self
            .call_ids
            .get(call_id)
            .copied()
            .ok_or_else(|| JmapError::UnknownCallId(call_id.to_string()))?;
        let call = &self.method_calls[index];
        Ok(ResultReference {
            result_of: call.id.clone(),
            name: call.name.clone(),
            path: path.to_string(),
        })
    }

    /// Declare a creation ID for a record created in this request
    pub fn create_id(&mut self, name: &str) -> CreationId {
        self.creation_ids.insert(name.to_string());
        CreationId(name.to_string())
    }

    /// Look up a creation ID previously declared with [`Self::create_id`]
    pub fn creation_reference(&self, name: &str) -> Result<CreationId> {
        if self.creation_ids.contains(name) {
            Ok(CreationId(name.to_string()))
        } else {
            Err(JmapError::UnknownCreationId(name.to_string()))
        }
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.using.iter().map(String::as_str)
    }

    pub fn build(&self) -> Request {
        Request {
            using: self.using.iter().cloned().collect(),
            method_calls: self.method_calls.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.method_calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.method_calls.is_empty()
    }
}
