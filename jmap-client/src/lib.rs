// jmap-client/src/lib.rs
//! JMAP (RFC 8620/8621) batch client.
//!
//! A [`RequestBuilder`] collects the calls of one batch, including
//! back-references between them; [`JmapClient::execute`] sends the batch as a
//! single POST and hands back a [`ResponseParser`] that decodes each call's
//! result by call ID. The `methods` module layers the mail protocols
//! (query-then-get, create-then-submit, sparse patches) on top.

pub mod capability;
pub mod client;
pub mod error;
pub mod http;
pub mod id;
pub mod methods;
pub mod request;
pub mod response;
pub mod session;
pub mod types;

/// Scripted transport and fixtures for tests of this crate and its users
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use client::{execute_batch, JmapClient};
pub use error::{JmapError, MethodError, Result, SetError, SetOperation};
pub use http::{Credentials, HttpClient, HttpError, HttpResponse};
pub use id::{CallId, CallIdGenerator};
pub use methods::{
    find_by_role, DeleteOutcome, EmailGetOptions, EmailPage, EmailQueryOptions, MailboxCreate,
    MailboxSet, SearchOptions, SentEmail,
};
pub use request::{
    Argument, Arguments, CreationId, MethodCall, PatchObject, Request, RequestBuilder,
    ResultReference,
};
pub use response::{MethodResponse, MethodResult, Response, ResponseParser};
pub use session::{discover_session, DiscoveredSession};
pub use types::{
    keyword, ChangesResponse, Comparator, CreatedRecord, Email, EmailAddress, EmailBodyPart,
    EmailBodyValue, EmailCreate, EmailFilter, EmailFilterCondition, EmailListItem,
    EmailSubmission, FilterOperator, GetResponse, Identity, Keywords, Mailbox, MailboxIds,
    MailboxRights, MailboxRole, QueryResponse, Session, SetResponse, UndoStatus,
};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
