// jmap-client/src/capability.rs
//! Capability URNs declared in a request's `using` list.

pub const CORE: &str = "urn:ietf:params:jmap:core";
pub const MAIL: &str = "urn:ietf:params:jmap:mail";
pub const SUBMISSION: &str = "urn:ietf:params:jmap:submission";

/// Capability a method's namespace needs beyond core, if any
pub fn required_for(method: &str) -> Option<&'static str> {
    let namespace = method.split_once('/').map_or(method, |(ns, _)| ns);
    match namespace {
        "Mailbox" | "Email" | "Thread" | "SearchSnippet" => Some(MAIL),
        "Identity" | "EmailSubmission" => Some(SUBMISSION),
        _ => None,
    }
}
