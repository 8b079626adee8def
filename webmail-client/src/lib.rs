// webmail-client/src/lib.rs
pub mod client;
pub mod compose;
pub mod config;

#[cfg(test)]
mod testing;

pub use client::{EmailList, SearchResults, Webmail};
pub use compose::{parse_address, parse_addresses, ComposeMessage, DraftMessage};
pub use config::{Config, MailConfig};

// Re-export JMAP types for convenience
pub use jmap_client::{
    DeleteOutcome, Email, EmailAddress, EmailListItem, Identity, JmapError, Mailbox, MailboxRole,
    SentEmail,
};
