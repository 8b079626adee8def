// webmail-cli/src/commands/mod.rs
pub mod mail;
pub mod mailbox;
pub mod setup;

pub use mail::{handle_mail, MailCommands};
pub use mailbox::{handle_mailbox, MailboxCommands};
pub use setup::{run_logout, run_setup};
