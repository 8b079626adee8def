// webmail-cli/src/commands/mail.rs
use crate::output::{fail, print_response, ErrorResponse, ExitCode, Meta, Response};
use anyhow::{anyhow, Result};
use webmail_client::{parse_addresses, ComposeMessage, DraftMessage, Webmail};

#[derive(clap::Subcommand, Clone, Debug)]
pub enum MailCommands {
    /// List emails in a mailbox
    List {
        /// Mailbox ID, role or name
        #[arg(short, long, default_value = "inbox")]
        mailbox: String,
        /// Max number of emails [default: configured page size]
        #[arg(short, long)]
        limit: Option<u64>,
        /// Index of the first email to return
        #[arg(short, long)]
        position: Option<u64>,
    },
    /// Read an email
    Read {
        /// Email ID
        id: String,
        /// Also mark the email as read
        #[arg(long)]
        mark_read: bool,
    },
    /// Full-text search
    Search {
        query: String,
        /// Restrict to one mailbox (ID, role or name)
        #[arg(short, long)]
        mailbox: Option<String>,
        #[arg(short, long)]
        limit: Option<u64>,
    },
    /// Compose and send an email
    Send {
        /// Recipient(s), `addr` or `Name <addr>`
        #[arg(long, required = true)]
        to: Vec<String>,
        #[arg(long)]
        cc: Vec<String>,
        #[arg(long)]
        bcc: Vec<String>,
        #[arg(short, long)]
        subject: String,
        /// Plain text body
        #[arg(short, long)]
        body: Option<String>,
        /// HTML body
        #[arg(long)]
        html: Option<String>,
        /// Identity ID [default: first identity]
        #[arg(short, long)]
        identity: Option<String>,
        /// Message-ID being replied to
        #[arg(long)]
        in_reply_to: Option<String>,
        #[arg(long)]
        references: Vec<String>,
    },
    /// Save a draft
    Draft {
        #[arg(long)]
        to: Vec<String>,
        #[arg(long)]
        cc: Vec<String>,
        #[arg(short, long)]
        subject: Option<String>,
        #[arg(short, long)]
        body: Option<String>,
        #[arg(long)]
        html: Option<String>,
        /// Draft ID to replace
        #[arg(long)]
        replace: Option<String>,
    },
    /// Mark an email as read
    MarkRead { id: String },
    /// Mark an email as unread
    MarkUnread { id: String },
    /// Flag an email
    Star { id: String },
    /// Remove the flag from an email
    Unstar { id: String },
    /// Move an email to another mailbox
    Move {
        id: String,
        /// Destination mailbox (ID, role or name)
        to: String,
        /// Only leave this mailbox, keeping other memberships
        #[arg(long)]
        from: Option<String>,
    },
    /// Move an email to the archive mailbox
    Archive { id: String },
    /// Move an email to trash, or destroy it
    Delete {
        id: String,
        /// Destroy instead of moving to trash
        #[arg(long)]
        permanent: bool,
        /// Confirm a permanent delete
        #[arg(long)]
        force: bool,
    },
}

fn meta(client: &Webmail) -> Meta {
    Meta {
        account_id: Some(client.account_id().to_string()),
        dry_run: None,
    }
}

fn done(id: &str, action: &str) -> Result<()> {
    print_response(&Response::ok(serde_json::json!({"id": id, action: true})))
}

pub async fn handle_mail(client: &Webmail, cmd: MailCommands) -> Result<()> {
    match cmd {
        MailCommands::List {
            mailbox,
            limit,
            position,
        } => {
            let mailbox = client.resolve_mailbox(&mailbox).await?;
            let page = client.list_emails(&mailbox.id, limit, position).await?;
            print_response(&Response::ok_with_meta(page, meta(client)))
        }
        MailCommands::Read { id, mark_read } => {
            let Some(email) = client.get_email(&id).await? else {
                fail(
                    ErrorResponse::not_found(format!("Email not found: {}", id)),
                    ExitCode::PermanentError,
                );
            };
            if mark_read {
                client.mark_read(&id).await?;
            }
            print_response(&Response::ok(email))
        }
        MailCommands::Search {
            query,
            mailbox,
            limit,
        } => {
            let mailbox_id = match mailbox {
                Some(name) => Some(client.resolve_mailbox(&name).await?.id),
                None => None,
            };
            let results = client.search(&query, mailbox_id.as_deref(), limit).await?;
            print_response(&Response::ok_with_meta(results, meta(client)))
        }
        MailCommands::Send {
            to,
            cc,
            bcc,
            subject,
            body,
            html,
            identity,
            in_reply_to,
            references,
        } => {
            if body.is_none() && html.is_none() {
                fail(
                    ErrorResponse::validation_failed("--body or --html is required".to_string()),
                    ExitCode::PermanentError,
                );
            }
            let identity_id = match identity {
                Some(id) => id,
                None => client
                    .identities()
                    .await?
                    .into_iter()
                    .next()
                    .map(|i| i.id)
                    .ok_or_else(|| anyhow!("No identity found"))?,
            };
            let message = ComposeMessage {
                identity_id,
                to: parse_addresses(&to)?,
                cc: parse_addresses(&cc)?,
                bcc: parse_addresses(&bcc)?,
                subject,
                text_body: body,
                html_body: html,
                in_reply_to,
                references,
            };
            let sent = client.send(&message).await?;
            print_response(&Response::ok(sent))
        }
        MailCommands::Draft {
            to,
            cc,
            subject,
            body,
            html,
            replace,
        } => {
            let draft = DraftMessage {
                to: parse_addresses(&to)?,
                cc: parse_addresses(&cc)?,
                bcc: Vec::new(),
                subject,
                text_body: body,
                html_body: html,
                draft_id: replace,
            };
            let draft_id = client.save_draft(&draft).await?;
            print_response(&Response::ok(serde_json::json!({"draft_id": draft_id})))
        }
        MailCommands::MarkRead { id } => {
            client.mark_read(&id).await?;
            done(&id, "read")
        }
        MailCommands::MarkUnread { id } => {
            client.mark_unread(&id).await?;
            done(&id, "unread")
        }
        MailCommands::Star { id } => {
            client.set_starred(&id, true).await?;
            done(&id, "starred")
        }
        MailCommands::Unstar { id } => {
            client.set_starred(&id, false).await?;
            done(&id, "unstarred")
        }
        MailCommands::Move { id, to, from } => {
            let to = client.resolve_mailbox(&to).await?;
            let from = match from {
                Some(name) => Some(client.resolve_mailbox(&name).await?.id),
                None => None,
            };
            client.move_email(&id, from.as_deref(), &to.id).await?;
            print_response(&Response::ok(
                serde_json::json!({"id": id, "mailbox_id": to.id}),
            ))
        }
        MailCommands::Archive { id } => {
            let mailbox_id = client.archive(&id).await?;
            print_response(&Response::ok(
                serde_json::json!({"id": id, "mailbox_id": mailbox_id}),
            ))
        }
        MailCommands::Delete {
            id,
            permanent,
            force,
        } => {
            // Safety check: permanent deletes need --force
            if permanent && !force {
                fail(
                    ErrorResponse::safety_rejected(
                        "--force flag is required for permanent deletes".to_string(),
                    ),
                    ExitCode::SafetyRejected,
                );
            }
            let outcome = client.delete(&id, permanent).await?;
            print_response(&Response::ok(outcome))
        }
    }
}
