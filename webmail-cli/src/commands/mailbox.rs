// webmail-cli/src/commands/mailbox.rs
use crate::output::{fail, print_response, ErrorResponse, ExitCode, Response};
use anyhow::Result;
use webmail_client::Webmail;

#[derive(clap::Subcommand, Clone, Debug)]
pub enum MailboxCommands {
    /// List mailboxes
    List {
        /// Only mailboxes whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Create a mailbox
    Create {
        name: String,
        /// Parent mailbox (ID, role or name)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Delete a mailbox
    Delete {
        /// Mailbox ID, role or name
        mailbox: String,
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_mailbox(client: &Webmail, cmd: MailboxCommands) -> Result<()> {
    match cmd {
        MailboxCommands::List { filter } => {
            let mut mailboxes = client.mailboxes().await?;
            if let Some(pattern) = filter {
                let pattern = pattern.to_lowercase();
                mailboxes.retain(|m| m.name.to_lowercase().contains(&pattern));
            }
            mailboxes.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
            print_response(&Response::ok(mailboxes))
        }
        MailboxCommands::Create { name, parent } => {
            let parent_id = match parent {
                Some(p) => Some(client.resolve_mailbox(&p).await?.id),
                None => None,
            };
            let mailbox = client.create_mailbox(&name, parent_id.as_deref()).await?;
            print_response(&Response::ok(mailbox))
        }
        MailboxCommands::Delete { mailbox, force } => {
            if !force {
                fail(
                    ErrorResponse::safety_rejected(
                        "--force flag is required for delete operations".to_string(),
                    ),
                    ExitCode::SafetyRejected,
                );
            }
            let mailbox = client.resolve_mailbox(&mailbox).await?;
            client.delete_mailbox(&mailbox.id).await?;
            print_response(&Response::ok(
                serde_json::json!({"id": mailbox.id, "deleted": true}),
            ))
        }
    }
}
