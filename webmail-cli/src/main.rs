// webmail-cli/src/main.rs
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{handle_mail, handle_mailbox, run_logout, run_setup, MailCommands, MailboxCommands};
use output::{fail, print_response, ErrorResponse, Response};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use webmail_client::{Config, Webmail};

#[derive(Parser)]
#[command(name = "webmail")]
#[command(about = "A command-line mail client for JMAP servers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Email operations
    #[command(subcommand)]
    Mail(MailCommands),
    /// Mailbox management
    #[command(subcommand)]
    Mailbox(MailboxCommands),
    /// List sending identities
    Identities,
    /// Log in and store credentials
    Setup {
        /// JMAP server base URL
        #[arg(long)]
        server: Option<String>,
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget stored credentials
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Setup { server, username } => {
            let code = run_setup(server, username).await?;
            std::process::exit(code);
        }
        Commands::Logout => run_logout(),
        command => run(command).await,
    };

    if let Err(e) = result {
        let (error, code) = ErrorResponse::from_error(&e);
        fail(error, code);
    }
    Ok(())
}

async fn run(command: Commands) -> Result<()> {
    let mut config = Config::load()?;
    let cached = config.api_url.is_some() && config.account_id.is_some();
    let client = Webmail::open(&mut config).await?;
    if !cached && config.remember_endpoint()? {
        debug!("cached discovered session endpoint");
    }

    match command {
        Commands::Mail(cmd) => handle_mail(&client, cmd).await,
        Commands::Mailbox(cmd) => handle_mailbox(&client, cmd).await,
        Commands::Identities => print_response(&Response::ok(client.identities().await?)),
        Commands::Setup { .. } | Commands::Logout => Ok(()),
    }
}
