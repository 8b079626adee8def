// webmail-cli/src/commands/setup.rs
use crate::output::{print_error, print_success};
use anyhow::Result;
use dialoguer::{Input, Password};
use webmail_client::{Config, JmapError, Webmail};

/// Exit code type
pub type SetupExitCode = i32;

/// Run the interactive setup command
pub async fn run_setup(server: Option<String>, username: Option<String>) -> Result<SetupExitCode> {
    println!("Webmail Setup");
    println!();

    let server_url = match server {
        Some(url) => url,
        None => Input::new()
            .with_prompt("JMAP server URL")
            .with_initial_text("https://")
            .interact_text()?,
    };
    let username = match username {
        Some(name) => name,
        None => Input::new().with_prompt("Username").interact_text()?,
    };
    let password = Password::new().with_prompt("Password").interact()?;

    if password.is_empty() {
        print_error("Password cannot be empty");
        return Ok(2);
    }

    println!();
    println!("Validating credentials...");

    match Webmail::login(&server_url, &username, &password).await {
        Ok((_, mut config)) => {
            // Keep the mail preferences of an earlier setup
            if let Ok(previous) = Config::load_stored() {
                config.mail = previous.mail;
            }

            if let Err(e) = config.save() {
                print_error(&format!("Couldn't write config file: {}", e));
                return Ok(2);
            }

            print_success("Credentials saved!");
            println!();
            println!("Try: webmail mail list");

            Ok(0)
        }
        Err(e) => {
            print_error(&format!("{:#}", e));
            if matches!(e.downcast_ref::<JmapError>(), Some(JmapError::Unauthorized)) {
                eprintln!();
                eprintln!("Check the username and password, or use an app password");
                eprintln!("if your provider requires one.");
            }
            Ok(2)
        }
    }
}

/// Remove the stored credentials
pub fn run_logout() -> Result<()> {
    let mut config = Config::load_stored()?;
    config.clear_credentials();
    config.save()?;
    print_success("Logged out");
    Ok(())
}
