use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    auth,
    config::{load_settings, ClientSettings},
    validation::SignupForm,
    ChatClient, FileSessionStore, HttpGateway,
};
use shared::protocol::Credentials;
use tracing_subscriber::EnvFilter;

mod chat;

#[derive(Parser, Debug)]
#[command(name = "hexchat", about = "Terminal client for the chat server")]
struct Cli {
    /// Overrides `server_url` from client.toml and the environment.
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        /// Prompted for when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    Signup {
        #[arg(long)]
        username: String,
    },
    Logout,
    /// Opens the chat view. Requires a stored session.
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli);
    let sessions = FileSessionStore::new(settings.session_file.clone());
    let gateway = Arc::new(HttpGateway::new(
        settings.server_url.clone(),
        settings.request_timeout(),
    )?);

    match cli.command {
        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("password: ")?,
            };
            let credentials = Credentials { username, password };
            match auth::login(gateway.as_ref(), &sessions, credentials).await {
                Ok(session) => println!("logged in as {}", session.username),
                Err(err) => bail!("{} ({err})", err.message_key()),
            }
        }
        Command::Signup { username } => {
            let form = SignupForm {
                username,
                password: prompt("password: ")?,
                confirm_password: prompt("confirm password: ")?,
            };
            match auth::signup(gateway.as_ref(), &sessions, &form).await {
                Ok(session) => println!("signed up as {}", session.username),
                Err(err) => bail!("{} ({err})", err.message_key()),
            }
        }
        Command::Logout => {
            auth::logout(&sessions)?;
            println!("logged out");
        }
        Command::Chat => {
            let Some(session) = auth::restore(&sessions)? else {
                bail!("no stored session, run `login` first");
            };
            let filter = settings.profanity_filter()?;
            let client = ChatClient::new_with_filter(gateway, session, filter);
            chat::run(client, &settings.server_url).await?;
        }
    }

    Ok(())
}

fn resolve_settings(cli: &Cli) -> ClientSettings {
    let mut settings = load_settings();
    if let Some(url) = &cli.server_url {
        settings.server_url = url.trim_end_matches('/').to_string();
    }
    if let Some(path) = &cli.session_file {
        settings.session_file = path.clone();
    }
    settings
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
