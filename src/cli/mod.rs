pub mod commands;

use std::io::{self, BufRead, Write};
use thiserror::Error;

use crate::chat::{ChatMessage, ChatSession, Role, SessionError};
use crate::cli::commands::Commands;
use crate::config::AppConfig;
use crate::db::{connect, Backend, ConnectionParams, DbError};
use crate::llm::{LlmError, ProviderFactory};
use crate::schema::provider_for;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to initialize LLM provider: {0}")]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

const HELP: &str = "\
Commands:
  /connect [key=value ...]  connect (keys: backend, host, port, username, database, schema)
  /history                  show the conversation so far
  /schema                   show the schema text given to the model
  /help                     show this help
  /exit, /quit              leave
Anything else is a question about the connected database.";

pub async fn run_cli(command: Commands, config_path: String) -> Result<(), CliError> {
    let config = AppConfig::load(&config_path)?;

    match command {
        Commands::Serve => {
            unreachable!("Serve command is intercepted by main.rs to boot actix-web")
        }
        Commands::Schema => {
            println!("{}", describe_configured_schema(&config).await?);
            Ok(())
        }
        Commands::Chat { connect } => {
            let llm = ProviderFactory::create_default(&config)?;
            let mut session = ChatSession::from_config(&config, llm);
            let defaults = config.database.connection_params();

            if connect {
                if let Err(e) = session.connect(&defaults).await {
                    eprintln!("Connection failed: {}", e);
                }
            }

            let stdin = io::stdin();
            run_repl(
                &mut session,
                &defaults,
                config.chat.show_query,
                stdin.lock(),
                io::stdout(),
            )
            .await?;
            Ok(())
        }
    }
}

/// Connects with the configured parameters and renders the schema text the
/// model would see. No model provider is needed for this.
pub async fn describe_configured_schema(config: &AppConfig) -> Result<String, CliError> {
    let params = config.database.connection_params();
    let db = connect(&params).await?;
    let schema = provider_for(&config.schema, db, params.schema.clone());
    Ok(schema.describe_schema().await?)
}

/// Applies `key=value` overrides on top of the configured parameters. The
/// password is deliberately not accepted here so it is never typed or echoed.
pub fn parse_connect_args(args: &str, base: &ConnectionParams) -> Result<ConnectionParams, String> {
    let mut params = base.clone();
    for pair in args.split_whitespace() {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{}'", pair))?;
        match key {
            "backend" => params.backend = value.parse::<Backend>()?,
            "host" => params.host = value.to_string(),
            "port" => {
                params.port = value
                    .parse()
                    .map_err(|_| format!("invalid port '{}'", value))?
            }
            "username" | "user" => params.username = value.to_string(),
            "database" | "db" => params.database = value.to_string(),
            "schema" => params.schema = Some(value.to_string()),
            "password" => return Err("the password is read from config or the environment only".to_string()),
            other => return Err(format!("unknown setting '{}'", other)),
        }
    }
    Ok(params)
}

fn render_message<W: Write>(message: &ChatMessage, out: &mut W) -> io::Result<()> {
    let tag = match message.role {
        Role::Human => "You",
        Role::Assistant => "Assistant",
    };
    writeln!(out, "{}> {}", tag, message.content)
}

/// Line-oriented chat loop. Questions are refused until a connection exists.
pub async fn run_repl<R: BufRead, W: Write>(
    session: &mut ChatSession,
    defaults: &ConnectionParams,
    show_query: bool,
    mut input: R,
    mut out: W,
) -> io::Result<()> {
    writeln!(out, "--- SQL Chat ---")?;
    writeln!(out, "Type /help for commands, /exit to quit.")?;
    writeln!(out, "----------------")?;
    for message in session.messages() {
        render_message(message, &mut out)?;
    }
    if !session.is_connected() {
        writeln!(out, "Connect to the database to start chatting: /connect")?;
    }

    loop {
        write!(out, "\nYou> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let (command, args) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        match command {
            "/exit" | "/quit" => break,
            "/help" => writeln!(out, "{}", HELP)?,
            "/history" => {
                for message in session.messages() {
                    render_message(message, &mut out)?;
                }
            }
            "/schema" => match session.describe_schema().await {
                Ok(schema) => writeln!(out, "{}", schema)?,
                Err(e) => writeln!(out, "Error: {}", e)?,
            },
            "/connect" => match parse_connect_args(args, defaults) {
                Ok(params) => match session.connect(&params).await {
                    Ok(()) => writeln!(out, "Connected to database")?,
                    Err(e) => writeln!(out, "Connection failed: {}", e)?,
                },
                Err(e) => writeln!(out, "Error: {}", e)?,
            },
            cmd if cmd.starts_with('/') => {
                writeln!(out, "Unknown command {}. Type /help.", cmd)?
            }
            _ => match session.ask(text).await {
                Ok(interaction) => {
                    if show_query {
                        writeln!(out, "SQL> {}", interaction.query)?;
                    }
                    writeln!(out, "Assistant> {}", interaction.answer)?;
                }
                Err(e) => writeln!(out, "Error: {}", e)?,
            },
        }
    }

    Ok(())
}
