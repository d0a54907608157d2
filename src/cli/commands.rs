use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sqlchat", version, about = "Chat with a SQL database in plain language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Enter the interactive terminal chat
    Chat {
        /// Connect with the configured database parameters right away
        #[arg(long)]
        connect: bool,
    },

    /// Connect with the configured parameters and print the schema text given to the model
    Schema,
}
