pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "smartsaver")]
#[command(about = "SmartSaver CLI - Development helpers for the SmartSaver API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print a development bearer token (not for production)")]
    DevToken {
        #[arg(help = "User id to embed; a random test_xxxxxxxx id when omitted")]
        user_id: Option<String>,
    },

    #[command(about = "Check server health status from the API /health endpoint")]
    Health {
        #[arg(long, default_value = commands::health::DEFAULT_SERVER_URL, help = "Server base URL")]
        url: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::DevToken { user_id } => commands::dev_token::handle(user_id, output_format),
        Commands::Health { url } => commands::health::handle(&url, output_format).await,
    }
}
