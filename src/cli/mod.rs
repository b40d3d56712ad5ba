pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "blogctl")]
#[command(about = "Blog API administration tool")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Generate and inspect password reset keys")]
    ResetKey {
        #[command(subcommand)]
        cmd: commands::reset_key::ResetKeyCommands,
    },

    #[command(about = "Password hashing utilities")]
    Password {
        #[command(subcommand)]
        cmd: commands::password::PasswordCommands,
    },

    #[command(about = "Database maintenance")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
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
        Commands::ResetKey { cmd } => commands::reset_key::handle(cmd, output_format).await,
        Commands::Password { cmd } => commands::password::handle(cmd, output_format).await,
        Commands::Db { cmd } => commands::db::handle(cmd, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reset_key_generate() {
        let cli = Cli::try_parse_from(["blogctl", "--json", "reset-key", "generate", "leanne", "leanne@example.com"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        assert!(matches!(
            cli.command,
            Commands::ResetKey { cmd: commands::reset_key::ResetKeyCommands::Generate { .. } }
        ));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["blogctl", "posts", "list"]).is_err());
    }
}
