use clap::Subcommand;
use serde_json::json;

use crate::auth::password::{hash_password, verify_password};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum PasswordCommands {
    #[command(about = "Hash a password for manual insertion into the users table")]
    Hash {
        #[arg(help = "Plain-text password")]
        password: String,
    },

    #[command(about = "Check a password against a stored hash")]
    Verify {
        #[arg(help = "Plain-text password")]
        password: String,
        #[arg(help = "Stored Argon2 hash")]
        hash: String,
    },
}

pub async fn handle(cmd: PasswordCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PasswordCommands::Hash { password } => {
            let hash = hash_password(&password)?;
            output_success(&output_format, "Password hashed", Some(json!({ "hash": hash })))
        }
        PasswordCommands::Verify { password, hash } => {
            if !verify_password(&password, &hash)? {
                anyhow::bail!("Password does not match hash");
            }
            output_success(&output_format, "Password matches hash", None)
        }
    }
}
