use chrono::Duration;
use clap::Subcommand;
use serde_json::json;

use crate::auth::reset_key::ResetKeyCodec;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;

#[derive(Subcommand)]
pub enum ResetKeyCommands {
    #[command(about = "Generate a reset key for a user")]
    Generate {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "Email address on the account")]
        email: String,
    },

    #[command(about = "Decode a reset key and report whether it has expired")]
    Inspect {
        #[arg(help = "Reset key")]
        key: String,
    },
}

pub async fn handle(cmd: ResetKeyCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let hours = config::config().security.reset_key_validity_hours;
    let codec = ResetKeyCodec::system().with_validity(Duration::hours(hours));

    match cmd {
        ResetKeyCommands::Generate { username, email } => {
            let key = codec.generate(&username, &email)?;
            output_success(&output_format, "Reset key generated", Some(json!({ "key": key })))
        }
        ResetKeyCommands::Inspect { key } => {
            let request = codec.parse(&key)?;
            let expired = request.is_expired_at(codec.now());
            output_success(
                &output_format,
                if expired { "Reset key is well formed but expired" } else { "Reset key is well formed" },
                Some(json!({
                    "username": request.username,
                    "email": request.email,
                    "expiry_date": request.expiry,
                    "expired": expired,
                })),
            )
        }
    }
}
