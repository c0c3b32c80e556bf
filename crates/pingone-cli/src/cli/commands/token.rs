use anyhow::Context;
use chrono::{DateTime, SecondsFormat};
use pingone_cache::Settings;

use crate::cli::args::TokenArgs;
use crate::exit_codes;

pub async fn run(args: TokenArgs, settings: &Settings) -> anyhow::Result<i32> {
    let creds = settings.credentials()?;
    let provider = settings.token_provider()?;

    let token = provider
        .token(&creds)
        .await
        .with_context(|| format!("acquiring token for environment {}", creds.environment_id))?;

    let shown = if args.show {
        token.access_token.clone()
    } else {
        token.preview()
    };
    let expires_at = DateTime::from_timestamp_millis(token.expires_at_ms())
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));

    if args.json {
        let out = serde_json::json!({
            "access_token": shown,
            "token_type": token.token_type,
            "expires_in": token.expires_in,
            "expires_at": expires_at,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{shown}");
        eprintln!(
            "{} token, expires in {}s{}",
            token.token_type,
            token.expires_in,
            expires_at.map(|t| format!(" ({t})")).unwrap_or_default()
        );
    }

    Ok(exit_codes::SUCCESS)
}
