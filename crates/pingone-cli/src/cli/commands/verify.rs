use anyhow::Context;
use pingone_cache::{Region, Settings};

use crate::cli::args::VerifyArgs;
use crate::exit_codes;

pub async fn run(args: VerifyArgs, settings: &Settings) -> anyhow::Result<i32> {
    let region = Region::resolve(settings.region.as_deref())?;
    let auth_base = settings
        .auth_base_url
        .clone()
        .unwrap_or_else(|| region.auth_base_url());

    println!("environment_id: {}", display(settings.environment_id.as_deref()));
    println!("client_id:      {}", display(settings.client_id.as_deref()));
    println!(
        "client_secret:  {}",
        if settings.client_secret.is_some() {
            "[set]"
        } else {
            "(not set)"
        }
    );
    println!("region:         {region} ({auth_base})");
    println!(
        "cache_path:     {}",
        settings.resolved_cache_path()?.display()
    );
    println!(
        "cache_ttl:      {}s",
        settings.resource_cache()?.ttl().as_secs()
    );
    println!("timeout:        {}s", settings.request_timeout_secs);

    if args.offline {
        return Ok(exit_codes::SUCCESS);
    }

    let creds = settings.credentials()?;
    let token = settings
        .token_acquirer()?
        .acquire(&creds)
        .await
        .context("credential check failed")?;

    println!(
        "credentials OK: {} token valid for {}s",
        token.token_type, token.expires_in
    );
    Ok(exit_codes::SUCCESS)
}

fn display(value: Option<&str>) -> &str {
    value.unwrap_or("(not set)")
}
