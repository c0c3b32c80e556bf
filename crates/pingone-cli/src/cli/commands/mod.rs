use super::args::*;

pub mod cache;
pub mod population;
pub mod token;
pub mod verify;

use anyhow::Context;
use pingone_cache::{logging, LogFormat, Settings};

pub async fn dispatch(cli: Cli, settings: &Settings) -> anyhow::Result<i32> {
    logging::init(&settings.log_settings()).context("failed to initialize logging")?;

    match cli.cmd {
        Command::Token(args) => token::run(args, settings).await,
        Command::Verify(args) => verify::run(args, settings).await,
        Command::Population(args) => population::run(args, settings).await,
        Command::Cache(args) => cache::run(args, settings).await,
    }
}

/// File, then environment, then flags.
pub(crate) fn load_settings(global: &GlobalArgs) -> anyhow::Result<Settings> {
    let mut settings = Settings::load(global.config.as_deref())?;

    if let Some(env_id) = &global.env_id {
        settings = settings.with_environment_id(env_id.as_str());
    }
    if let Some(client_id) = &global.client_id {
        settings = settings.with_client_id(client_id.as_str());
    }
    if let Some(region) = &global.region {
        settings = settings.with_region(region.as_str());
    }
    if let Some(path) = &global.cache_path {
        settings = settings.with_cache_path(path.as_path());
    }
    if let Some(level) = &global.log_level {
        settings = settings.with_log_level(level.as_str());
    }
    if global.json_logs {
        settings = settings.with_log_format(LogFormat::Json);
    }
    Ok(settings)
}
