use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pingone",
    version,
    about = "PingOne client-credentials tokens and credential-scoped population cache"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

/// Flags that override file and environment settings.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// YAML settings file
    #[arg(long, global = true, env = "PINGONE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Environment (tenant) id
    #[arg(long, global = true)]
    pub env_id: Option<String>,

    #[arg(long, global = true)]
    pub client_id: Option<String>,

    /// NA, EU, CA, AP or AU
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Population cache file
    #[arg(long, global = true)]
    pub cache_path: Option<PathBuf>,

    /// Log filter, e.g. info or pingone_cache=debug
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Acquire an access token with the configured client credentials
    Token(TokenArgs),
    /// Show effective settings and test the credentials
    Verify(VerifyArgs),
    /// Resolve the population id, using the cache when fresh
    Population(PopulationArgs),
    /// Inspect or seed the population cache
    Cache(CacheArgs),
}

#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Print the full token instead of a prefix
    #[arg(long)]
    pub show: bool,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Only print settings; do not contact PingOne
    #[arg(long)]
    pub offline: bool,
}

#[derive(Args, Debug)]
pub struct PopulationArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub cmd: CacheCommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Print the cached population id for the configured scope
    Get,
    /// Store a population id for the configured scope
    Set {
        population_id: String,
    },
    /// List every entry with its freshness
    List {
        #[arg(long)]
        json: bool,
    },
}
