//! Credential-scoped caching and token acquisition for PingOne.
//!
//! This crate provides:
//!
//! - A keyed TTL cache persisted as one JSON document, scoped by
//!   environment, client and region
//! - OAuth2 client-credentials token acquisition against PingOne
//! - A cached token provider and a cached population id resolver
//! - Settings loading and a redacting `tracing` subscriber
//!
//! # Quick Start
//!
//! ```no_run
//! use pingone_cache::{ClientCredentials, ResourceCache, Settings};
//!
//! # async fn example() -> pingone_cache::PingOneResult<()> {
//! let creds = ClientCredentials::new("env-id", "client-id", "client-secret").with_region("EU");
//!
//! let cache = ResourceCache::with_file("/tmp/population-cache.json");
//! if cache.get::<String>(&creds.scope()).await?.is_none() {
//!     cache.set(&creds.scope(), "population-id").await?;
//! }
//!
//! let resolver = Settings::from_env()?.population_resolver()?;
//! let population_id = resolver.resolve(&creds).await?;
//! println!("{population_id}");
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `PINGONE_ENVIRONMENT_ID` | Environment (tenant) id |
//! | `PINGONE_CLIENT_ID` | OAuth client id |
//! | `PINGONE_CLIENT_SECRET` | OAuth client secret |
//! | `PINGONE_REGION` | `NA`, `EU`, `CA`, `AP` or `AU` (default: `NA`) |
//! | `PINGONE_TOKEN_SCOPE` | Optional token request scope |
//! | `PINGONE_CACHE_PATH` | Population cache file |
//! | `PINGONE_TOKEN_CACHE_PATH` | Token cache file (default: in memory) |
//! | `PINGONE_CACHE_TTL_MS` | Cache TTL in milliseconds (default: 24h) |
//! | `PINGONE_TIMEOUT_SECS` | Request timeout in seconds (default: 10) |
//! | `PINGONE_AUTH_BASE_URL` | Authorization server override |
//! | `PINGONE_API_BASE_URL` | Management API override |
//! | `PINGONE_LOG` | Log filter (default: `warn`) |
//! | `PINGONE_LOG_FORMAT` | `text` or `json` |

pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
mod http;
pub mod logging;
pub mod population;
pub mod scope;
pub mod token;

// Re-export main types
pub use auth::{TokenProvider, DEFAULT_EXPIRY_MARGIN};
pub use cache::{
    CacheDocument, CacheEntry, CacheStore, EntryStatus, FileStore, MemoryStore, ResourceCache,
    DEFAULT_TTL_MS,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Settings;
pub use error::{PingOneError, PingOneResult};
pub use http::{DEFAULT_TIMEOUT, USER_AGENT_VALUE};
pub use logging::{LogFormat, LogSettings, Redactor, SecretRedactor};
pub use population::{Population, PopulationResolver};
pub use scope::{ClientCredentials, CredentialScope, Region};
pub use token::{AccessToken, TokenAcquirer};
