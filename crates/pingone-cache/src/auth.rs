//! Cached access tokens.
//!
//! [`TokenProvider`] keeps one token per credential scope in a
//! [`ResourceCache`] and asks the [`TokenAcquirer`] for a new one when the
//! cached token is missing or about to expire. Concurrent misses are not
//! coalesced; each caller acquires on its own.

use std::time::Duration;

use tracing::debug;

use crate::cache::ResourceCache;
use crate::error::PingOneResult;
use crate::scope::ClientCredentials;
use crate::token::{AccessToken, TokenAcquirer};

/// Tokens this close to expiry are treated as expired.
pub const DEFAULT_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct TokenProvider {
    acquirer: TokenAcquirer,
    cache: ResourceCache,
    margin: Duration,
}

impl TokenProvider {
    pub fn new(acquirer: TokenAcquirer, cache: ResourceCache) -> Self {
        Self {
            acquirer,
            cache,
            margin: DEFAULT_EXPIRY_MARGIN,
        }
    }

    pub fn with_expiry_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// A usable token for `creds`, from cache when possible.
    pub async fn token(&self, creds: &ClientCredentials) -> PingOneResult<AccessToken> {
        let scope = creds.scope();

        if let Some(cached) = self.cache.get::<AccessToken>(&scope).await? {
            if cached.is_usable_at(self.cache.clock().now_ms(), self.margin) {
                debug!(key = %scope.cache_key(), "using cached access token");
                return Ok(cached);
            }
            debug!(key = %scope.cache_key(), "cached access token near expiry");
        }

        let token = self.acquirer.acquire(creds).await?;
        self.cache.set(&scope, &token).await?;
        Ok(token)
    }
}
