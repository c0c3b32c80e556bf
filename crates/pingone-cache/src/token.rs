//! Client-credentials token acquisition.
//!
//! One POST per call to `{auth_base}/{environment_id}/as/token`, authenticated
//! with HTTP Basic. Nothing is cached and nothing is retried here: pair the
//! acquirer with [`TokenProvider`](crate::auth::TokenProvider) for caching,
//! and decide on retries with [`PingOneError::is_retryable`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{PingOneError, PingOneResult};
use crate::http;
use crate::scope::{ClientCredentials, Region};

/// Bearer token issued by the authorization server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds, as reported by the provider.
    pub expires_in: u64,
    /// Epoch milliseconds at which the token was received.
    pub issued_at_ms: i64,
}

impl AccessToken {
    pub fn expires_at_ms(&self) -> i64 {
        let lifetime_ms = i64::try_from(self.expires_in.saturating_mul(1000)).unwrap_or(i64::MAX);
        self.issued_at_ms.saturating_add(lifetime_ms)
    }

    /// Whether the token is still usable at `now_ms` with `margin` to spare.
    pub fn is_usable_at(&self, now_ms: i64, margin: Duration) -> bool {
        let margin_ms = i64::try_from(margin.as_millis()).unwrap_or(i64::MAX);
        now_ms < self.expires_at_ms().saturating_sub(margin_ms)
    }

    /// First characters of the token, for display.
    pub fn preview(&self) -> String {
        let head: String = self.access_token.chars().take(8).collect();
        format!("{head}…")
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("issued_at_ms", &self.issued_at_ms)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: u64,
}

/// Performs the client-credentials exchange.
#[derive(Clone)]
pub struct TokenAcquirer {
    client: reqwest::Client,
    auth_base_url: Option<String>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenAcquirer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAcquirer")
            .field("auth_base_url", &self.auth_base_url)
            .finish_non_exhaustive()
    }
}

impl TokenAcquirer {
    /// Create an acquirer whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> PingOneResult<Self> {
        Ok(Self {
            client: http::build_client(timeout)?,
            auth_base_url: None,
            clock: Arc::new(SystemClock),
        })
    }

    /// Create an acquirer with the default 10 second timeout.
    pub fn with_defaults() -> PingOneResult<Self> {
        Self::new(http::DEFAULT_TIMEOUT)
    }

    /// Send token requests to `url` instead of the region's PingOne host.
    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Token endpoint for `creds`.
    pub fn token_url(&self, creds: &ClientCredentials) -> PingOneResult<String> {
        let base = match &self.auth_base_url {
            Some(base) => base.clone(),
            None => Region::resolve(creds.region.as_deref())?.auth_base_url(),
        };
        Ok(format!("{}/{}/as/token", base, creds.environment_id))
    }

    /// Exchange client credentials for an access token.
    ///
    /// # Errors
    ///
    /// - [`PingOneError::Authentication`] when the provider answers non-2xx;
    ///   the body is kept verbatim.
    /// - [`PingOneError::Transport`] when the provider cannot be reached or
    ///   the timeout elapses.
    /// - [`PingOneError::InvalidResponse`] when a 2xx body is not a token.
    pub async fn acquire(&self, creds: &ClientCredentials) -> PingOneResult<AccessToken> {
        let url = self.token_url(creds)?;
        debug!(
            url = %url,
            environment_id = %creds.environment_id,
            client_id = %creds.client_id,
            "requesting access token"
        );

        let basic = BASE64.encode(format!("{}:{}", creds.client_id, creds.secret()));
        let mut form = vec![("grant_type", "client_credentials")];
        if let Some(scope) = creds.scope.as_deref() {
            form.push(("scope", scope));
        }

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Basic {basic}"))
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    environment_id = %creds.environment_id,
                    timed_out = e.is_timeout(),
                    "token endpoint unreachable"
                );
                PingOneError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = http::body_text(response).await;
            warn!(
                status = status.as_u16(),
                environment_id = %creds.environment_id,
                client_id = %creds.client_id,
                "token request rejected"
            );
            return Err(PingOneError::Authentication {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| PingOneError::InvalidResponse {
                    message: format!("failed to parse token response: {e}"),
                })?;

        info!(
            environment_id = %creds.environment_id,
            client_id = %creds.client_id,
            expires_in = token.expires_in,
            token_type = %token.token_type,
            "obtained access token"
        );

        Ok(AccessToken {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
            issued_at_ms: self.clock.now_ms(),
        })
    }
}
