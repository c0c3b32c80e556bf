//! Population id lookup through the resource cache.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::auth::TokenProvider;
use crate::cache::ResourceCache;
use crate::error::{PingOneError, PingOneResult};
use crate::http;
use crate::scope::{ClientCredentials, Region};

/// A PingOne population as returned by the management API.
#[derive(Debug, Clone, Deserialize)]
pub struct Population {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Deserialize)]
struct PopulationsPage {
    #[serde(rename = "_embedded", default)]
    embedded: EmbeddedPopulations,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddedPopulations {
    #[serde(default)]
    populations: Vec<Population>,
}

/// Pick the population flagged `default`, else the first one listed.
pub fn select_default(populations: &[Population]) -> Option<&Population> {
    populations
        .iter()
        .find(|p| p.default)
        .or_else(|| populations.first())
}

/// Resolves the population id for a credential scope, caching the answer.
#[derive(Debug, Clone)]
pub struct PopulationResolver {
    tokens: TokenProvider,
    cache: ResourceCache,
    client: reqwest::Client,
    api_base_url: Option<String>,
}

impl PopulationResolver {
    pub fn new(
        tokens: TokenProvider,
        cache: ResourceCache,
        timeout: Duration,
    ) -> PingOneResult<Self> {
        Ok(Self {
            tokens,
            cache,
            client: http::build_client(timeout)?,
            api_base_url: None,
        })
    }

    /// Query `url` instead of the region's management API host.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// The population id for `creds`, from cache or from the management API.
    pub async fn resolve(&self, creds: &ClientCredentials) -> PingOneResult<String> {
        let scope = creds.scope();

        if let Some(id) = self.cache.get::<String>(&scope).await? {
            debug!(key = %scope.cache_key(), "population id from cache");
            return Ok(id);
        }

        let population = self.fetch_default(creds).await?;
        self.cache.set(&scope, &population.id).await?;

        info!(
            environment_id = %creds.environment_id,
            population_id = %population.id,
            "resolved population"
        );
        Ok(population.id)
    }

    async fn fetch_default(&self, creds: &ClientCredentials) -> PingOneResult<Population> {
        let token = self.tokens.token(creds).await?;
        let base = match &self.api_base_url {
            Some(base) => base.clone(),
            None => Region::resolve(creds.region.as_deref())?.api_base_url(),
        };
        let url = format!("{}/environments/{}/populations", base, creds.environment_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token.access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(status = status.as_u16(), "population lookup not authorized");
            return Err(PingOneError::Authentication {
                status: status.as_u16(),
                body: http::body_text(response).await,
            });
        }
        if !status.is_success() {
            return Err(PingOneError::Api {
                status: status.as_u16(),
                body: http::body_text(response).await,
            });
        }

        let page: PopulationsPage =
            response
                .json()
                .await
                .map_err(|e| PingOneError::InvalidResponse {
                    message: format!("failed to parse populations: {e}"),
                })?;

        select_default(&page.embedded.populations)
            .cloned()
            .ok_or_else(|| PingOneError::NoPopulation {
                environment_id: creds.environment_id.clone(),
            })
    }
}
