//! Credential scope and PingOne regions.

use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::cache::keys;
use crate::error::{PingOneError, PingOneResult};

/// The tenant/credential pair a cached value belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialScope {
    pub environment_id: String,
    pub client_id: String,
    /// Region code; `None` composes the same key as [`keys::DEFAULT_REGION`].
    #[serde(default)]
    pub region: Option<String>,
}

impl CredentialScope {
    pub fn new(environment_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            environment_id: environment_id.into(),
            client_id: client_id.into(),
            region: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Stable cache key, `"{environment_id}|{client_id}|{region}"`.
    pub fn cache_key(&self) -> String {
        keys::compose_key(self)
    }
}

/// PingOne deployment region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    NorthAmerica,
    Europe,
    Canada,
    AsiaPacific,
    Australia,
}

impl Region {
    /// Short code as used in cache keys and configuration.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NorthAmerica => "NA",
            Self::Europe => "EU",
            Self::Canada => "CA",
            Self::AsiaPacific => "AP",
            Self::Australia => "AU",
        }
    }

    fn tld(&self) -> &'static str {
        match self {
            Self::NorthAmerica => "com",
            Self::Europe => "eu",
            Self::Canada => "ca",
            Self::AsiaPacific => "asia",
            Self::Australia => "com.au",
        }
    }

    /// Authorization server base, e.g. `https://auth.pingone.eu`.
    pub fn auth_base_url(&self) -> String {
        format!("https://auth.pingone.{}", self.tld())
    }

    /// Management API base, e.g. `https://api.pingone.eu/v1`.
    pub fn api_base_url(&self) -> String {
        format!("https://api.pingone.{}/v1", self.tld())
    }

    /// Resolve an optional region string, defaulting to North America.
    pub fn resolve(region: Option<&str>) -> PingOneResult<Self> {
        region.map_or(Ok(Self::NorthAmerica), str::parse)
    }
}

impl FromStr for Region {
    type Err = PingOneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NA" | "US" | "COM" | "NORTHAMERICA" => Ok(Self::NorthAmerica),
            "EU" | "EUROPE" => Ok(Self::Europe),
            "CA" | "CANADA" => Ok(Self::Canada),
            "AP" | "ASIA" | "ASIAPACIFIC" => Ok(Self::AsiaPacific),
            "AU" | "AUSTRALIA" => Ok(Self::Australia),
            other => Err(PingOneError::config(format!(
                "unknown region '{other}' (expected one of NA, EU, CA, AP, AU)"
            ))),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Client-credentials grant inputs.
pub struct ClientCredentials {
    pub environment_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub region: Option<String>,
    /// Optional `scope` form parameter for the token request.
    pub scope: Option<String>,
}

impl ClientCredentials {
    pub fn new(
        environment_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            environment_id: environment_id.into(),
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            region: None,
            scope: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// The cache scope these credentials act in. The secret is not part of it.
    pub fn scope(&self) -> CredentialScope {
        CredentialScope {
            environment_id: self.environment_id.clone(),
            client_id: self.client_id.clone(),
            region: self.region.clone(),
        }
    }

    pub(crate) fn secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("environment_id", &self.environment_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("region", &self.region)
            .field("scope", &self.scope)
            .finish()
    }
}
