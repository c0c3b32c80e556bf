//! Settings for the cache, token and population components.
//!
//! Sources, lowest to highest priority: built-in defaults, a YAML file,
//! `PINGONE_*` environment variables, then whatever the caller applies with
//! the `with_*` builders (the CLI maps its flags onto those).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::TokenProvider;
use crate::cache::{io, FileStore, MemoryStore, ResourceCache, DEFAULT_TTL_MS};
use crate::error::{PingOneError, PingOneResult};
use crate::logging::{LogFormat, LogSettings};
use crate::population::PopulationResolver;
use crate::scope::{ClientCredentials, CredentialScope};
use crate::token::TokenAcquirer;

/// File name of the population cache inside the user cache directory.
pub const DEFAULT_CACHE_FILE: &str = "population-cache.json";

fn default_cache_ttl_ms() -> u64 {
    DEFAULT_TTL_MS
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_expiry_margin_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub environment_id: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    /// Never serialized back out.
    #[serde(default, skip_serializing)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Optional `scope` for the token request.
    #[serde(default)]
    pub token_scope: Option<String>,

    /// Population cache file. Defaults to the user cache directory.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Token cache file. Tokens stay in memory when unset.
    #[serde(default)]
    pub token_cache_path: Option<PathBuf>,

    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_expiry_margin_secs")]
    pub token_expiry_margin_secs: u64,

    #[serde(default)]
    pub auth_base_url: Option<String>,

    #[serde(default)]
    pub api_base_url: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment_id: None,
            client_id: None,
            client_secret: None,
            region: None,
            token_scope: None,
            cache_path: None,
            token_cache_path: None,
            cache_ttl_ms: default_cache_ttl_ms(),
            request_timeout_secs: default_timeout_secs(),
            token_expiry_margin_secs: default_expiry_margin_secs(),
            auth_base_url: None,
            api_base_url: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("environment_id", &self.environment_id)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("region", &self.region)
            .field("token_scope", &self.token_scope)
            .field("cache_path", &self.cache_path)
            .field("token_cache_path", &self.token_cache_path)
            .field("cache_ttl_ms", &self.cache_ttl_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("token_expiry_margin_secs", &self.token_expiry_margin_secs)
            .field("auth_base_url", &self.auth_base_url)
            .field("api_base_url", &self.api_base_url)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Settings {
    /// Defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> PingOneResult<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env()?;
        Ok(settings)
    }

    /// Parse a YAML settings file.
    pub fn from_file(path: &Path) -> PingOneResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PingOneError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(&content).map_err(|e| {
            PingOneError::config(format!("invalid settings in {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loaded settings file");
        Ok(settings)
    }

    /// Defaults overlaid with the environment.
    pub fn from_env() -> PingOneResult<Self> {
        let mut settings = Self::default();
        settings.apply_env()?;
        Ok(settings)
    }

    /// Overlay every `PINGONE_*` variable that is set and non-empty.
    pub fn apply_env(&mut self) -> PingOneResult<()> {
        overlay(&mut self.environment_id, "PINGONE_ENVIRONMENT_ID");
        overlay(&mut self.client_id, "PINGONE_CLIENT_ID");
        overlay(&mut self.client_secret, "PINGONE_CLIENT_SECRET");
        overlay(&mut self.region, "PINGONE_REGION");
        overlay(&mut self.token_scope, "PINGONE_TOKEN_SCOPE");
        overlay(&mut self.auth_base_url, "PINGONE_AUTH_BASE_URL");
        overlay(&mut self.api_base_url, "PINGONE_API_BASE_URL");

        if let Some(path) = env_value("PINGONE_CACHE_PATH") {
            self.cache_path = Some(PathBuf::from(path));
        }
        if let Some(path) = env_value("PINGONE_TOKEN_CACHE_PATH") {
            self.token_cache_path = Some(PathBuf::from(path));
        }
        if let Some(ttl) = env_number("PINGONE_CACHE_TTL_MS")? {
            self.cache_ttl_ms = ttl;
        }
        if let Some(secs) = env_number("PINGONE_TIMEOUT_SECS")? {
            self.request_timeout_secs = secs;
        }
        if let Some(level) = env_value("PINGONE_LOG") {
            self.log_level = level;
        }
        if let Some(format) = env_value("PINGONE_LOG_FORMAT") {
            self.log_format = format.parse()?;
        }
        Ok(())
    }

    pub fn with_environment_id(mut self, id: impl Into<String>) -> Self {
        self.environment_id = Some(id.into());
        self
    }

    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Credentials for the token request.
    ///
    /// # Errors
    ///
    /// [`PingOneError::Config`] naming every missing field.
    pub fn credentials(&self) -> PingOneResult<ClientCredentials> {
        let missing: Vec<&str> = [
            ("environment_id", &self.environment_id),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ]
        .iter()
        .filter(|(_, v)| v.as_deref().unwrap_or_default().trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        match (&self.environment_id, &self.client_id, &self.client_secret) {
            (Some(env), Some(cid), Some(secret)) if missing.is_empty() => {
                let mut creds = ClientCredentials::new(env.as_str(), cid.as_str(), secret.as_str());
                creds.region = self.region.clone();
                creds.scope = self.token_scope.clone();
                Ok(creds)
            }
            _ => Err(PingOneError::config(format!(
                "missing required settings: {}",
                missing.join(", ")
            ))),
        }
    }

    /// Cache scope for the configured environment and client. The secret is
    /// not required.
    pub fn scope(&self) -> PingOneResult<CredentialScope> {
        let (Some(env), Some(cid)) = (
            self.environment_id.as_deref().filter(|s| !s.trim().is_empty()),
            self.client_id.as_deref().filter(|s| !s.trim().is_empty()),
        ) else {
            return Err(PingOneError::config(
                "environment_id and client_id are required",
            ));
        };
        let scope = CredentialScope::new(env, cid);
        Ok(match &self.region {
            Some(region) => scope.with_region(region.as_str()),
            None => scope,
        })
    }

    /// Population cache file, explicit or under the user cache directory.
    pub fn resolved_cache_path(&self) -> PingOneResult<PathBuf> {
        match &self.cache_path {
            Some(path) => Ok(path.clone()),
            None => Ok(io::default_cache_dir()?.join(DEFAULT_CACHE_FILE)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            level: self.log_level.clone(),
            format: self.log_format,
            secrets: self.client_secret.iter().cloned().collect(),
        }
    }

    /// Population cache with the configured TTL.
    pub fn resource_cache(&self) -> PingOneResult<ResourceCache> {
        Ok(ResourceCache::new(
            Arc::new(FileStore::new(self.resolved_cache_path()?)),
            Duration::from_millis(self.cache_ttl_ms),
        ))
    }

    /// Token cache: file-backed when `token_cache_path` is set, else memory.
    ///
    /// Token validity is governed by each token's own expiry, so the cache
    /// TTL is left unbounded.
    pub fn token_cache(&self) -> ResourceCache {
        let ttl = Duration::from_millis(u64::MAX);
        match &self.token_cache_path {
            Some(path) => ResourceCache::new(Arc::new(FileStore::new(path)), ttl),
            None => ResourceCache::new(Arc::new(MemoryStore::new()), ttl),
        }
    }

    pub fn token_acquirer(&self) -> PingOneResult<TokenAcquirer> {
        let acquirer = TokenAcquirer::new(self.request_timeout())?;
        Ok(match &self.auth_base_url {
            Some(url) => acquirer.with_auth_base_url(validated_url(url)?),
            None => acquirer,
        })
    }

    pub fn token_provider(&self) -> PingOneResult<TokenProvider> {
        Ok(
            TokenProvider::new(self.token_acquirer()?, self.token_cache())
                .with_expiry_margin(Duration::from_secs(self.token_expiry_margin_secs)),
        )
    }

    pub fn population_resolver(&self) -> PingOneResult<PopulationResolver> {
        let resolver = PopulationResolver::new(
            self.token_provider()?,
            self.resource_cache()?,
            self.request_timeout(),
        )?;
        Ok(match &self.api_base_url {
            Some(url) => resolver.with_api_base_url(validated_url(url)?),
            None => resolver,
        })
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn overlay(field: &mut Option<String>, name: &str) {
    if let Some(value) = env_value(name) {
        *field = Some(value);
    }
}

fn env_number(name: &str) -> PingOneResult<Option<u64>> {
    env_value(name)
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| PingOneError::config(format!("{name} must be a number, got '{v}'")))
        })
        .transpose()
}

fn validated_url(raw: &str) -> PingOneResult<String> {
    let url = url::Url::parse(raw)
        .map_err(|e| PingOneError::config(format!("invalid base URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PingOneError::config(format!(
            "base URL '{raw}' must use http or https"
        )));
    }
    Ok(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "PINGONE_ENVIRONMENT_ID",
        "PINGONE_CLIENT_ID",
        "PINGONE_CLIENT_SECRET",
        "PINGONE_REGION",
        "PINGONE_TOKEN_SCOPE",
        "PINGONE_CACHE_PATH",
        "PINGONE_TOKEN_CACHE_PATH",
        "PINGONE_CACHE_TTL_MS",
        "PINGONE_TIMEOUT_SECS",
        "PINGONE_AUTH_BASE_URL",
        "PINGONE_API_BASE_URL",
        "PINGONE_LOG",
        "PINGONE_LOG_FORMAT",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.cache_ttl_ms, 86_400_000);
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.token_expiry_margin_secs, 60);
        assert_eq!(settings.log_format, LogFormat::Text);
    }

    #[test]
    fn test_yaml_partial_uses_defaults() {
        let settings: Settings = serde_yaml::from_str(
            "environment_id: env1\nclient_id: cid1\nregion: EU\nlog_format: json\n",
        )
        .unwrap();
        assert_eq!(settings.environment_id.as_deref(), Some("env1"));
        assert_eq!(settings.region.as_deref(), Some("EU"));
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.request_timeout_secs, 10);
    }

    #[test]
    fn test_yaml_unknown_field_rejected() {
        let result: Result<Settings, _> = serde_yaml::from_str("enviroment_id: env1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_masks_secret() {
        let settings = Settings::default().with_client_secret("s3cr3t-value");
        let dbg = format!("{settings:?}");
        assert!(!dbg.contains("s3cr3t-value"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn test_secret_not_serialized() {
        let settings = Settings::default().with_client_secret("s3cr3t-value");
        let yaml = serde_yaml::to_string(&settings).unwrap();
        assert!(!yaml.contains("s3cr3t-value"));
    }

    #[test]
    fn test_credentials_names_missing_fields() {
        let settings = Settings::default().with_environment_id("env1");
        let err = settings.credentials().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("client_id"));
        assert!(msg.contains("client_secret"));
        assert!(!msg.contains("environment_id"));
    }

    #[test]
    fn test_credentials_carry_region_and_scope() {
        let mut settings = Settings::default()
            .with_environment_id("env1")
            .with_client_id("cid1")
            .with_client_secret("secret")
            .with_region("EU");
        settings.token_scope = Some("p1:read:user".into());

        let creds = settings.credentials().unwrap();
        assert_eq!(creds.region.as_deref(), Some("EU"));
        assert_eq!(creds.scope.as_deref(), Some("p1:read:user"));
    }

    #[test]
    fn test_scope_without_secret() {
        let settings = Settings::default()
            .with_environment_id("env1")
            .with_client_id("cid1");
        assert_eq!(settings.scope().unwrap().cache_key(), "env1|cid1|NA");

        assert!(Settings::default().with_client_id("cid1").scope().is_err());
    }

    #[test]
    fn test_explicit_cache_path_wins() {
        let settings = Settings::default().with_cache_path("/tmp/p.json");
        assert_eq!(
            settings.resolved_cache_path().unwrap(),
            PathBuf::from("/tmp/p.json")
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut settings = Settings::default();
        settings.auth_base_url = Some("ftp://example.com".into());
        assert!(matches!(
            settings.token_acquirer(),
            Err(PingOneError::Config { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pingone.yaml");
        std::fs::write(&path, "environment_id: from-file\nclient_id: cid1\n").unwrap();

        std::env::set_var("PINGONE_ENVIRONMENT_ID", "from-env");
        std::env::set_var("PINGONE_CACHE_TTL_MS", "5000");
        std::env::set_var("PINGONE_CLIENT_SECRET", "");

        let settings = Settings::load(Some(&path)).unwrap();
        clear_env();

        assert_eq!(settings.environment_id.as_deref(), Some("from-env"));
        assert_eq!(settings.client_id.as_deref(), Some("cid1"));
        assert_eq!(settings.cache_ttl_ms, 5000);
        assert!(settings.client_secret.is_none());
    }

    #[test]
    #[serial]
    fn test_env_bad_number_is_config_error() {
        clear_env();
        std::env::set_var("PINGONE_TIMEOUT_SECS", "soon");
        let result = Settings::from_env();
        clear_env();
        assert!(matches!(result, Err(PingOneError::Config { .. })));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let result = Settings::from_file(&dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(PingOneError::Config { .. })));
    }
}
