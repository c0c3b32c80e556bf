//! Error types for the cache and token components.

use std::path::PathBuf;

/// Errors surfaced by the cache, token and population components.
///
/// A cache miss is not an error: lookups return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum PingOneError {
    /// The persisted cache document could not be read, parsed or written.
    #[error("cache persistence failed at {}: {message}", .path.display())]
    Persistence { path: PathBuf, message: String },

    /// The identity provider rejected the credentials or the request.
    ///
    /// `body` is the provider's error payload, verbatim.
    #[error("authentication failed: HTTP {status}: {body}")]
    Authentication { status: u16, body: String },

    /// The identity provider could not be reached.
    #[error("transport error{}: {message}", timeout_suffix(.timed_out))]
    Transport { message: String, timed_out: bool },

    /// The provider answered 2xx with a body we could not decode.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Management API returned a non-success status other than 401/403.
    #[error("api error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The environment has no population to resolve.
    #[error("no population found in environment {environment_id}")]
    NoPopulation { environment_id: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl PingOneError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 1,
            Self::Authentication { .. } => 2,
            Self::Transport { .. } => 3,
            Self::InvalidResponse { .. } | Self::Api { .. } | Self::NoPopulation { .. } => 4,
            Self::Persistence { .. } => 5,
        }
    }

    /// Whether a caller may reasonably retry the operation.
    ///
    /// Only transport failures qualify; credentials rejected by the provider
    /// will be rejected again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<reqwest::Error> for PingOneError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

fn timeout_suffix(timed_out: &bool) -> &'static str {
    if *timed_out {
        " (timed out)"
    } else {
        ""
    }
}

/// Result type for cache and token operations.
pub type PingOneResult<T> = Result<T, PingOneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_retryable() {
        let transport = PingOneError::Transport {
            message: "connection refused".into(),
            timed_out: false,
        };
        let auth = PingOneError::Authentication {
            status: 401,
            body: "{\"error\":\"invalid_client\"}".into(),
        };
        assert!(transport.is_retryable());
        assert!(!auth.is_retryable());
        assert!(!PingOneError::persistence("/tmp/x.json", "denied").is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = PingOneError::Authentication {
            status: 401,
            body: "bad secret".into(),
        };
        assert_eq!(err.to_string(), "authentication failed: HTTP 401: bad secret");

        let err = PingOneError::Transport {
            message: "deadline".into(),
            timed_out: true,
        };
        assert_eq!(err.to_string(), "transport error (timed out): deadline");

        let err = PingOneError::persistence("/var/cache/p.json", "permission denied");
        assert_eq!(
            err.to_string(),
            "cache persistence failed at /var/cache/p.json: permission denied"
        );
    }

    #[test]
    fn test_exit_codes_distinguish_auth_from_transport() {
        let auth = PingOneError::Authentication {
            status: 400,
            body: String::new(),
        };
        let transport = PingOneError::Transport {
            message: String::new(),
            timed_out: false,
        };
        assert_ne!(auth.exit_code(), transport.exit_code());
    }
}
