//! Subscriber setup with redaction at the sink.
//!
//! Library code logs through `tracing` and never passes secrets as fields.
//! The writer installed by [`init`] runs every formatted line through a
//! [`Redactor`] anyway, so a secret that reaches a log line through an
//! upstream error message is still masked.
//!
//! Redaction scope:
//! 1. Registered secret values (the configured client secret).
//! 2. `Basic <credentials>` and `Bearer <token>`: value only.
//! 3. JSON `"access_token"` and `"client_secret"` string values, and the
//!    same names in form-encoded pairs.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::error::{PingOneError, PingOneResult};

const REDACTED: &str = "[REDACTED]";

/// Registered secrets shorter than this are not masked; they would match
/// ordinary words.
const MIN_SECRET_LEN: usize = 4;

lazy_static! {
    static ref AUTH_SCHEME: Regex =
        Regex::new(r"(?i)\b(basic|bearer)\s+[A-Za-z0-9._~+/=-]+").unwrap();
    static ref JSON_SECRET_FIELD: Regex =
        Regex::new(r#""(access_token|client_secret)"\s*:\s*"[^"]*""#).unwrap();
    static ref FORM_SECRET_FIELD: Regex =
        Regex::new(r"\b(access_token|client_secret)=[^&\s]+").unwrap();
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = PingOneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(PingOneError::config(format!(
                "unknown log format '{other}' (expected text or json)"
            ))),
        }
    }
}

/// Inputs for [`init`].
#[derive(Clone, Default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset, e.g. `info`.
    pub level: String,
    pub format: LogFormat,
    /// Values to mask verbatim wherever they appear.
    pub secrets: Vec<String>,
}

impl fmt::Debug for LogSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSettings")
            .field("level", &self.level)
            .field("format", &self.format)
            .field("secrets", &self.secrets.len())
            .finish()
    }
}

/// Rewrites a formatted log line before it reaches the sink.
pub trait Redactor: Send + Sync {
    fn redact(&self, line: &str) -> String;
}

/// Default [`Redactor`]: registered secrets plus credential-shaped patterns.
#[derive(Default)]
pub struct SecretRedactor {
    secrets: Vec<String>,
}

impl SecretRedactor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if secret.len() >= MIN_SECRET_LEN {
            self.secrets.push(secret);
        }
        self
    }
}

impl Redactor for SecretRedactor {
    fn redact(&self, line: &str) -> String {
        let mut out = line.to_string();
        for secret in &self.secrets {
            if out.contains(secret.as_str()) {
                out = out.replace(secret.as_str(), REDACTED);
            }
        }
        let out = AUTH_SCHEME.replace_all(&out, format!("$1 {REDACTED}"));
        let out = JSON_SECRET_FIELD.replace_all(&out, format!("\"$1\":\"{REDACTED}\""));
        let out = FORM_SECRET_FIELD.replace_all(&out, format!("$1={REDACTED}"));
        out.into_owned()
    }
}

/// [`MakeWriter`] that redacts each event before handing it to `inner`.
pub struct RedactingMakeWriter<M> {
    inner: M,
    redactor: Arc<dyn Redactor>,
}

impl<M> RedactingMakeWriter<M> {
    pub fn new(inner: M, redactor: Arc<dyn Redactor>) -> Self {
        Self { inner, redactor }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for RedactingMakeWriter<M> {
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            redactor: Arc::clone(&self.redactor),
            buf: Vec::new(),
        }
    }
}

/// Buffers one event and writes the redacted text on flush or drop.
pub struct RedactingWriter<W: Write> {
    inner: W,
    redactor: Arc<dyn Redactor>,
    buf: Vec<u8>,
}

impl<W: Write> RedactingWriter<W> {
    fn emit(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&self.buf);
        let redacted = self.redactor.redact(&text);
        self.buf.clear();
        self.inner.write_all(redacted.as_bytes())
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit()?;
        self.inner.flush()
    }
}

impl<W: Write> Drop for RedactingWriter<W> {
    fn drop(&mut self) {
        let _ = self.emit();
    }
}

/// Install the global subscriber, writing redacted lines to stderr.
///
/// `RUST_LOG` takes precedence over `settings.level`. Fails if a global
/// subscriber is already set.
pub fn init(settings: &LogSettings) -> PingOneResult<()> {
    let level = if settings.level.is_empty() {
        "warn"
    } else {
        settings.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| PingOneError::config(format!("invalid log level '{level}': {e}")))?;

    let redactor = settings
        .secrets
        .iter()
        .fold(SecretRedactor::new(), |r, s| r.with_secret(s.as_str()));
    let writer = RedactingMakeWriter::new(io::stderr, Arc::new(redactor));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false);

    let installed = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| PingOneError::config(format!("failed to install logger: {e}")))
}
