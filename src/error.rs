use std::path::PathBuf;

use thiserror::Error;

/// Batchscribe's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Batchscribe's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs. The variants mirror the two failure classes the
/// orchestrator cares about: run-ending setup problems (see [`Error::is_fatal`]) and
/// per-file problems that are reported and skipped.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(
        "no API key configured: set `api_key` in the config file or the OPENAI_API_KEY environment variable"
    )]
    MissingApiKey,

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("normalization of '{input}' failed: {reason}")]
    Normalize { input: String, reason: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("authentication rejected by the API (HTTP {status}); check your API key")]
    Auth { status: u16 },

    #[error("API quota or rate limit exceeded (HTTP 429)")]
    Quota,

    #[error("API request failed with HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Message(String),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Whether this error must abort the whole run.
    ///
    /// Setup problems (bad configuration, missing key, unusable directories) are fatal;
    /// everything else is a per-file condition the orchestrator converts into a warning
    /// and a skip.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::MissingApiKey | Self::CreateDir { .. }
        )
    }
}
