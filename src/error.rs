use std::path::PathBuf;

use thiserror::Error;

/// Why a single lookup did not produce a result.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("network error: {0}")]
    Network(reqwest::Error),

    #[error("lookup rejected ({status}): {message}")]
    Remote {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("unexpected response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no ipify API key configured")]
    MissingApiKey,
}

/// Request URLs carry the API key, so they are stripped before the error
/// can reach a log line or a toast.
impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        LookupError::Network(e.without_url())
    }
}

impl LookupError {
    /// Short text for the in-window toast.
    pub fn summary(&self) -> String {
        match self {
            LookupError::Network(_) => "Could not reach the lookup service".to_string(),
            LookupError::Remote { message, .. } if !message.is_empty() => message.clone(),
            LookupError::Remote { status, .. } => format!("Lookup failed ({})", status),
            LookupError::Parse(_) => "Lookup service returned unexpected data".to_string(),
            LookupError::MissingApiKey => "No API key configured".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no ipify API key: set IPIFY_API_KEY or api_key in the config file")]
    MissingApiKey,

    #[error("could not build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
