//! Error types for the IP refresher
//!
//! Configuration variants are startup-fatal. Everything else is raised by a
//! single poll cycle and is logged and absorbed by the engine.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for IP refresher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the IP refresher
#[derive(Error, Debug)]
pub enum Error {
    /// The public IP could not be fetched (no connectivity, upstream failure,
    /// empty answer)
    #[error("IP lookup failed: {0}")]
    IpLookup(String),

    /// The lookup service answered with something that is not an IP address
    #[error("Invalid IP address: {0}")]
    InvalidIp(String),

    /// Previous-IP cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// No config file existed; a template may have been written in its place
    #[error("Config file {} not found{}", path.display(), if *template_written { " (a template was created, fill in the credentials)" } else { "" })]
    ConfigMissing {
        path: PathBuf,
        template_written: bool,
    },

    /// Config file exists but could not be read
    #[error("Failed to read config file {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not syntactically valid
    #[error("Parse error at {}:{} - {message}", path.display(), line.map(|l| l.to_string()).unwrap_or_else(|| "?".to_string()))]
    ConfigParse {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    /// A required config key is missing or empty
    #[error("Required setting '{0}' is missing or empty")]
    MissingField(&'static str),

    /// Other configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// DNS provider reported a failure
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Messaging endpoint reported a failure
    #[error("Notification error: {0}")]
    Notification(String),
}

impl Error {
    /// Create an IP lookup error
    pub fn ip_lookup(msg: impl Into<String>) -> Self {
        Self::IpLookup(msg.into())
    }

    /// Create an invalid IP error
    pub fn invalid_ip(msg: impl Into<String>) -> Self {
        Self::InvalidIp(msg.into())
    }

    /// Create a cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }
}
