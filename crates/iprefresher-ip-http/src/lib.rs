// # HTTP IP Source
//
// This crate provides the public IP lookup for the IP refresher.
//
// ## Architecture
//
// Sends one GET to an external "what is my IP" service (api.ipify.org by
// default) per call and validates the plain-text answer with
// `iprefresher_core::parse_public_ip`. Scheduling belongs to the engine.

use iprefresher_core::traits::{IpSource, parse_public_ip};
use iprefresher_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Lookup service used when none is configured
pub const DEFAULT_IP_SERVICE_URL: &str = "https://api.ipify.org";

/// Default HTTP timeout for lookups
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: service answering with the caller's IP as plain text
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(DEFAULT_HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// The lookup URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the raw answer from the lookup service
    async fn fetch_text(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_lookup(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_lookup(format!(
                "{} answered with HTTP {}",
                self.url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::ip_lookup(format!("Failed to read response: {}", e)))
    }
}

impl Default for HttpIpSource {
    fn default() -> Self {
        Self::new(DEFAULT_IP_SERVICE_URL)
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let text = self.fetch_text().await?;
        let ip = parse_public_ip(&text)?;
        tracing::debug!("{} reports public IP {}", self.url, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
