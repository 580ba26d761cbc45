// # Dynu DNS Provider
//
// This crate provides the Dynu dynamic-DNS provider for the IP refresher.
//
// ## API
//
// One request per update:
//
// ```http
// POST https://api.dynu.com/v2/dns/{domain_id}
// API-Key: <key>
// Content-Type: application/json
//
// {"name": "home.example.com", "ipv4Address": "5.6.7.8"}
// ```
//
// Dynu answers with a JSON status object, `{"statusCode":200}` on success
// and `{"statusCode":501,"type":"...","message":"..."}` otherwise. That
// object is the primary error surface; scanning the raw body for an
// `exception` marker is only a fallback for non-JSON answers.
//
// ## Security
//
// - The API key NEVER appears in logs or Debug output

use iprefresher_core::traits::DnsProvider;
use iprefresher_core::{Credentials, Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::IpAddr;
use std::time::Duration;

/// Dynu API base URL
const DYNU_API_BASE: &str = "https://api.dynu.com/v2";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Substring Dynu error bodies carry when they are not well-formed JSON
const ERROR_MARKER: &str = "exception";

const PROVIDER_NAME: &str = "dynu";

/// Dynu DNS provider
///
/// Configured once with the API key and the domain it owns; each
/// [`DnsProvider::update_ip`] call is a single stateless API request.
pub struct DynuProvider {
    /// Dynu API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Dynu's numeric id for the domain
    domain_id: String,

    /// Domain name matching `domain_id`
    domain_name: String,

    /// Base URL of the API
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for DynuProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynuProvider")
            .field("api_key", &"<REDACTED>")
            .field("domain_id", &self.domain_id)
            .field("domain_name", &self.domain_name)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Status object returned by the Dynu API
#[derive(Debug, Deserialize)]
struct DynuStatus {
    #[serde(rename = "statusCode")]
    status_code: u16,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl DynuProvider {
    /// Create a new Dynu provider
    ///
    /// # Parameters
    ///
    /// - `api_key`: Dynu API key
    /// - `domain_id`: Dynu's id for the domain
    /// - `domain_name`: the domain name itself
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any parameter is empty or the HTTP
    /// client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        domain_id: impl Into<String>,
        domain_name: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let domain_id = domain_id.into();
        let domain_name = domain_name.into();

        if api_key.is_empty() {
            return Err(Error::config("Dynu API key cannot be empty"));
        }
        if domain_id.is_empty() || domain_name.is_empty() {
            return Err(Error::config("Dynu domain id and name are required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            domain_id,
            domain_name,
            api_base: DYNU_API_BASE.to_string(),
            client,
        })
    }

    /// Create a provider from loaded credentials
    pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
        Self::new(
            credentials.dns_api_key.clone(),
            credentials.domain_id.clone(),
            credentials.domain_name.clone(),
        )
    }

    /// Send requests to `api_base` instead of the public Dynu endpoint
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn update_url(&self) -> String {
        format!("{}/dns/{}", self.api_base, self.domain_id)
    }

    fn update_payload(&self, ip: IpAddr) -> Value {
        match ip {
            IpAddr::V4(v4) => json!({
                "name": self.domain_name,
                "ipv4Address": v4.to_string(),
            }),
            IpAddr::V6(v6) => json!({
                "name": self.domain_name,
                "ipv6Address": v6.to_string(),
                "ipv6": true,
            }),
        }
    }
}

/// Map a failing status code to the matching error
fn status_error(code: u16, detail: String) -> Error {
    match code {
        401 | 403 => Error::auth(format!(
            "Dynu rejected the API key or it lacks permission ({})",
            detail
        )),
        429 => Error::rate_limited(format!("Dynu rate limit exceeded ({})", detail)),
        _ => Error::provider(PROVIDER_NAME, detail),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Decide whether a Dynu answer means success
fn interpret_response(status: StatusCode, body: &str) -> Result<()> {
    match serde_json::from_str::<DynuStatus>(body) {
        Ok(reply) => {
            if status.is_success() && reply.status_code == 200 {
                return Ok(());
            }

            let code = if status.is_success() {
                reply.status_code
            } else {
                status.as_u16()
            };
            let detail = format!(
                "statusCode {}: {} {}",
                reply.status_code,
                reply.kind.as_deref().unwrap_or("error"),
                reply.message.as_deref().unwrap_or("")
            );
            Err(status_error(code, detail.trim_end().to_string()))
        }
        Err(_) if !status.is_success() => Err(status_error(
            status.as_u16(),
            format!("HTTP {}: {}", status, truncate(body.trim(), 200)),
        )),
        Err(_) if body.to_ascii_lowercase().contains(ERROR_MARKER) => Err(Error::provider(
            PROVIDER_NAME,
            format!("error in response: {}", truncate(body.trim(), 200)),
        )),
        Err(_) => Ok(()),
    }
}

#[async_trait::async_trait]
impl DnsProvider for DynuProvider {
    async fn update_ip(&self, new_ip: IpAddr) -> Result<()> {
        tracing::debug!("Sending {} for {} to Dynu", new_ip, self.domain_name);

        let response = self
            .client
            .post(self.update_url())
            .header("API-Key", &self.api_key)
            .header("accept", "application/json")
            .json(&self.update_payload(new_ip))
            .send()
            .await
            .map_err(|e| Error::http(format!("Dynu request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read Dynu response: {}", e)))?;

        interpret_response(status, &body)?;

        tracing::info!("Dynu record updated: {} -> {}", self.domain_name, new_ip);
        Ok(())
    }

    fn record_name(&self) -> &str {
        &self.domain_name
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
