// # IP Source Trait
//
// Defines the interface for discovering the host's public IP address.
//
// ## Implementations
//
// - HTTP lookup service: `iprefresher-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use iprefresher_core::IpSource;
//
// let source = /* IpSource implementation */;
// let ip = source.current().await?;
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::error::{Error, Result};

/// Trait for public IP lookup implementations
///
/// One call performs exactly one lookup. Implementations do not cache,
/// retry or schedule; the engine decides when to ask.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: the address reported by the lookup service
    /// - `Err(Error::IpLookup)`: no connectivity, upstream error or empty answer
    /// - `Err(Error::InvalidIp)`: the answer was not a valid IP address
    async fn current(&self) -> Result<IpAddr>;

    /// Short name used in log lines
    fn source_name(&self) -> &'static str;
}

/// Validate a raw lookup-service answer
///
/// Surrounding whitespace is ignored. An empty answer counts as a failed
/// lookup, anything else that does not parse as an IPv4 or IPv6 address is
/// reported as [`Error::InvalidIp`].
pub fn parse_public_ip(raw: &str) -> Result<IpAddr> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(Error::ip_lookup("lookup service returned an empty response"));
    }

    text.parse::<IpAddr>()
        .map_err(|_| Error::invalid_ip(format!("'{}' is not an IP address", truncate(text, 64))))
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
