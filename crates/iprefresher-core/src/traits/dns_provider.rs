// # DNS Provider Trait
//
// Defines the interface for pushing a new IP to a dynamic-DNS provider.
//
// ## Implementations
//
// - Dynu: `iprefresher-provider-dynu` crate
//
// ## Usage
//
// ```rust,ignore
// use iprefresher_core::DnsProvider;
//
// let provider = /* DnsProvider implementation */;
// provider.update_ip(std::net::IpAddr::from([192, 168, 1, 1])).await?;
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for DNS provider implementations
///
/// A provider is configured once with its credentials and the record it
/// owns, then asked to point that record at a new address. This is the one
/// side effect that makes an IP change visible to the outside world.
///
/// Providers are single-shot: one API call per invocation, no retries, no
/// caching, no background tasks. A failed update is reported as an error
/// and the engine tries again on its next cycle.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Point the configured record at `new_ip`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the provider accepted the update
    /// - `Err(Error)`: transport failure or a provider-reported error
    async fn update_ip(&self, new_ip: IpAddr) -> Result<(), crate::Error>;

    /// The record this provider updates (for logging)
    fn record_name(&self) -> &str;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
