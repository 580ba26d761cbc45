// # IP Cache Trait
//
// Defines the interface for remembering the last IP pushed to the DNS
// provider.
//
// ## Purpose
//
// The cache is what makes a poll cycle idempotent: if the public IP equals
// the cached one, nothing is sent. It only ever holds an address the
// provider confirmed, so a failed update is retried on the next cycle.
//
// ## Implementations
//
// - `FileIpCache`: one plain-text file
// - `MemoryIpCache`: process-local, lost on restart

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for previous-IP cache implementations
#[async_trait]
pub trait IpCache: Send + Sync {
    /// Read the last recorded IP
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ip))`: an IP was recorded
    /// - `Ok(None)`: nothing recorded yet (first run, missing file)
    /// - `Err(Error)`: the backing storage could not be read
    async fn read(&self) -> Result<Option<IpAddr>, crate::Error>;

    /// Record `ip` as the last successfully pushed address
    async fn write(&self, ip: IpAddr) -> Result<(), crate::Error>;
}
