// # Memory IP Cache
//
// In-memory implementation of IpCache.
//
// Nothing survives a restart, so the first cycle of every run pushes the
// current IP to the provider. Useful for tests and for hosts without
// writable storage.

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::IpCache;

/// In-memory IP cache
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryIpCache {
    inner: Arc<RwLock<Option<IpAddr>>>,
}

impl MemoryIpCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that already holds `ip`
    pub fn with_ip(ip: IpAddr) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(ip))),
        }
    }

    /// Forget the recorded IP
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl IpCache for MemoryIpCache {
    async fn read(&self) -> Result<Option<IpAddr>, Error> {
        Ok(*self.inner.read().await)
    }

    async fn write(&self, ip: IpAddr) -> Result<(), Error> {
        *self.inner.write().await = Some(ip);
        Ok(())
    }
}
