//! Core refresh engine
//!
//! The RefreshEngine is responsible for:
//! - Looking up the public IP via IpSource
//! - Comparing it against the IpCache
//! - Pushing changes via DnsProvider
//! - Announcing successful changes via the optional Notifier
//!
//! ## Architecture
//!
//! ```text
//!                      ┌───────────────┐
//!       tick ────────▶ │ RefreshEngine │ ◀──────── shutdown
//!                      └───────────────┘
//!                              │
//!     ┌──────────────┬─────────┴────┬───────────────┐
//!     ▼              ▼              ▼               ▼
//! ┌──────────┐  ┌──────────┐  ┌─────────────┐  ┌──────────┐
//! │ IpSource │  │ IpCache  │  │ DnsProvider │  │ Notifier │
//! │ (lookup) │  │ (compare)│  │ (update)    │  │ (opt.)   │
//! └──────────┘  └──────────┘  └─────────────┘  └──────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Look up the public IP; on failure log and wait for the next tick
//! 2. Read the cached IP; if equal (and not forced) nothing happens
//! 3. Push the new IP to the provider
//! 4. On success, cache it and send a notification
//! 5. On failure, log it; the cache is left alone so the next cycle retries

use crate::error::{Error, Result};
use crate::traits::{DnsProvider, IpCache, IpSource, Notifier};
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

/// Default delay between two checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Delay between the start of two consecutive checks
    pub poll_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl EngineSettings {
    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::config("Poll interval must be > 0"));
        }
        Ok(())
    }
}

/// What a single check did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The public IP could not be determined; nothing else was attempted
    LookupFailed,

    /// The public IP matches the cached one
    Unchanged { ip: IpAddr },

    /// The provider accepted the new IP and it was cached
    Updated {
        previous: Option<IpAddr>,
        current: IpAddr,
        /// Whether a notification was delivered
        notified: bool,
    },

    /// The provider rejected the update or could not be reached
    UpdateFailed {
        previous: Option<IpAddr>,
        current: IpAddr,
    },
}

/// Shown in place of a previous IP that is not known
const UNKNOWN_IP: &str = "unknown";

fn describe_previous(previous: Option<IpAddr>) -> String {
    previous.map_or_else(|| UNKNOWN_IP.to_string(), |ip| ip.to_string())
}

/// Message sent to the notifier after a successful update
pub fn change_message(previous: Option<IpAddr>, current: IpAddr) -> String {
    format!("{} moved to {}", describe_previous(previous), current)
}

/// Core refresh engine
///
/// The engine runs one check immediately and then one per poll interval.
/// Checks never overlap, and a check that has started always runs to
/// completion; only the wait between checks is interrupted by shutdown.
/// Inside the loop each check runs on its own task, so a panicking client
/// costs one check and not the process.
///
/// ## Lifecycle
///
/// 1. Create with [`RefreshEngine::new()`]
/// 2. Either call [`RefreshEngine::check()`] once, or
/// 3. Start the loop with [`RefreshEngine::run_until()`]
pub struct RefreshEngine {
    components: Arc<Components>,
    poll_interval: Duration,
}

/// Clients a check talks to, shared with the task running each loop check
struct Components {
    ip_source: Box<dyn IpSource>,
    provider: Box<dyn DnsProvider>,
    cache: Box<dyn IpCache>,
    notifier: Option<Box<dyn Notifier>>,
}

impl RefreshEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: public IP lookup
    /// - `provider`: DNS provider to push changes to
    /// - `cache`: where the last pushed IP is remembered
    /// - `notifier`: `None` disables notifications
    /// - `settings`: loop settings
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        cache: Box<dyn IpCache>,
        notifier: Option<Box<dyn Notifier>>,
        settings: EngineSettings,
    ) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            components: Arc::new(Components {
                ip_source,
                provider,
                cache,
                notifier,
            }),
            poll_interval: settings.poll_interval,
        })
    }

    /// Run a single check
    ///
    /// With `force` set, the provider is called even if the public IP
    /// matches the cached one. Every failure is logged and reflected in the
    /// returned outcome; nothing is propagated.
    pub async fn check(&self, force: bool) -> CycleOutcome {
        self.components.check(force).await
    }

    /// Run the loop until `shutdown` resolves
    ///
    /// The first check starts immediately. If a check overruns the poll
    /// interval the next one is delayed rather than fired in a burst.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        tokio::pin!(shutdown);

        info!(
            "Refresh loop running, checking every {}s",
            self.poll_interval.as_secs()
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }

                Some(_) = ticks.next() => {
                    info!("starting check");
                    let components = Arc::clone(&self.components);
                    match tokio::spawn(async move { components.check(false).await }).await {
                        Ok(outcome) => debug!("Check finished: {:?}", outcome),
                        Err(e) => error!("Check aborted, continuing with the next one: {}", e),
                    }
                }
            }
        }

        info!("Refresh loop stopped");
    }
}

impl Components {
    async fn check(&self, force: bool) -> CycleOutcome {
        let current = match self.ip_source.current().await {
            Ok(ip) => ip,
            Err(Error::InvalidIp(msg)) => {
                warn!(
                    "an error occurred when getting the global ip from {}: {}",
                    self.ip_source.source_name(),
                    msg
                );
                return CycleOutcome::LookupFailed;
            }
            Err(e) => {
                warn!("no internet connection: {}", e);
                return CycleOutcome::LookupFailed;
            }
        };

        let previous = match self.cache.read().await {
            Ok(previous) => previous,
            Err(e) => {
                warn!("Failed to read cached IP, assuming none: {}", e);
                None
            }
        };

        if previous == Some(current) {
            if !force {
                info!("no change -- ip: {}", current);
                return CycleOutcome::Unchanged { ip: current };
            }
            info!("forced update -- ip: {}", current);
        } else {
            info!(
                "ip changed! -- from {} to {}",
                describe_previous(previous),
                current
            );
        }

        if let Err(e) = self.provider.update_ip(current).await {
            error!(
                "failed to write ip to {} api for {}: {}",
                self.provider.provider_name(),
                self.provider.record_name(),
                e
            );
            return CycleOutcome::UpdateFailed { previous, current };
        }

        info!(
            "Updated {} -> {} via {}",
            self.provider.record_name(),
            current,
            self.provider.provider_name()
        );

        if let Err(e) = self.cache.write(current).await {
            error!("Failed to cache IP {}: {}", current, e);
        }

        let notified = self.notify_change(previous, current).await;

        CycleOutcome::Updated {
            previous,
            current,
            notified,
        }
    }

    async fn notify_change(&self, previous: Option<IpAddr>, current: IpAddr) -> bool {
        let Some(notifier) = &self.notifier else {
            return false;
        };

        match notifier.notify(&change_message(previous, current)).await {
            Ok(()) => {
                debug!("Sent change notification via {}", notifier.notifier_name());
                true
            }
            Err(e) => {
                error!(
                    "Failed to send change notification via {}: {}",
                    notifier.notifier_name(),
                    e
                );
                false
            }
        }
    }
}
