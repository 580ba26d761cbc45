// # Notifier Trait
//
// Defines the interface for announcing a successful IP change on a
// messaging endpoint.
//
// ## Implementations
//
// - Telegram bot: `iprefresher-notify-telegram` crate

use async_trait::async_trait;

/// Trait for notification clients
///
/// Only called after the DNS provider accepted an update. Like providers,
/// notifiers make one request per call and never retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the endpoint accepted the message
    /// - `Err(Error)`: transport failure or an endpoint-reported error
    async fn notify(&self, message: &str) -> Result<(), crate::Error>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}
