// # iprefresher-core
//
// Core library for the dynamic-DNS IP refresher.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for pushing a new IP to the DNS provider
// - **IpCache**: Trait for remembering the last pushed IP
// - **Notifier**: Trait for announcing successful changes
// - **RefreshEngine**: Poll loop tying the above together
// - **config**: Credential file loading and validation
//
// Concrete lookup, provider and notifier clients live in their own crates
// so the engine can be exercised with fakes.

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod cache;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, IpCache, Notifier, parse_public_ip};
pub use engine::{CycleOutcome, EngineSettings, RefreshEngine};
pub use config::{Credentials, MessagingCredentials};
pub use error::{Error, Result};
pub use cache::{FileIpCache, MemoryIpCache};
