//! Core traits for the IP refresher
//!
//! This module defines the seams between the engine and its collaborators.
//!
//! - [`IpSource`]: Discover the current public IP
//! - [`DnsProvider`]: Push a new IP to the DNS provider
//! - [`IpCache`]: Remember the last pushed IP
//! - [`Notifier`]: Announce successful changes

pub mod ip_source;
pub mod dns_provider;
pub mod ip_cache;
pub mod notifier;

pub use ip_source::{IpSource, parse_public_ip};
pub use dns_provider::DnsProvider;
pub use ip_cache::IpCache;
pub use notifier::Notifier;
