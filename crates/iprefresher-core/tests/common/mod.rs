//! Test doubles and common utilities for engine contract tests
//!
//! Every double counts its calls and is `Clone`; clones share counters, so
//! a test can hand one copy to the engine and keep another to inspect.

#![allow(dead_code)]

use iprefresher_core::error::{Error, Result};
use iprefresher_core::traits::{DnsProvider, IpCache, IpSource, Notifier, parse_public_ip};
use iprefresher_core::{EngineSettings, MemoryIpCache, RefreshEngine};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An IpSource that replays raw lookup-service answers
///
/// Each answer goes through `parse_public_ip` exactly like the HTTP source
/// does. `None` simulates a transport failure. The last answer repeats.
#[derive(Clone)]
pub struct ScriptedIpSource {
    answers: Arc<Mutex<Vec<Option<String>>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new(answers: &[Option<&str>]) -> Self {
        Self {
            answers: Arc::new(Mutex::new(
                answers.iter().map(|a| a.map(str::to_string)).collect(),
            )),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always answers with `ip`
    pub fn fixed(ip: &str) -> Self {
        Self::new(&[Some(ip)])
    }

    /// Never reachable
    pub fn offline() -> Self {
        Self::new(&[None])
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let n = self.call_count.fetch_add(1, Ordering::SeqCst);
        let answers = self.answers.lock().unwrap();
        let answer = answers
            .get(n)
            .or_else(|| answers.last())
            .cloned()
            .flatten();

        match answer {
            Some(raw) => parse_public_ip(&raw),
            None => Err(Error::ip_lookup("connection refused")),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A DnsProvider that records every pushed IP
#[derive(Clone)]
pub struct MockDnsProvider {
    updates: Arc<Mutex<Vec<IpAddr>>>,
    failing: Arc<AtomicBool>,
}

impl MockDnsProvider {
    pub fn succeeding() -> Self {
        Self {
            updates: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing() -> Self {
        let provider = Self::succeeding();
        provider.set_failing(true);
        provider
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn updates(&self) -> Vec<IpAddr> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn update_ip(&self, new_ip: IpAddr) -> Result<()> {
        self.updates.lock().unwrap().push(new_ip);

        if self.failing.load(Ordering::SeqCst) {
            Err(Error::provider("mock", "statusCode 501: invalid API key"))
        } else {
            Ok(())
        }
    }

    fn record_name(&self) -> &str {
        "home.example.com"
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A Notifier that records messages
#[derive(Clone)]
pub struct MockNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing() -> Self {
        let notifier = Self::new();
        notifier.failing.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());

        if self.failing.load(Ordering::SeqCst) {
            Err(Error::notification("error_code 400: chat not found"))
        } else {
            Ok(())
        }
    }

    fn notifier_name(&self) -> &'static str {
        "mock"
    }
}

/// An IpCache that counts reads and writes
#[derive(Clone)]
pub struct CountingCache {
    inner: MemoryIpCache,
    read_count: Arc<AtomicUsize>,
    write_count: Arc<AtomicUsize>,
}

impl CountingCache {
    pub fn empty() -> Self {
        Self::wrap(MemoryIpCache::new())
    }

    pub fn holding(ip: &str) -> Self {
        Self::wrap(MemoryIpCache::with_ip(ip.parse().unwrap()))
    }

    fn wrap(inner: MemoryIpCache) -> Self {
        Self {
            inner,
            read_count: Arc::new(AtomicUsize::new(0)),
            write_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    pub async fn value(&self) -> Option<IpAddr> {
        self.inner.read().await.unwrap()
    }
}

#[async_trait::async_trait]
impl IpCache for CountingCache {
    async fn read(&self) -> Result<Option<IpAddr>> {
        self.read_count.fetch_add(1, Ordering::SeqCst);
        self.inner.read().await
    }

    async fn write(&self, ip: IpAddr) -> Result<()> {
        self.write_count.fetch_add(1, Ordering::SeqCst);
        self.inner.write(ip).await
    }
}

/// An IpCache whose storage is gone: every read and write fails
#[derive(Clone, Default)]
pub struct UnusableCache {
    read_count: Arc<AtomicUsize>,
    write_count: Arc<AtomicUsize>,
}

impl UnusableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpCache for UnusableCache {
    async fn read(&self) -> Result<Option<IpAddr>> {
        self.read_count.fetch_add(1, Ordering::SeqCst);
        Err(Error::cache("permission denied"))
    }

    async fn write(&self, _ip: IpAddr) -> Result<()> {
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Err(Error::cache("read-only file system"))
    }
}

/// Settings used by loop tests
pub fn test_settings() -> EngineSettings {
    EngineSettings {
        poll_interval: Duration::from_secs(300),
    }
}

/// Build an engine from clones of the given doubles
pub fn build_engine(
    source: &ScriptedIpSource,
    provider: &MockDnsProvider,
    cache: &CountingCache,
    notifier: Option<&MockNotifier>,
) -> RefreshEngine {
    RefreshEngine::new(
        Box::new(source.clone()),
        Box::new(provider.clone()),
        Box::new(cache.clone()),
        notifier.map(|n| Box::new(n.clone()) as Box<dyn Notifier>),
        test_settings(),
    )
    .expect("engine construction succeeds")
}

pub fn ip(text: &str) -> IpAddr {
    text.parse().unwrap()
}
