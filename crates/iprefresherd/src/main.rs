// # iprefresherd - IP Refresher Daemon
//
// Thin integration layer: parses the command line, sets up logging, loads
// the credentials file and wires the clients into the core engine. All
// refresh logic lives in iprefresher-core.
//
// ## Modes
//
// - no flag: one check, then exit
// - `--force`: one check that pushes the IP even if it is unchanged
// - `--loop`: check now and then every `--interval` seconds until SIGINT/SIGTERM
// - `--check-config`: validate the config file and exit
//
// ## Example
//
// ```bash
// iprefresherd --config /etc/iprefresher.cfg --loop --interval 300
// ```

use anyhow::{Context, Result};
use clap::Parser;
use iprefresher_core::cache::{DEFAULT_CACHE_PATH, FileIpCache};
use iprefresher_core::config::{self, DEFAULT_CONFIG_PATH};
use iprefresher_core::engine::DEFAULT_POLL_INTERVAL;
use iprefresher_core::traits::Notifier;
use iprefresher_core::{Credentials, CycleOutcome, EngineSettings, RefreshEngine};
use iprefresher_ip_http::{DEFAULT_IP_SERVICE_URL, HttpIpSource};
use iprefresher_provider_dynu::DynuProvider;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefresherExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<RefresherExitCode> for ExitCode {
    fn from(code: RefresherExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser, Debug)]
#[command(name = "iprefresherd", version)]
#[command(about = "Keeps a Dynu DNS record pointed at this host's public IP")]
struct Args {
    /// Run the refresh loop until interrupted
    #[arg(short = 'l', long = "loop", conflicts_with_all = ["force", "check_config"])]
    run_loop: bool,

    /// Push the current IP even if it did not change
    #[arg(short, long, conflicts_with = "check_config")]
    force: bool,

    /// Validate the config file and exit
    #[arg(short = 'c', long)]
    check_config: bool,

    /// Path to the credentials file
    #[arg(long, env = "IPREFRESHER_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Where the last pushed IP is kept
    #[arg(long, env = "IPREFRESHER_CACHE", default_value = DEFAULT_CACHE_PATH)]
    cache: PathBuf,

    /// Service answering with the public IP as plain text
    #[arg(long, env = "IPREFRESHER_IP_URL", default_value = DEFAULT_IP_SERVICE_URL)]
    ip_url: String,

    /// Seconds between two checks in loop mode
    #[arg(long, env = "IPREFRESHER_INTERVAL", default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    interval: u64,

    /// trace, debug, info, warn or error
    #[arg(long, env = "IPREFRESHER_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// What the process was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    CheckConfig,
    Once { force: bool },
    Loop,
}

impl Args {
    fn mode(&self) -> Mode {
        if self.check_config {
            Mode::CheckConfig
        } else if self.run_loop {
            Mode::Loop
        } else {
            Mode::Once { force: self.force }
        }
    }
}

fn parse_log_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let Some(log_level) = parse_log_level(&args.log_level) else {
        eprintln!(
            "Log level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            args.log_level
        );
        return RefresherExitCode::ConfigError.into();
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RefresherExitCode::ConfigError.into();
    }

    info!("startup of service, iprefresherd {}", env!("CARGO_PKG_VERSION"));

    let mode = args.mode();
    if mode == Mode::CheckConfig {
        return if config::validate(&args.config) {
            RefresherExitCode::CleanShutdown
        } else {
            RefresherExitCode::ConfigError
        }
        .into();
    }

    let credentials = match config::load(&args.config) {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("{}", e);
            return RefresherExitCode::ConfigError.into();
        }
    };

    let engine = match build_engine(&args, &credentials) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return RefresherExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RefresherExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(mode, &engine).await {
            Ok(()) => RefresherExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                RefresherExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Wire the clients into an engine
fn build_engine(args: &Args, credentials: &Credentials) -> Result<RefreshEngine> {
    let ip_source = HttpIpSource::new(args.ip_url.clone());
    let provider =
        DynuProvider::from_credentials(credentials).context("Failed to set up Dynu client")?;
    let cache = FileIpCache::new(&args.cache);

    let settings = EngineSettings {
        poll_interval: Duration::from_secs(args.interval),
    };

    info!(
        "Managing {} on Dynu (IP from {}, cache at {})",
        credentials.domain_name,
        ip_source.url(),
        cache.path().display()
    );

    let engine = RefreshEngine::new(
        Box::new(ip_source),
        Box::new(provider),
        Box::new(cache),
        build_notifier(credentials)?,
        settings,
    )?;

    Ok(engine)
}

#[cfg(feature = "telegram")]
fn build_notifier(credentials: &Credentials) -> Result<Option<Box<dyn Notifier>>> {
    let Some(messaging) = &credentials.messaging else {
        info!("Change notifications disabled");
        return Ok(None);
    };

    let notifier = iprefresher_notify_telegram::TelegramNotifier::from_credentials(messaging)
        .context("Failed to set up Telegram client")?;
    info!("Change notifications go to Telegram chat {}", notifier.chat_id());
    Ok(Some(Box::new(notifier)))
}

#[cfg(not(feature = "telegram"))]
fn build_notifier(credentials: &Credentials) -> Result<Option<Box<dyn Notifier>>> {
    if credentials.messaging_enabled() {
        warn!("Telegram settings found but this build has no telegram support");
    }
    Ok(None)
}

/// Run the requested mode
async fn run_daemon(mode: Mode, engine: &RefreshEngine) -> Result<()> {
    match mode {
        Mode::Once { force } => {
            let outcome = engine.check(force).await;
            if let CycleOutcome::LookupFailed | CycleOutcome::UpdateFailed { .. } = outcome {
                warn!("Check did not complete: {:?}", outcome);
            }
            Ok(())
        }
        Mode::Loop => {
            let shutdown = shutdown_signal()?;
            engine
                .run_until(async {
                    let signal = shutdown.await;
                    info!("Received shutdown signal: {}", signal);
                })
                .await;
            info!("Shutting down daemon");
            Ok(())
        }
        Mode::CheckConfig => Ok(()),
    }
}

/// Install handlers for SIGTERM and SIGINT
///
/// # Returns
///
/// A future resolving to the name of the first signal received.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
        "SIGINT"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("iprefresherd").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_default_mode_is_single_check() {
        let args = parse(&["--config", "/tmp/x.cfg"]);
        assert_eq!(args.mode(), Mode::Once { force: false });
        assert_eq!(args.config, PathBuf::from("/tmp/x.cfg"));
    }

    #[test]
    fn test_mode_flags() {
        assert_eq!(parse(&["-l"]).mode(), Mode::Loop);
        assert_eq!(parse(&["--force"]).mode(), Mode::Once { force: true });
        assert_eq!(parse(&["-c"]).mode(), Mode::CheckConfig);
    }

    #[test]
    fn test_conflicting_modes_rejected() {
        assert!(Args::try_parse_from(["iprefresherd", "--loop", "--force"]).is_err());
        assert!(Args::try_parse_from(["iprefresherd", "-c", "-l"]).is_err());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_log_level("warn"), Some(Level::WARN));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_engine_from_credentials() {
        let args = parse(&["--interval", "60", "--cache", "/tmp/iprefresher-test-lastip"]);
        let credentials = Credentials {
            dns_api_key: "key".to_string(),
            domain_id: "1".to_string(),
            domain_name: "home.example.com".to_string(),
            messaging: None,
        };
        assert!(build_engine(&args, &credentials).is_ok());

        let args = parse(&["--interval", "0"]);
        assert!(build_engine(&args, &credentials).is_err());
    }
}
