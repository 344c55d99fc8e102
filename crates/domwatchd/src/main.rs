// # domwatchd - domain watcher daemon
//
// This daemon is a THIN integration layer. Checking, registering, the
// watch-list and the control plane all live in domwatch-core.
//
// The domwatchd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering registrar backends
// 4. Starting the control plane and the watch loop
// 5. Turning SIGINT/SIGTERM into one shutdown signal
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Control plane
// - `DOMWATCH_BIND_ADDR`: Listen address (default `0.0.0.0:8081`)
// - `DOMWATCH_AUTH_TOKEN`: Shared secret for `AUTH` (required)
//
// ### Registrars
// - `DOMWATCH_REGISTRARS`: Comma-separated `kind[:name]` list in preference order
// - `DOMWATCH_RDAP_BASE_URL`: RDAP endpoint (default `https://rdap.org`)
//
// ### Snapshot store
// - `DOMWATCH_SNAPSHOT_TYPE`: `file` or `memory` (default `file`)
// - `DOMWATCH_SNAPSHOT_PATH`: Snapshot file (default `/var/lib/domwatch/watchlist.json`)
//
// ### Watcher
// - `DOMWATCH_CHECK_INTERVAL_SECS`: Pause between passes (default 60)
// - `DOMWATCH_DOMAINS`: Comma-separated names seeded into the watch-list
//
// ### Logging
// - `DOMWATCH_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DOMWATCH_AUTH_TOKEN=a-long-random-secret
// export DOMWATCH_REGISTRARS=rdap
// export DOMWATCH_SNAPSHOT_PATH=/var/lib/domwatch/watchlist.json
// export DOMWATCH_DOMAINS=example.com,example.org
//
// domwatchd
// ```

use anyhow::{Context, Result};
use domwatch_core::{
    ControlServer, DomainWatcher, DomwatchConfig, PluginRegistry, RegistrarConfig, Shutdown,
    SnapshotStoreConfig, WatchEvent, WatchList, WatcherConfig,
};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long the watch loop may take to finish an in-flight pass
const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DomwatchExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DomwatchExitCode> for ExitCode {
    fn from(code: DomwatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    bind_addr: String,
    auth_token: String,
    registrars: Vec<String>,
    rdap_base_url: Option<String>,
    snapshot_type: String,
    snapshot_path: String,
    check_interval_secs: u64,
    domains: Vec<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let check_interval_secs = match env::var("DOMWATCH_CHECK_INTERVAL_SECS") {
            Ok(raw) => raw.trim().parse().with_context(|| {
                format!("DOMWATCH_CHECK_INTERVAL_SECS must be a number of seconds. Got: {}", raw)
            })?,
            Err(_) => 60,
        };

        Ok(Self {
            bind_addr: env::var("DOMWATCH_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8081".to_string()),
            auth_token: env::var("DOMWATCH_AUTH_TOKEN").context(
                "DOMWATCH_AUTH_TOKEN is required. \
                Set it via: export DOMWATCH_AUTH_TOKEN=your_secret",
            )?,
            registrars: split_list(&env::var("DOMWATCH_REGISTRARS").unwrap_or_default()),
            rdap_base_url: env::var("DOMWATCH_RDAP_BASE_URL").ok(),
            snapshot_type: env::var("DOMWATCH_SNAPSHOT_TYPE")
                .unwrap_or_else(|_| "file".to_string()),
            snapshot_path: env::var("DOMWATCH_SNAPSHOT_PATH")
                .unwrap_or_else(|_| "/var/lib/domwatch/watchlist.json".to_string()),
            check_interval_secs,
            domains: split_list(&env::var("DOMWATCH_DOMAINS").unwrap_or_default()),
            log_level: env::var("DOMWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the values the library does not check itself
    fn validate(&self) -> Result<()> {
        if self.auth_token.len() < 8 {
            anyhow::bail!(
                "DOMWATCH_AUTH_TOKEN appears too short ({} chars). Use at least 8 characters.",
                self.auth_token.len()
            );
        }

        match self.snapshot_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "DOMWATCH_SNAPSHOT_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.snapshot_type
            ),
        }

        if self.snapshot_type == "file"
            && let Some(parent) = std::path::Path::new(&self.snapshot_path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            anyhow::bail!(
                "DOMWATCH_SNAPSHOT_PATH parent directory does not exist: {}. \
                    Create it first: sudo mkdir -p {}",
                parent.display(),
                parent.display()
            );
        }

        if let Some(ref url) = self.rdap_base_url
            && url.starts_with("http://")
        {
            eprintln!(
                "WARNING: DOMWATCH_RDAP_BASE_URL uses HTTP (not HTTPS). \
                      Lookups can be tampered with in transit."
            );
        }

        if !(10..=86400).contains(&self.check_interval_secs) {
            anyhow::bail!(
                "DOMWATCH_CHECK_INTERVAL_SECS must be between 10 and 86400 seconds. Got: {}",
                self.check_interval_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DOMWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the library configuration
    fn to_domwatch_config(&self) -> Result<DomwatchConfig> {
        let mut config = DomwatchConfig::new(self.auth_token.as_str());
        config.server = config.server.with_bind_addr(self.bind_addr.as_str());
        config.watcher = WatcherConfig {
            interval_secs: self.check_interval_secs,
            ..WatcherConfig::default()
        };
        config.domains = self.domains.clone();
        config.snapshot_store = match self.snapshot_type.as_str() {
            "file" => SnapshotStoreConfig::File {
                path: self.snapshot_path.clone(),
            },
            _ => SnapshotStoreConfig::Memory,
        };

        for entry in &self.registrars {
            let (kind, name) = match entry.split_once(':') {
                Some((kind, name)) => (kind.trim(), name.trim()),
                None => (entry.as_str(), entry.as_str()),
            };
            if kind.is_empty() || name.is_empty() {
                anyhow::bail!("DOMWATCH_REGISTRARS entry '{}' must be kind[:name]", entry);
            }

            let mut registrar = RegistrarConfig::new(kind).with_name(name);
            if kind == "rdap"
                && let Some(ref url) = self.rdap_base_url
            {
                registrar = registrar.with_setting("base_url", url.as_str());
            }
            config.registrars.push(registrar);
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DomwatchExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DomwatchExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DomwatchExitCode::ConfigError.into();
    }

    info!("Starting domwatchd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DomwatchExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let daemon = match Daemon::start(&config).await {
            Ok(daemon) => daemon,
            Err(e) => {
                error!("Startup failed: {:#}", e);
                return DomwatchExitCode::ConfigError;
            }
        };

        if let Err(e) = daemon.run().await {
            error!("Daemon error: {:#}", e);
            DomwatchExitCode::RuntimeError
        } else {
            DomwatchExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Registry with every backend compiled into this binary
fn build_registry() -> PluginRegistry {
    let registry = PluginRegistry::with_builtin_stores();

    #[cfg(feature = "rdap")]
    {
        info!("Registering RDAP registrar backend");
        domwatch_registrar_rdap::register(&registry);
    }

    let mut kinds = registry.list_registrars();
    kinds.sort();
    if kinds.is_empty() {
        warn!("No registrar kinds compiled in");
    } else {
        info!("Available registrar kinds: {}", kinds.join(", "));
    }

    registry
}

/// The wired-up components
struct Daemon {
    server: ControlServer,
    watcher: DomainWatcher,
    events: mpsc::Receiver<WatchEvent>,
    shutdown: Shutdown,
}

impl Daemon {
    /// Build every component and bind the control plane
    ///
    /// Any error here is a startup failure.
    async fn start(config: &Config) -> Result<Self> {
        let domwatch_config = config.to_domwatch_config()?;

        let registry = build_registry();

        let registrars = registry
            .create_registrars(&domwatch_config.registrars)
            .context("Failed to create registrars")?;
        for registrar in &registrars {
            info!("Registrar: {}", registrar.name());
        }
        if registrars.is_empty() {
            warn!("DOMWATCH_REGISTRARS is empty; no domain will ever be checked");
        }

        let store = registry
            .create_snapshot_store(&domwatch_config.snapshot_store)
            .await
            .context("Failed to create snapshot store")?;
        info!("Snapshot store type: {}", domwatch_config.snapshot_store.type_name());

        let watchlist = Arc::new(WatchList::restore(Arc::from(store)).await);
        for domain in &domwatch_config.domains {
            watchlist.add(domain).await?;
        }
        info!("Watching {} domain(s)", watchlist.len().await);

        let shutdown = Shutdown::new();

        warn!("Control plane is served without TLS; terminate TLS in front of it if it leaves this host");
        let server = ControlServer::bind(&domwatch_config.server, watchlist.clone(), shutdown.clone())
            .await
            .context("Failed to start control plane")?;

        let (watcher, events) = DomainWatcher::new(registrars, watchlist, domwatch_config.watcher)?;

        Ok(Self {
            server,
            watcher,
            events,
            shutdown,
        })
    }

    /// Run until a shutdown signal arrives
    async fn run(self) -> Result<()> {
        let Self {
            server,
            watcher,
            events,
            shutdown,
        } = self;

        let event_task = tokio::spawn(log_events(events));

        let mut watcher_task: JoinHandle<()> = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { watcher.run(shutdown).await })
        };

        info!("Daemon initialized successfully");

        let outcome = tokio::select! {
            signal = wait_for_shutdown() => signal.map(|name| info!("Received shutdown signal: {}", name)),
            joined = &mut watcher_task => Err(anyhow::anyhow!("Watch loop exited unexpectedly: {:?}", joined)),
        };

        info!("Shutting down daemon");
        shutdown.trigger();
        if tokio::time::timeout(SHUTDOWN_GRACE, server.close()).await.is_err() {
            warn!("Control plane did not close within {:?}", SHUTDOWN_GRACE);
        }

        if !watcher_task.is_finished() {
            match tokio::time::timeout(SHUTDOWN_GRACE, watcher_task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Watch loop ended abnormally: {}", e),
                Err(_) => warn!("Watch loop did not stop within {:?}", SHUTDOWN_GRACE),
            }
        }

        // The watcher owned the only event sender
        let _ = event_task.await;

        outcome
    }
}

/// Log watch events that are not already logged by the library
async fn log_events(mut events: mpsc::Receiver<WatchEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            WatchEvent::PassCompleted {
                domains_count,
                registered,
            } => debug!(
                "Pass completed: {} domain(s) checked, {} registered",
                domains_count, registered
            ),
            WatchEvent::CheckFailed { domain, error } => {
                debug!("Check of '{}' was incomplete: {}", domain, error)
            }
            other => debug!("Watch event: {:?}", other),
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
