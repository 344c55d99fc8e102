//! Watch loop
//!
//! The DomainWatcher is responsible for:
//! - Walking a snapshot of the watch-list every interval
//! - Running a check pass for each domain across all registrars
//! - Running a register pass when some registrar reports the domain available
//! - Reporting what happened through a bounded event channel
//!
//! ## Event Flow
//!
//! ```text
//!  WatchList ──list()──► for each domain
//!                          │
//!                          ▼
//!                   check_pass ──first Available?──no──► next domain
//!                          │ yes
//!                          ▼
//!                   register_pass ──Owned/Processing──► Registered
//!                          │
//!                          └──none──► RegistrationFailed
//! ```
//!
//! Nothing in a pass is fatal. A registrar outage is logged and the next
//! pass starts on schedule.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::WatcherConfig;
use crate::error::Result;
use crate::orchestrator::{check_pass, first_available, register_pass};
use crate::shutdown::Shutdown;
use crate::status::Status;
use crate::traits::Registrar;
use crate::watchlist::WatchList;

/// Events emitted by the DomainWatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Watcher started
    Started {
        registrars_count: usize,
    },

    /// A pass over the watch-list began
    PassStarted {
        domains_count: usize,
    },

    /// At least one registrar failed while checking a domain
    CheckFailed {
        domain: String,
        error: String,
    },

    /// A registrar reported the domain as available
    DomainAvailable {
        domain: String,
        registrar: String,
    },

    /// A registrar claimed the domain
    Registered {
        domain: String,
        registrar: String,
        status: Status,
    },

    /// The domain was available but no registrar claimed it
    RegistrationFailed {
        domain: String,
        error: String,
    },

    /// A pass over the watch-list finished
    PassCompleted {
        domains_count: usize,
        registered: usize,
    },

    /// Watcher stopped
    Stopped {
        reason: String,
    },
}

/// Periodic availability watcher
///
/// ## Lifecycle
///
/// 1. Create with [`DomainWatcher::new()`]
/// 2. Start with [`DomainWatcher::run()`]
/// 3. Runs passes until the [`Shutdown`] fires
///
/// A pass already in flight when shutdown fires is allowed to finish; the
/// next one is never started.
pub struct DomainWatcher {
    /// Registrars in preference order
    registrars: Vec<Arc<dyn Registrar>>,

    /// Names to watch
    watchlist: Arc<WatchList>,

    /// Pause between passes
    interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<WatchEvent>,
}

impl DomainWatcher {
    /// Create a new watcher
    ///
    /// # Returns
    ///
    /// A tuple of (watcher, event_receiver) where event_receiver yields watch events
    pub fn new(
        registrars: Vec<Arc<dyn Registrar>>,
        watchlist: Arc<WatchList>,
        config: WatcherConfig,
    ) -> Result<(Self, mpsc::Receiver<WatchEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let watcher = Self {
            registrars,
            watchlist,
            interval: config.interval(),
            event_tx: tx,
        };

        Ok((watcher, rx))
    }

    /// Run passes until `shutdown` fires
    pub async fn run(&self, shutdown: Shutdown) {
        self.emit_event(WatchEvent::Started {
            registrars_count: self.registrars.len(),
        });

        if self.registrars.is_empty() {
            warn!("No registrars configured; domains will be watched but never checked");
        }

        info!("Watching domains every {:?}", self.interval);

        while !shutdown.is_triggered() {
            self.run_pass().await;

            tokio::select! {
                _ = shutdown.wait() => {}
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Shutdown signal received, watcher stopped");
        self.emit_event(WatchEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
    }

    /// Run one pass over the current watch-list
    ///
    /// Returns the number of domains claimed during the pass.
    pub async fn run_pass(&self) -> usize {
        let domains = self.watchlist.list().await;

        self.emit_event(WatchEvent::PassStarted {
            domains_count: domains.len(),
        });
        debug!("Starting pass over {} domain(s)", domains.len());

        let mut registered = 0;
        for domain in &domains {
            if self.watch_domain(domain).await {
                registered += 1;
            }
        }

        self.emit_event(WatchEvent::PassCompleted {
            domains_count: domains.len(),
            registered,
        });

        registered
    }

    /// Check one domain and register it if some registrar reports it available
    async fn watch_domain(&self, domain: &str) -> bool {
        let (results, errors) = check_pass(domain, &self.registrars).await;

        if let Some(errors) = errors {
            self.emit_event(WatchEvent::CheckFailed {
                domain: domain.to_string(),
                error: errors.to_string(),
            });
        }

        // First available wins; the remaining results do not matter here
        let Some(hit) = first_available(&results) else {
            debug!("{} is not available", domain);
            return false;
        };

        info!("{} is available at {}", domain, hit.registrar);
        self.emit_event(WatchEvent::DomainAvailable {
            domain: domain.to_string(),
            registrar: hit.registrar.clone(),
        });

        match register_pass(domain, &self.registrars).await {
            (Some(claimed), _) => {
                info!(
                    "Registered '{}' at {} ({})",
                    domain, claimed.registrar, claimed.status
                );
                self.emit_event(WatchEvent::Registered {
                    domain: domain.to_string(),
                    registrar: claimed.registrar,
                    status: claimed.status,
                });
                true
            }
            (None, errors) => {
                let error = errors
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no registrar claimed the domain".to_string());
                warn!("Failed to register '{}': {}", domain, error);
                self.emit_event(WatchEvent::RegistrationFailed {
                    domain: domain.to_string(),
                    error,
                });
                false
            }
        }
    }

    /// Emit a watch event
    fn emit_event(&self, event: WatchEvent) {
        // A full channel drops the event instead of growing memory
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
