//! Minimal embedding example for domwatch-core
//!
//! This example uses domwatch-core as a library: a custom in-process
//! registrar, a control plane on a loopback port, and a watcher whose
//! lifecycle is owned by the application.

use domwatch_core::traits::Registrar;
use domwatch_core::{
    ControlServer, DomainWatcher, Result, ServerConfig, Shutdown, Status, WatchList,
    WatcherConfig,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Registrar that considers every `.test` name free until it registers it
struct SandboxRegistrar {
    owned: Mutex<HashSet<String>>,
}

impl SandboxRegistrar {
    fn new() -> Self {
        Self {
            owned: Mutex::new(HashSet::new()),
        }
    }

    fn is_owned(&self, domain: &str) -> bool {
        self.owned
            .lock()
            .map(|owned| owned.contains(domain))
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl Registrar for SandboxRegistrar {
    async fn check_availability(&self, domain: &str) -> Result<Status> {
        if self.is_owned(domain) {
            Ok(Status::Owned)
        } else if domain.ends_with(".test") {
            Ok(Status::Available)
        } else {
            Ok(Status::Unavailable)
        }
    }

    async fn register(&self, domain: &str) -> Result<Status> {
        if !domain.ends_with(".test") {
            return Ok(Status::Unavailable);
        }
        if let Ok(mut owned) = self.owned.lock() {
            owned.insert(domain.to_string());
        }
        println!("[Sandbox] Registered {}", domain);
        Ok(Status::Owned)
    }

    fn name(&self) -> &str {
        "sandbox"
    }
}

/// Send one command line and print the reply
async fn send(stream: &mut BufReader<TcpStream>, line: &str, expect_reply: bool) -> Result<()> {
    stream.get_mut().write_all(format!("{}\n", line).as_bytes()).await?;
    if expect_reply {
        let mut reply = String::new();
        stream.read_line(&mut reply).await?;
        println!("   > {:<22} < {}", line, reply.trim_end());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    println!("=== Embedded domwatch-core Example ===\n");

    let shutdown = Shutdown::new();
    let watchlist = Arc::new(WatchList::with_domains(["example.com"]));
    let registrars: Vec<Arc<dyn Registrar>> = vec![Arc::new(SandboxRegistrar::new())];

    println!("1. Starting control plane on a loopback port...");
    let server_config = ServerConfig::new("demo-token").with_bind_addr("127.0.0.1:0");
    let server = ControlServer::bind(&server_config, watchlist.clone(), shutdown.clone()).await?;

    println!("2. Editing the watch-list over the wire...");
    let mut conn = BufReader::new(TcpStream::connect(server.local_addr()).await?);
    send(&mut conn, "LIST", true).await?;
    send(&mut conn, "AUTH demo-token", false).await?;
    send(&mut conn, "ADD brand-new.test", true).await?;
    send(&mut conn, "LIST", true).await?;
    send(&mut conn, "QUIT", false).await?;

    println!("\n3. Running one watch pass...");
    let (watcher, mut events) = DomainWatcher::new(registrars, watchlist, WatcherConfig::default())?;
    let registered = watcher.run_pass().await;
    while let Ok(event) = events.try_recv() {
        println!("[Event] {:?}", event);
    }
    println!("   {} domain(s) registered", registered);

    println!("\n4. Running the watch loop in the background...");
    let watcher_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { watcher.run(shutdown).await })
    };
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    println!("5. Closing everything with one shutdown signal...");
    server.close().await;
    let _ = watcher_handle.await;

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Registrars are plain trait objects supplied by the application");
    println!("- One Shutdown value stops the control plane and the watcher");
    println!("- No global state beyond the tracing subscriber");

    Ok(())
}
