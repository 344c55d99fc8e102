//! Test doubles and common utilities for contract tests
//!
//! Scripted registrars return fixed outcomes and count their calls; the
//! recording snapshot store keeps every saved snapshot; the control client
//! speaks the line protocol over a real TCP connection.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use domwatch_core::error::{Error, Result};
use domwatch_core::traits::{Registrar, SnapshotStore};
use domwatch_core::Status;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// What a scripted registrar call returns
#[derive(Debug, Clone)]
pub enum Outcome {
    Status(Status),
    Fail(&'static str),
}

impl Outcome {
    fn into_result(self) -> Result<Status> {
        match self {
            Outcome::Status(status) => Ok(status),
            Outcome::Fail(msg) => Err(Error::registrar(msg)),
        }
    }
}

/// Registrar double with fixed outcomes and call counters
pub struct ScriptedRegistrar {
    name: String,
    check: Outcome,
    register: Outcome,
    check_calls: AtomicUsize,
    register_calls: AtomicUsize,
}

impl ScriptedRegistrar {
    pub fn new(name: &str, check: Outcome, register: Outcome) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            check,
            register,
            check_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
        })
    }

    /// Fails every call
    pub fn erroring(name: &str) -> Arc<Self> {
        Self::new(name, Outcome::Fail("backend unreachable"), Outcome::Fail("backend unreachable"))
    }

    /// Reports the domain as taken and refuses to register it
    pub fn unavailable(name: &str) -> Arc<Self> {
        Self::new(
            name,
            Outcome::Status(Status::Unavailable),
            Outcome::Status(Status::Unavailable),
        )
    }

    /// Already holds the domain
    pub fn owned(name: &str) -> Arc<Self> {
        Self::new(name, Outcome::Status(Status::Owned), Outcome::Status(Status::Owned))
    }

    /// Reports the domain as free and registers it on request
    pub fn available(name: &str) -> Arc<Self> {
        Self::new(name, Outcome::Status(Status::Available), Outcome::Status(Status::Owned))
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registrar for ScriptedRegistrar {
    async fn check_availability(&self, _domain: &str) -> Result<Status> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        self.check.clone().into_result()
    }

    async fn register(&self, _domain: &str) -> Result<Status> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.register.clone().into_result()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Upcast scripted registrars into the orchestrator's input type
pub fn backends(registrars: &[&Arc<ScriptedRegistrar>]) -> Vec<Arc<dyn Registrar>> {
    registrars
        .iter()
        .map(|r| Arc::clone(r) as Arc<dyn Registrar>)
        .collect()
}

/// Snapshot store that remembers every save
#[derive(Default)]
pub struct RecordingSnapshotStore {
    initial: Vec<String>,
    saves: std::sync::Mutex<Vec<Vec<String>>>,
}

impl RecordingSnapshotStore {
    pub fn with_initial(initial: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            initial: initial.iter().map(|s| s.to_string()).collect(),
            saves: Default::default(),
        })
    }

    pub fn saves(&self) -> Vec<Vec<String>> {
        self.saves.lock().unwrap().clone()
    }

    pub fn last_save(&self) -> Option<Vec<String>> {
        self.saves.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SnapshotStore for RecordingSnapshotStore {
    async fn load_snapshot(&self) -> Result<Vec<String>> {
        Ok(self.initial.clone())
    }

    async fn save_snapshot(&self, domains: &[String]) -> Result<()> {
        self.saves.lock().unwrap().push(domains.to_vec());
        Ok(())
    }
}

/// Line-protocol client for a running control server
pub struct ControlClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl ControlClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect to control server");
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .expect("write to control server");
    }

    /// Write raw bytes; the server may already have hung up
    pub async fn send_raw(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(bytes).await
    }

    /// Next reply line; `None` once the server closed the connection
    pub async fn recv(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("reply within 5 seconds")
            .ok()
            .flatten()
    }

    /// Send a command and wait for its reply
    pub async fn request(&mut self, line: &str) -> Option<String> {
        self.send(line).await;
        self.recv().await
    }
}
