//! Contract Test: Watch Loop
//!
//! Constraints verified:
//! - Registration is attempted only when some registrar reports Available
//! - Registrar outages are reported as events, never as loop failures
//! - Events describe each pass in order

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use domwatch_core::{DomainWatcher, Shutdown, Status, WatchEvent, WatchList, WatcherConfig};
use tokio::sync::mpsc;

fn drain(events: &mut mpsc::Receiver<WatchEvent>) -> Vec<WatchEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn available_domain_is_registered_in_preference_order() {
    let taken = ScriptedRegistrar::unavailable("taken");
    let cheap = ScriptedRegistrar::available("cheap");
    let pricey = ScriptedRegistrar::available("pricey");
    let list = Arc::new(WatchList::with_domains(["example.com"]));

    let (watcher, mut events) = DomainWatcher::new(
        backends(&[&taken, &cheap, &pricey]),
        list,
        WatcherConfig::default(),
    )
    .unwrap();

    assert_eq!(watcher.run_pass().await, 1);

    // "taken" declines, "cheap" claims, "pricey" is never asked to register
    assert_eq!(taken.register_calls(), 1);
    assert_eq!(cheap.register_calls(), 1);
    assert_eq!(pricey.register_calls(), 0);

    let events = drain(&mut events);
    assert!(events.contains(&WatchEvent::DomainAvailable {
        domain: "example.com".to_string(),
        registrar: "cheap".to_string(),
    }));
    assert!(events.contains(&WatchEvent::Registered {
        domain: "example.com".to_string(),
        registrar: "cheap".to_string(),
        status: Status::Owned,
    }));
}

#[tokio::test]
async fn unavailable_domain_is_never_registered() {
    let registrar = ScriptedRegistrar::unavailable("r");
    let list = Arc::new(WatchList::with_domains(["a.com", "b.com"]));

    let (watcher, mut events) =
        DomainWatcher::new(backends(&[&registrar]), list, WatcherConfig::default()).unwrap();

    assert_eq!(watcher.run_pass().await, 0);
    assert_eq!(registrar.check_calls(), 2);
    assert_eq!(registrar.register_calls(), 0);

    assert_eq!(
        drain(&mut events),
        vec![
            WatchEvent::PassStarted { domains_count: 2 },
            WatchEvent::PassCompleted {
                domains_count: 2,
                registered: 0
            },
        ]
    );
}

#[tokio::test]
async fn outages_are_reported_and_the_pass_continues() {
    let down = ScriptedRegistrar::erroring("down");
    let up = ScriptedRegistrar::available("up");
    let list = Arc::new(WatchList::with_domains(["a.com", "b.com"]));

    let (watcher, mut events) =
        DomainWatcher::new(backends(&[&down, &up]), list, WatcherConfig::default()).unwrap();

    assert_eq!(watcher.run_pass().await, 2);

    let events = drain(&mut events);
    let check_failures = events
        .iter()
        .filter(|e| matches!(e, WatchEvent::CheckFailed { .. }))
        .count();
    assert_eq!(check_failures, 2);
}

#[tokio::test]
async fn available_but_unclaimed_is_a_registration_failure() {
    let flaky = ScriptedRegistrar::new(
        "flaky",
        Outcome::Status(Status::Available),
        Outcome::Fail("payment declined"),
    );
    let list = Arc::new(WatchList::with_domains(["a.com"]));

    let (watcher, mut events) =
        DomainWatcher::new(backends(&[&flaky]), list, WatcherConfig::default()).unwrap();

    assert_eq!(watcher.run_pass().await, 0);

    let failure = drain(&mut events)
        .into_iter()
        .find_map(|e| match e {
            WatchEvent::RegistrationFailed { domain, error } => Some((domain, error)),
            _ => None,
        })
        .expect("registration failure event");
    assert_eq!(failure.0, "a.com");
    assert!(failure.1.contains("payment declined"));
}

#[tokio::test]
async fn later_additions_are_picked_up_by_the_next_pass() {
    let registrar = ScriptedRegistrar::unavailable("r");
    let list = Arc::new(WatchList::new());

    let (watcher, _events) = DomainWatcher::new(
        backends(&[&registrar]),
        list.clone(),
        WatcherConfig::default(),
    )
    .unwrap();

    watcher.run_pass().await;
    assert_eq!(registrar.check_calls(), 0);

    list.add("late.com").await.unwrap();
    watcher.run_pass().await;
    assert_eq!(registrar.check_calls(), 1);
}

#[tokio::test]
async fn run_performs_a_pass_before_the_first_pause() {
    let registrar = ScriptedRegistrar::unavailable("r");
    let list = Arc::new(WatchList::with_domains(["a.com"]));
    let shutdown = Shutdown::new();

    let (watcher, mut events) =
        DomainWatcher::new(backends(&[&registrar]), list, WatcherConfig::default()).unwrap();

    let handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { watcher.run(shutdown).await })
    };

    // The first pass runs immediately; the next one is a minute away
    let started = events.recv().await;
    assert_eq!(started, Some(WatchEvent::Started { registrars_count: 1 }));
    assert_eq!(events.recv().await, Some(WatchEvent::PassStarted { domains_count: 1 }));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("watcher stops promptly")
        .unwrap();

    assert_eq!(registrar.check_calls(), 1);
}
