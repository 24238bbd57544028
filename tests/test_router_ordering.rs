//! Article routing: one transaction per article, feeders woken after commit


use std::sync::{Arc, Mutex};

use anyhow::Result;
use nntp_transit::backlog::{BacklogStore, Durability, QueueKind};
use nntp_transit::router::{ArticleRouter, FeederSignals, RouteError};
use nntp_transit::types::SpoolPosition;
use test_helpers::{
    Event, EventLog, RecordingEngine, RecordingFeeders, article, peer_name, registry_from,
};

const PEERS: &str = r#"
[[peer]]
name = "alpha"
host = "feed.alpha.net"

[[peer]]
name = "bravo"
send-to = "feed.bravo.net"
max-size = 100

[[peer]]
name = "inbound"
accept-from = "in.example.net"
"#;

struct Harness {
    log: EventLog,
    engine: Arc<RecordingEngine>,
    router: ArticleRouter,
}

fn harness(sync: bool) -> Result<Harness> {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let registry = registry_from(PEERS);
    let engine = Arc::new(RecordingEngine::new(Arc::clone(&log)));
    let store = Arc::new(BacklogStore::open(engine.clone(), &registry, sync)?);
    let router = ArticleRouter::new(
        registry,
        store,
        Arc::new(RecordingFeeders::new(Arc::clone(&log))),
    );
    Ok(Harness {
        log,
        engine,
        router,
    })
}

fn events(log: &EventLog) -> Vec<Event> {
    log.lock().unwrap().clone()
}

#[test]
fn test_commit_precedes_every_notify() -> Result<()> {
    let h = harness(true)?;

    let outcome = h.router.route(&article(1, "news.origin.net", 50))?;

    let names: Vec<&str> = outcome.queued_for().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, ["alpha", "bravo"]);
    assert_eq!(
        events(&h.log),
        [
            Event::Committed {
                puts: 2,
                durability: Durability::Sync
            },
            Event::Notified("alpha".to_string()),
            Event::Notified("bravo".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn test_each_peer_decided_independently() -> Result<()> {
    let h = harness(false)?;

    // Too large for bravo, and already seen by alpha
    let outcome = h.router.route(&article(2, "feed.alpha.net!origin", 500))?;

    assert!(outcome.is_empty());
    let store = h.router.store();
    let position = SpoolPosition::new(1, 2);
    assert!(!store.contains(&peer_name("alpha"), QueueKind::Active, position)?);
    assert!(!store.contains(&peer_name("bravo"), QueueKind::Active, position)?);

    let outcome = h.router.route(&article(3, "feed.alpha.net!origin", 50))?;
    let names: Vec<&str> = outcome.queued_for().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, ["bravo"]);
    Ok(())
}

#[test]
fn test_transaction_committed_when_nobody_wants_article() -> Result<()> {
    let h = harness(true)?;

    let outcome = h.router.route(&article(4, "feed.alpha.net", 5000))?;

    assert!(outcome.is_empty());
    assert_eq!(
        events(&h.log),
        [Event::Committed {
            puts: 0,
            durability: Durability::Sync
        }]
    );
    Ok(())
}

#[test]
fn test_failed_commit_wakes_nobody() -> Result<()> {
    let h = harness(true)?;
    h.engine.fail_commits(true);

    let err = h.router.route(&article(5, "news.origin.net", 10)).unwrap_err();

    assert!(matches!(err, RouteError::Commit(_)));
    assert_eq!(events(&h.log), [Event::CommitFailed]);

    h.engine.fail_commits(false);
    let store = h.router.store();
    assert_eq!(store.len(&peer_name("alpha"), QueueKind::Active)?, 0);
    assert_eq!(store.len(&peer_name("bravo"), QueueKind::Active)?, 0);
    Ok(())
}

#[test]
fn test_inbound_only_peer_never_queued() -> Result<()> {
    let h = harness(true)?;

    h.router.route(&article(6, "news.origin.net", 10))?;

    let store = h.router.store();
    assert_eq!(store.len(&peer_name("inbound"), QueueKind::Active)?, 0);
    assert_eq!(store.len(&peer_name("alpha"), QueueKind::Active)?, 1);
    Ok(())
}

#[tokio::test]
async fn test_feeder_wakes_and_finds_entry() -> Result<()> {
    let registry = registry_from(PEERS);
    let engine = Arc::new(nntp_transit::backlog::MemoryEngine::new());
    let store = Arc::new(BacklogStore::open(engine, &registry, true)?);
    let signals = FeederSignals::new();
    let router = ArticleRouter::new(registry, Arc::clone(&store), Arc::new(signals.clone()));

    let wakeup = signals.subscribe(&peer_name("bravo"));
    let feeder = tokio::spawn({
        let store = Arc::clone(&store);
        async move {
            wakeup.notified().await;
            store
                .pending(&peer_name("bravo"), QueueKind::Active, None, 10)
                .unwrap()
        }
    });

    router.route(&article(7, "news.origin.net", 10))?;

    let found = feeder.await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].position(), SpoolPosition::new(1, 7));
    Ok(())
}
