//! Accept-from resolution cycles and the address map they publish


use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use nntp_transit::address_map::AddressMap;
use nntp_transit::peer::PeerRegistry;
use nntp_transit::resolver::AddressResolver;
use test_helpers::{MockResolver, ip, registry_from};

const PEERS: &str = r#"
[[peer]]
name = "alpha"
accept-from = ["in1.alpha.net", "in2.alpha.net"]

[[peer]]
name = "bravo"
host = "feed.bravo.net"

[[peer]]
name = "charlie"
send-to = "out.charlie.net"
"#;

struct Harness {
    registry: Arc<PeerRegistry>,
    map: Arc<AddressMap>,
    mock: Arc<MockResolver>,
    resolver: AddressResolver,
}

fn harness(mock: MockResolver) -> Harness {
    let registry = registry_from(PEERS);
    let map = Arc::new(AddressMap::new());
    let mock = Arc::new(mock);
    let (resolver, coordinator) =
        AddressResolver::new(Arc::clone(&registry), Arc::clone(&map), mock.clone());
    tokio::spawn(coordinator.run());
    Harness {
        registry,
        map,
        mock,
        resolver,
    }
}

async fn settle(resolver: &AddressResolver) {
    tokio::time::timeout(Duration::from_secs(5), resolver.wait_settled())
        .await
        .expect("resolution settled");
}

fn owner(map: &AddressMap, addr: &str) -> Option<String> {
    map.lookup(ip(addr)).map(|p| p.name().to_string())
}

#[tokio::test]
async fn test_refresh_publishes_addresses() {
    let mock = MockResolver::new();
    mock.answer("in1.alpha.net", &["192.0.2.2", "192.0.2.1"]);
    mock.answer("in2.alpha.net", &["192.0.2.1", "2001:db8::a"]);
    mock.answer("feed.bravo.net", &["198.51.100.7"]);
    let h = harness(mock);

    // charlie has no accept-from hosts
    assert_eq!(h.resolver.refresh(), 3);
    settle(&h.resolver).await;

    let alpha = h.registry.find("alpha").unwrap();
    assert_eq!(
        alpha.resolved_addresses(),
        [ip("192.0.2.1"), ip("192.0.2.2"), ip("2001:db8::a")]
    );
    assert_eq!(owner(&h.map, "192.0.2.2").as_deref(), Some("alpha"));
    assert_eq!(owner(&h.map, "2001:db8::a").as_deref(), Some("alpha"));
    assert_eq!(owner(&h.map, "198.51.100.7").as_deref(), Some("bravo"));
    assert_eq!(owner(&h.map, "203.0.113.1"), None);
    assert_eq!(h.map.snapshot().len(), 4);
}

#[tokio::test]
async fn test_failed_lookup_keeps_previous_addresses() {
    let mock = MockResolver::new();
    mock.answer("in1.alpha.net", &["192.0.2.1"]);
    mock.answer("in2.alpha.net", &["192.0.2.2"]);
    mock.answer("feed.bravo.net", &["198.51.100.7"]);
    let h = harness(mock);

    h.resolver.refresh();
    settle(&h.resolver).await;

    // One host fails and the other moves; the whole cycle is dropped
    h.mock.forget("in1.alpha.net");
    h.mock.answer("in2.alpha.net", &["192.0.2.99"]);
    h.resolver.refresh();
    settle(&h.resolver).await;

    let alpha = h.registry.find("alpha").unwrap();
    assert_eq!(alpha.resolved_addresses(), [ip("192.0.2.1"), ip("192.0.2.2")]);
    assert_eq!(owner(&h.map, "192.0.2.1").as_deref(), Some("alpha"));
    assert_eq!(owner(&h.map, "192.0.2.99"), None);

    // A clean cycle replaces the set
    h.mock.answer("in1.alpha.net", &["192.0.2.1"]);
    h.resolver.refresh();
    settle(&h.resolver).await;

    assert_eq!(alpha.resolved_addresses(), [ip("192.0.2.1"), ip("192.0.2.99")]);
    assert_eq!(owner(&h.map, "192.0.2.2"), None);
    assert_eq!(owner(&h.map, "192.0.2.99").as_deref(), Some("alpha"));
}

#[tokio::test]
async fn test_peer_with_cycle_in_flight_is_skipped() {
    let mock = MockResolver::held();
    mock.answer("in1.alpha.net", &["192.0.2.1"]);
    mock.answer("in2.alpha.net", &["192.0.2.2"]);
    mock.answer("feed.bravo.net", &["198.51.100.7"]);
    let h = harness(mock);

    assert_eq!(h.resolver.refresh(), 3);
    assert_eq!(h.resolver.outstanding(), 3);

    // Nothing has finished, so every peer is still busy
    assert_eq!(h.resolver.refresh(), 0);
    assert!(h.map.snapshot().is_empty());

    h.mock.release(3);
    settle(&h.resolver).await;

    assert_eq!(h.mock.lookups(), 3);
    assert_eq!(h.resolver.outstanding(), 0);
    assert_eq!(h.map.snapshot().len(), 3);

    // Settled peers take part in the next cycle again
    assert_eq!(h.resolver.refresh(), 3);
    h.mock.release(3);
    settle(&h.resolver).await;
    assert_eq!(h.mock.lookups(), 6);
}

#[tokio::test]
async fn test_address_shared_by_two_peers_goes_to_first() {
    let mock = MockResolver::new();
    mock.answer("in1.alpha.net", &["192.0.2.50"]);
    mock.answer("in2.alpha.net", &["192.0.2.51"]);
    mock.answer("feed.bravo.net", &["192.0.2.50"]);
    let h = harness(mock);

    h.resolver.refresh();
    settle(&h.resolver).await;

    assert_eq!(owner(&h.map, "192.0.2.50").as_deref(), Some("alpha"));
    assert_eq!(h.map.snapshot().len(), 2);
}

#[tokio::test]
async fn test_mapped_connection_address_finds_peer() {
    let mock = MockResolver::new();
    mock.answer("in1.alpha.net", &["192.0.2.1"]);
    mock.answer("in2.alpha.net", &["192.0.2.2"]);
    mock.answer("feed.bravo.net", &["::ffff:198.51.100.7"]);
    let h = harness(mock);

    h.resolver.refresh();
    settle(&h.resolver).await;

    let v4: SocketAddr = "198.51.100.7:41000".parse().unwrap();
    let mapped: SocketAddr = "[::ffff:198.51.100.7]:41001".parse().unwrap();
    assert_eq!(h.map.lookup_socket(v4).unwrap().name().as_str(), "bravo");
    assert_eq!(h.map.lookup_socket(mapped).unwrap().name().as_str(), "bravo");
}
