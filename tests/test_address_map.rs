//! Address map lookups over resolved accept-from sets


use std::sync::Arc;

use nntp_transit::address_map::{AddressMap, AddressTable};
use nntp_transit::peer::{Peer, PeerConfig};
use test_helpers::{ip, peer_name};

fn peer(name: &str) -> Arc<Peer> {
    Arc::new(Peer::new(PeerConfig::named(peer_name(name))))
}

#[test]
fn test_lookup_finds_owner() {
    let alpha = peer("alpha");
    let bravo = peer("bravo");
    let table = AddressTable::from_entries(vec![
        (ip("192.0.2.10"), Arc::clone(&alpha)),
        (ip("2001:db8::1"), Arc::clone(&bravo)),
        (ip("192.0.2.2"), Arc::clone(&bravo)),
    ]);

    assert_eq!(table.len(), 3);
    assert_eq!(table.lookup(ip("192.0.2.10")).unwrap().name().as_str(), "alpha");
    assert_eq!(table.lookup(ip("192.0.2.2")).unwrap().name().as_str(), "bravo");
    assert_eq!(table.lookup(ip("2001:db8::1")).unwrap().name().as_str(), "bravo");
    assert!(table.lookup(ip("192.0.2.3")).is_none());
}

#[test]
fn test_entries_sorted_v4_before_v6() {
    let alpha = peer("alpha");
    let table = AddressTable::from_entries(vec![
        (ip("2001:db8::1"), Arc::clone(&alpha)),
        (ip("10.0.0.2"), Arc::clone(&alpha)),
        (ip("10.0.0.1"), Arc::clone(&alpha)),
    ]);

    let order: Vec<String> = table.iter().map(|(a, _)| a.to_string()).collect();
    assert_eq!(order, ["10.0.0.1", "10.0.0.2", "2001:db8::1"]);
}

#[test]
fn test_duplicate_address_first_peer_wins() {
    let alpha = peer("alpha");
    let bravo = peer("bravo");
    let table = AddressTable::from_entries(vec![
        (ip("192.0.2.1"), Arc::clone(&alpha)),
        (ip("192.0.2.1"), Arc::clone(&bravo)),
    ]);

    assert_eq!(table.len(), 1);
    assert_eq!(table.lookup(ip("192.0.2.1")).unwrap().name().as_str(), "alpha");
}

#[test]
fn test_mapped_ipv6_matches_ipv4_entry() {
    let alpha = peer("alpha");
    let table = AddressTable::from_entries(vec![(ip("192.0.2.7"), alpha)]);

    let found = table.lookup(ip("::ffff:192.0.2.7"));
    assert_eq!(found.unwrap().name().as_str(), "alpha");
}

#[test]
fn test_empty_map_matches_nothing() {
    let map = AddressMap::new();
    assert!(map.snapshot().is_empty());
    assert!(map.lookup(ip("127.0.0.1")).is_none());
}

#[test]
fn test_rebuild_from_unresolved_registry_is_empty() {
    let registry = test_helpers::registry_from(
        "[[peer]]\nname = \"alpha\"\naccept-from = \"feed.alpha.net\"\n",
    );
    let map = AddressMap::new();
    map.rebuild(&registry);
    assert!(map.snapshot().is_empty());
}
