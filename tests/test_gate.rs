//! Acceptance checks: size ceiling, path excludes, filters and offer filters


use nntp_transit::Article;
use nntp_transit::filter::{FilterCatalog, FilterVerdict};
use nntp_transit::gate::{self, RejectReason, Verdict};
use nntp_transit::types::MessageId;
use test_helpers::{article, registry_from, registry_with_filters};

#[test]
fn test_size_limit_is_inclusive() {
    let registry = registry_from(
        "[[peer]]\nname = \"alpha\"\nsend-to = \"feed.alpha.net\"\nmax-size = 1000\n",
    );
    let alpha = registry.find("alpha").unwrap();

    assert!(gate::wants(alpha, &article(1, "origin", 1000)));
    assert_eq!(
        gate::evaluate(alpha, &article(2, "origin", 1001)),
        Verdict::Reject(RejectReason::TooLarge {
            size: 1001,
            limit: 1000
        })
    );
}

#[test]
fn test_unlimited_size_accepts_anything() {
    let registry = registry_from("[[peer]]\nname = \"alpha\"\nsend-to = \"feed.alpha.net\"\n");
    let alpha = registry.find("alpha").unwrap();
    assert!(gate::wants(alpha, &article(1, "origin", 64 * 1024)));
}

#[test]
fn test_path_exclude_matches_whole_components_ignoring_case() {
    let registry = registry_from(
        "[[peer]]\nname = \"alpha\"\nsend-to = \"feed.alpha.net\"\nexclude = \"Foo.Bar\"\n",
    );
    let alpha = registry.find("alpha").unwrap();

    assert_eq!(
        gate::evaluate(alpha, &article(1, "foo!foo.bar!baz", 10)),
        Verdict::Reject(RejectReason::Excluded("Foo.Bar".to_string()))
    );
    assert!(!gate::wants(alpha, &article(2, "FOO.BAR", 10)));
}

#[test]
fn test_exclude_does_not_match_across_components() {
    let registry = registry_from(
        "[[peer]]\nname = \"alpha\"\nsend-to = \"feed.alpha.net\"\nexclude = \"Foo.Bar\"\n",
    );
    let alpha = registry.find("alpha").unwrap();

    // "foo" and "bar" are separate path entries, neither equal to "Foo.Bar"
    assert!(gate::wants(alpha, &article(1, "foo!bar!baz", 10)));
    assert!(gate::wants(alpha, &article(2, "foo.bar.baz!qux", 10)));
}

#[test]
fn test_article_not_sent_back_to_its_source() {
    let registry = registry_from("[[peer]]\nname = \"alpha\"\nhost = \"feed.alpha.net\"\n");
    let alpha = registry.find("alpha").unwrap();

    assert!(!gate::wants(
        alpha,
        &article(1, "feed.alpha.net!not-for-mail", 10)
    ));
    assert!(gate::wants(alpha, &article(2, "news.other.net!not-for-mail", 10)));
}

#[test]
fn test_size_checked_before_excludes() {
    let registry = registry_from(
        "[[peer]]\nname = \"alpha\"\nsend-to = \"feed.alpha.net\"\nmax-size = 5\nexclude = \"x\"\n",
    );
    let alpha = registry.find("alpha").unwrap();

    assert!(matches!(
        gate::evaluate(alpha, &article(1, "x", 6)),
        Verdict::Reject(RejectReason::TooLarge { .. })
    ));
}

#[test]
fn test_outgoing_filter_denies() {
    let mut catalog = FilterCatalog::new();
    catalog
        .register("no-binaries", |a: &Article| {
            if a.newsgroups().iter().any(|g| g.contains(".binaries.")) {
                FilterVerdict::Deny
            } else {
                FilterVerdict::Allow
            }
        })
        .unwrap();
    let registry = registry_with_filters(
        r#"
[[peer]]
name = "alpha"
send-to = "feed.alpha.net"
outgoing-filters = "no-binaries"
"#,
        &catalog,
    );
    let alpha = registry.find("alpha").unwrap();

    let text = article(1, "origin", 10).with_newsgroups(["alt.test"]);
    let binary = article(2, "origin", 10).with_newsgroups(["alt.test", "alt.binaries.misc"]);

    assert!(gate::wants(alpha, &text));
    assert_eq!(
        gate::evaluate(alpha, &binary),
        Verdict::Reject(RejectReason::Filtered)
    );
}

#[test]
fn test_offer_filters_use_wildmat() {
    let registry = registry_from(
        r#"
[[peer]]
name = "alpha"
send-to = "feed.alpha.net"
offer-filter = ["<*@spam.example>", "<cancel.*>"]
"#,
    );
    let alpha = registry.find("alpha").unwrap();

    let id = |s: &str| MessageId::new(s.to_string()).unwrap();
    assert!(!gate::offers(alpha, &id("<123@spam.example>")));
    assert!(!gate::offers(alpha, &id("<cancel.42@news.example>")));
    assert!(gate::offers(alpha, &id("<123@ham.example>")));
}

#[test]
fn test_only_outbound_peers_participate() {
    let registry = registry_from(
        r#"
[[peer]]
name = "inbound"
accept-from = "in.example.net"

[[peer]]
name = "outbound"
send-to = "out.example.net"
"#,
    );

    assert!(!gate::participates(registry.find("inbound").unwrap()));
    assert!(gate::participates(registry.find("outbound").unwrap()));

    let routed: Vec<&str> = registry.outbound().map(|p| p.name().as_str()).collect();
    assert_eq!(routed, ["outbound"]);
}

#[test]
fn test_reject_reason_display() {
    assert_eq!(
        RejectReason::TooLarge {
            size: 2000,
            limit: 1000
        }
        .to_string(),
        "size 2000 exceeds 1000"
    );
    assert_eq!(
        RejectReason::Excluded("news.a.net".to_string()).to_string(),
        "path contains excluded \"news.a.net\""
    );
}
