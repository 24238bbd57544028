//! Article acceptance decisions
//!
//! [`wants`] decides whether an article belongs in a peer's feed at all;
//! [`offers`] decides whether a message-id may be offered to the peer.
//! Both are pure functions of the peer configuration and their input.

use std::fmt;

use crate::article::Article;
use crate::filter::FilterVerdict;
use crate::peer::Peer;
use crate::types::MessageId;

/// Why an article was not accepted for a peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Content larger than the peer's size ceiling
    TooLarge { size: u64, limit: u64 },
    /// A path component matched one of the peer's excludes
    Excluded(String),
    /// The outgoing filter chain denied the article
    Filtered,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { size, limit } => write!(f, "size {size} exceeds {limit}"),
            Self::Excluded(component) => write!(f, "path contains excluded \"{component}\""),
            Self::Filtered => f.write_str("denied by outgoing filters"),
        }
    }
}

/// Result of the acceptance checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

impl Verdict {
    #[must_use]
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Run the acceptance checks in order: size, path excludes, outgoing filters
///
/// An exclude entry matches a Path component only when the whole component
/// is equal to it, ignoring ASCII case. It never matches a run of
/// components, so `Foo.Bar` does not exclude `foo!bar!baz`.
#[must_use]
pub fn evaluate(peer: &Peer, article: &Article) -> Verdict {
    let config = peer.config();

    let size = article.len();
    if config.max_size.exceeded_by(size) {
        return Verdict::Reject(RejectReason::TooLarge {
            size,
            limit: config.max_size.get(),
        });
    }

    for component in article.path_components() {
        if let Some(excluded) = config
            .exclude
            .iter()
            .find(|e| e.eq_ignore_ascii_case(component))
        {
            return Verdict::Reject(RejectReason::Excluded(excluded.clone()));
        }
    }

    if config.filters_out.evaluate(article) == FilterVerdict::Deny {
        return Verdict::Reject(RejectReason::Filtered);
    }

    Verdict::Accept
}

/// True if `article` should be queued for `peer`
#[must_use]
pub fn wants(peer: &Peer, article: &Article) -> bool {
    evaluate(peer, article).is_accept()
}

/// True unless the message-id matches one of the peer's offer filters
#[must_use]
pub fn offers(peer: &Peer, message_id: &MessageId) -> bool {
    !peer
        .config()
        .offer_filters
        .iter()
        .any(|pattern| pattern.matches(message_id.as_str()))
}

/// True if the peer takes part in routing at all
#[must_use]
pub fn participates(peer: &Peer) -> bool {
    peer.is_outbound()
}
