//! Article routing to peer backlog queues
//!
//! For each newly stored article the router asks every outbound peer
//! whether it wants the article, queues it for those that do in a single
//! backlog transaction, and wakes their feeders only after that transaction
//! has committed. A feeder that wakes up therefore always finds the entry.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use nntp_transit::article::Article;
//! use nntp_transit::backlog::{BacklogStore, MemoryEngine};
//! use nntp_transit::config::parse_config;
//! use nntp_transit::filter::FilterCatalog;
//! use nntp_transit::peer::PeerRegistry;
//! use nntp_transit::router::{ArticleRouter, FeederSignals};
//! use nntp_transit::types::{MessageId, SpoolPosition};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = parse_config("[[peer]]\nname = \"alpha\"\nhost = \"feed.alpha.net\"\n", "demo")?;
//! let registry = Arc::new(PeerRegistry::from_config(&config, &FilterCatalog::new())?);
//! let store = BacklogStore::open(Arc::new(MemoryEngine::new()), &registry, true)?;
//! let router = ArticleRouter::new(registry, Arc::new(store), Arc::new(FeederSignals::new()));
//!
//! let article = Article::new(
//!     MessageId::new("<1@news.example>".to_string())?,
//!     SpoolPosition::new(1, 0),
//!     "news.example!not-for-mail",
//!     b"body".to_vec(),
//! );
//! let outcome = router.route(&article)?;
//! assert_eq!(outcome.queued_for().len(), 1);
//! # Ok(())
//! # }
//! ```

mod feeder;

pub use feeder::{FeederNotify, FeederSignals};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::article::Article;
use crate::backlog::{BacklogError, BacklogStore, StoreError};
use crate::gate;
use crate::peer::{Peer, PeerRegistry};
use crate::types::PeerName;

/// Routing failures; both leave the backlog in doubt and are fatal
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Backlog(#[from] BacklogError),

    #[error("cannot commit backlog transaction: {0}")]
    Commit(StoreError),
}

/// Peers an article was queued for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOutcome {
    queued_for: Vec<PeerName>,
}

impl RouteOutcome {
    /// Peer names in registry order
    #[must_use]
    pub fn queued_for(&self) -> &[PeerName] {
        &self.queued_for
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queued_for.is_empty()
    }
}

/// Routes articles into the backlog and wakes feeders
#[derive(Clone)]
pub struct ArticleRouter {
    registry: Arc<PeerRegistry>,
    store: Arc<BacklogStore>,
    feeders: Arc<dyn FeederNotify>,
}

impl ArticleRouter {
    #[must_use]
    pub fn new(
        registry: Arc<PeerRegistry>,
        store: Arc<BacklogStore>,
        feeders: Arc<dyn FeederNotify>,
    ) -> Self {
        Self {
            registry,
            store,
            feeders,
        }
    }

    /// Queue `article` for every outbound peer that wants it
    ///
    /// The acceptance decision is made once per peer. All enqueues share
    /// one transaction, committed even when nobody wants the article;
    /// feeders are notified only after a successful commit.
    pub fn route(&self, article: &Article) -> Result<RouteOutcome, RouteError> {
        let accepting: Vec<&Arc<Peer>> = self
            .registry
            .outbound()
            .filter(|peer| gate::wants(peer, article))
            .collect();

        let mut txn = self.store.begin()?;
        for peer in &accepting {
            self.store.enqueue(peer.name(), article, &mut *txn)?;
        }
        txn.commit().map_err(RouteError::Commit)?;

        for peer in &accepting {
            self.feeders.notify(peer.name());
        }

        debug!(
            "Routed {} to {} peer(s)",
            article.message_id(),
            accepting.len()
        );
        Ok(RouteOutcome {
            queued_for: accepting.iter().map(|p| p.name().clone()).collect(),
        })
    }

    #[must_use]
    pub fn store(&self) -> &Arc<BacklogStore> {
        &self.store
    }
}

impl fmt::Debug for ArticleRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArticleRouter")
            .field("peers", &self.registry.len())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
