//! Articles as seen by the routing core
//!
//! The core never parses article text. It needs the message-id, the Path
//! header (for loop prevention), the newsgroups (for filters), the raw size,
//! and the spool position that becomes the backlog key.

use crate::constants::peer::PATH_SEPARATOR;
use crate::types::{MessageId, SpoolPosition};

/// An article that has been stored in the spool and is ready for routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    message_id: MessageId,
    position: SpoolPosition,
    path: String,
    newsgroups: Vec<String>,
    content: Vec<u8>,
}

impl Article {
    pub fn new(
        message_id: MessageId,
        position: SpoolPosition,
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            message_id,
            position,
            path: path.into(),
            newsgroups: Vec::new(),
            content: content.into(),
        }
    }

    /// Attach the article's Newsgroups header, already split on commas
    #[must_use]
    pub fn with_newsgroups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.newsgroups = groups.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    #[must_use]
    pub fn position(&self) -> SpoolPosition {
        self.position
    }

    /// Raw Path header, e.g. `news.a.net!news.b.net!not-for-mail`
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Non-empty components of the Path header
    pub fn path_components(&self) -> impl Iterator<Item = &str> {
        self.path
            .split(PATH_SEPARATOR)
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    #[must_use]
    pub fn newsgroups(&self) -> &[String] {
        &self.newsgroups
    }

    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Article size in bytes
    #[must_use]
    #[inline]
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
