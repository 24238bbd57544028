//! Article filter chains
//!
//! The filter language itself lives outside this crate. Filters reach the
//! core as [`ArticleFilter`] implementations registered by name in a
//! [`FilterCatalog`]; peer configuration refers to them (or to named groups
//! of them) and gets back an ordered [`FilterChain`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::article::Article;

/// Outcome of running a filter against an article
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    Allow,
    Deny,
}

/// A single article filter
pub trait ArticleFilter: Send + Sync {
    fn evaluate(&self, article: &Article) -> FilterVerdict;
}

impl<F> ArticleFilter for F
where
    F: Fn(&Article) -> FilterVerdict + Send + Sync,
{
    fn evaluate(&self, article: &Article) -> FilterVerdict {
        self(article)
    }
}

/// A filter together with the name it was registered under
#[derive(Clone)]
pub struct NamedFilter {
    name: Arc<str>,
    filter: Arc<dyn ArticleFilter>,
}

impl NamedFilter {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for NamedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamedFilter").field(&self.name).finish()
    }
}

/// Ordered list of filters applied to one direction of a peer's feed
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<NamedFilter>,
}

impl FilterChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: NamedFilter) {
        self.filters.push(filter);
    }

    pub fn extend(&mut self, filters: impl IntoIterator<Item = NamedFilter>) {
        self.filters.extend(filters);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(NamedFilter::name)
    }

    /// Run every filter in order; the first `Deny` wins
    #[must_use]
    pub fn evaluate(&self, article: &Article) -> FilterVerdict {
        let denied = self
            .filters
            .iter()
            .any(|f| f.filter.evaluate(article) == FilterVerdict::Deny);
        if denied {
            FilterVerdict::Deny
        } else {
            FilterVerdict::Allow
        }
    }
}

/// Errors building a filter catalog
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("filter or group \"{0}\" is already defined")]
    Duplicate(String),

    #[error("filter group \"{group}\" refers to undefined filter \"{filter}\"")]
    UndefinedMember { group: String, filter: String },
}

struct CatalogEntry {
    filter: NamedFilter,
    used: AtomicBool,
}

/// Registry of named filters and filter groups
#[derive(Default)]
pub struct FilterCatalog {
    filters: HashMap<String, CatalogEntry>,
    groups: HashMap<String, Vec<String>>,
}

impl FilterCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter under `name`
    pub fn register<F>(&mut self, name: &str, filter: F) -> Result<(), FilterError>
    where
        F: ArticleFilter + 'static,
    {
        if self.is_defined(name) {
            return Err(FilterError::Duplicate(name.to_string()));
        }
        self.filters.insert(
            name.to_string(),
            CatalogEntry {
                filter: NamedFilter {
                    name: Arc::from(name),
                    filter: Arc::new(filter),
                },
                used: AtomicBool::new(false),
            },
        );
        Ok(())
    }

    /// Register a group expanding to the given filters, in order
    pub fn register_group<I, S>(&mut self, name: &str, members: I) -> Result<(), FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.is_defined(name) {
            return Err(FilterError::Duplicate(name.to_string()));
        }
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        if let Some(missing) = members.iter().find(|m| !self.filters.contains_key(*m)) {
            return Err(FilterError::UndefinedMember {
                group: name.to_string(),
                filter: missing.clone(),
            });
        }
        self.groups.insert(name.to_string(), members);
        Ok(())
    }

    fn is_defined(&self, name: &str) -> bool {
        self.filters.contains_key(name) || self.groups.contains_key(name)
    }

    /// Resolve a filter or group name, marking every filter it names as used
    ///
    /// Returns `None` if nothing by that name exists.
    pub fn resolve(&self, name: &str) -> Option<Vec<NamedFilter>> {
        if let Some(entry) = self.filters.get(name) {
            entry.used.store(true, Ordering::Relaxed);
            return Some(vec![entry.filter.clone()]);
        }

        let members = self.groups.get(name)?;
        Some(
            members
                .iter()
                .filter_map(|m| self.filters.get(m))
                .map(|entry| {
                    entry.used.store(true, Ordering::Relaxed);
                    entry.filter.clone()
                })
                .collect(),
        )
    }

    /// Filters that no peer refers to, sorted by name
    #[must_use]
    pub fn unused(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .filters
            .iter()
            .filter(|(_, e)| !e.used.load(Ordering::Relaxed))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FilterCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut filters: Vec<_> = self.filters.keys().collect();
        filters.sort_unstable();
        let mut groups: Vec<_> = self.groups.keys().collect();
        groups.sort_unstable();
        f.debug_struct("FilterCatalog")
            .field("filters", &filters)
            .field("groups", &groups)
            .finish()
    }
}
