//! Validated string types that enforce invariants at construction time

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for value types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("hostname cannot be empty or whitespace")]
    EmptyHostName,

    #[error("peer name cannot be empty or whitespace")]
    EmptyPeerName,

    #[error("invalid peer name {0:?}: must not contain '/' or whitespace")]
    InvalidPeerName(String),

    #[error("invalid message ID: {0}")]
    InvalidMessageId(String),

    #[error("invalid size quantity: {0}")]
    InvalidQuantity(String),

    #[error("connection limit cannot be 0")]
    ZeroConnections,

    #[error("spool key must be {expected} bytes, got {actual}")]
    InvalidSpoolKey { expected: usize, actual: usize },
}

/// Generates a validated string newtype.
///
/// Each type gets a validating `new()`, `as_str()`, `AsRef<str>`, `Deref`,
/// `Display`, `TryFrom<String>` and serde support that re-runs validation
/// on deserialization.
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(String) {
            validation: |$s_param:ident| $validation:expr,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " after validation")]
            pub fn new($s_param: String) -> Result<Self, ValidationError> {
                let validate = || $validation;
                validate()?;
                Ok(Self($s_param))
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice")]
            #[must_use]
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from($s_param: String) -> Result<Self, Self::Error> {
                Self::new($s_param)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValidationError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::new(s.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use validated_string;

validated_string! {
    /// A hostname that cannot be empty or whitespace-only
    ///
    /// # Examples
    /// ```
    /// use nntp_transit::types::HostName;
    ///
    /// let host = HostName::new("news.example.com".to_string()).unwrap();
    /// assert_eq!(host.as_str(), "news.example.com");
    ///
    /// assert!(HostName::new("".to_string()).is_err());
    /// assert!(HostName::new("   ".to_string()).is_err());
    /// ```
    #[doc(alias = "host")]
    pub struct HostName(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyHostName)
            } else {
                Ok(())
            }
        },
    }
}

validated_string! {
    /// Name of a configured peer
    ///
    /// Peer names end up in backlog queue file names (`queue.<peer>.db`), so
    /// they may not contain path separators or whitespace.
    pub struct PeerName(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyPeerName)
            } else if s.contains('/') || s.chars().any(char::is_whitespace) {
                Err(ValidationError::InvalidPeerName(s.clone()))
            } else {
                Ok(())
            }
        },
    }
}
