//! Connection limit configuration types

use std::num::NonZeroU32;

use crate::constants::peer::MAX_CONNECTIONS_DEFAULT;
use crate::types::ValidationError;

nonzero_newtype! {
    /// A non-zero cap on concurrent connections in one direction
    ///
    /// # Examples
    /// ```
    /// use nntp_transit::types::MaxConnections;
    ///
    /// let max = MaxConnections::new(10).unwrap();
    /// assert_eq!(max.get(), 10);
    ///
    /// // Zero connections is invalid
    /// assert!(MaxConnections::new(0).is_none());
    /// ```
    #[doc(alias = "connection_limit")]
    pub struct MaxConnections(NonZeroU32: u32, serialize as serialize_u32);
}

impl MaxConnections {
    /// Cap applied when neither a peer nor the default peer sets one
    pub const DEFAULT: Self = match Self::new(MAX_CONNECTIONS_DEFAULT) {
        Some(max) => max,
        None => panic!("MAX_CONNECTIONS_DEFAULT must be non-zero"),
    };
}

impl Default for MaxConnections {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for MaxConnections {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ValidationError::ZeroConnections)
    }
}
