//! Spool positions and their encoded backlog keys
//!
//! A spool position `(spool_id, offset)` uniquely locates an article in the
//! article spool and is the key of every backlog queue entry. Keys are stored
//! as 12 big-endian bytes, so byte order and numeric order agree, but the
//! `Ord` implementation on [`SpoolKey`] decodes the fields anyway so the
//! queue ordering never depends on the encoding.

use std::cmp::Ordering;
use std::fmt;

use super::ValidationError;
use crate::constants::backlog::KEY_LEN;

/// Location of an article in the spool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpoolPosition {
    /// Spool file identifier
    pub spool_id: u32,
    /// Byte offset of the article inside the spool file
    pub offset: u64,
}

impl SpoolPosition {
    #[must_use]
    pub const fn new(spool_id: u32, offset: u64) -> Self {
        Self { spool_id, offset }
    }

    /// Encode as a backlog key
    #[must_use]
    pub fn to_key(self) -> SpoolKey {
        let mut buf = [0u8; KEY_LEN];
        buf[..4].copy_from_slice(&self.spool_id.to_be_bytes());
        buf[4..].copy_from_slice(&self.offset.to_be_bytes());
        SpoolKey(buf)
    }
}

impl fmt::Display for SpoolPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X},{}", self.spool_id, self.offset)
    }
}

/// Encoded spool position, as stored in a backlog queue
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpoolKey([u8; KEY_LEN]);

impl SpoolKey {
    /// Rebuild a key from raw store bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        let buf: [u8; KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| ValidationError::InvalidSpoolKey {
                    expected: KEY_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(buf))
    }

    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Decode back into a spool position
    #[must_use]
    pub fn position(&self) -> SpoolPosition {
        let mut id = [0u8; 4];
        let mut offset = [0u8; 8];
        id.copy_from_slice(&self.0[..4]);
        offset.copy_from_slice(&self.0[4..]);
        SpoolPosition {
            spool_id: u32::from_be_bytes(id),
            offset: u64::from_be_bytes(offset),
        }
    }
}

impl From<SpoolPosition> for SpoolKey {
    fn from(pos: SpoolPosition) -> Self {
        pos.to_key()
    }
}

impl Ord for SpoolKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position().cmp(&other.position())
    }
}

impl PartialOrd for SpoolKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for SpoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpoolKey({})", self.position())
    }
}
