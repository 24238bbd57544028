//! Article size quantities

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::ValidationError;

/// A byte quantity such as an article size ceiling
///
/// Zero means "no limit". Supports human-readable formats:
/// - "1mb" = 1,000,000 bytes
/// - "512kib" = 524,288 bytes
/// - 10000 = 10,000 bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(u64);

impl ByteSize {
    /// No limit
    pub const UNLIMITED: Self = Self(0);

    #[must_use]
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    #[must_use]
    #[inline]
    pub const fn get(&self) -> u64 {
        self.0
    }

    #[must_use]
    #[inline]
    pub const fn is_unlimited(&self) -> bool {
        self.0 == 0
    }

    /// True if `len` bytes is over this limit
    #[must_use]
    #[inline]
    pub const fn exceeded_by(&self, len: u64) -> bool {
        self.0 != 0 && len > self.0
    }
}

impl std::str::FromStr for ByteSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        // Plain numbers are bytes
        if let Ok(bytes) = s.parse::<u64>() {
            return Ok(Self(bytes));
        }

        s.parse::<bytesize::ByteSize>()
            .map(|size| Self(size.as_u64()))
            .map_err(|_| ValidationError::InvalidQuantity(s))
    }
}

impl std::fmt::Display for ByteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unlimited() {
            f.write_str("unlimited")
        } else {
            write!(f, "{}", bytesize::ByteSize::b(self.0))
        }
    }
}

impl Serialize for ByteSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrU64 {
            String(String),
            U64(u64),
        }

        match StringOrU64::deserialize(deserializer)? {
            StringOrU64::U64(bytes) => Ok(Self(bytes)),
            StringOrU64::String(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
