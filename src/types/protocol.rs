//! Protocol-related type-safe wrappers for NNTP primitives

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;
use super::validated::validated_string;

validated_string! {
    /// A validated NNTP message ID (RFC 3977 §3.6)
    ///
    /// Message IDs must be enclosed in angle brackets.
    ///
    /// # Examples
    /// ```
    /// use nntp_transit::types::MessageId;
    ///
    /// let id = MessageId::new("<abc@example.com>".to_string()).unwrap();
    /// assert_eq!(id.without_brackets(), "abc@example.com");
    /// assert!(MessageId::new("abc@example.com".to_string()).is_err());
    /// ```
    pub struct MessageId(String) {
        validation: |s| {
            if s.len() < 3 || !s.starts_with('<') || !s.ends_with('>') {
                Err(ValidationError::InvalidMessageId(s.clone()))
            } else {
                Ok(())
            }
        },
    }
}

impl MessageId {
    /// Rebuild a message ID from the raw bytes stored in a backlog queue
    pub fn from_stored(bytes: Vec<u8>) -> Result<Self, ValidationError> {
        let s = String::from_utf8(bytes)
            .map_err(|e| ValidationError::InvalidMessageId(format!("not UTF-8: {e}")))?;
        Self::new(s)
    }

    /// The identifier without its angle brackets
    #[must_use]
    #[inline]
    pub fn without_brackets(&self) -> &str {
        &self.0[1..self.0.len() - 1]
    }

    /// Raw bytes, as written into the backlog value
    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_requires_brackets() {
        assert!(MessageId::new("<a@b>".to_string()).is_ok());
        assert!(MessageId::new("<>".to_string()).is_err());
        assert!(MessageId::new("<a@b".to_string()).is_err());
    }

    #[test]
    fn test_from_stored_round_trips_bytes() {
        let id = MessageId::new("<x@y.z>".to_string()).unwrap();
        let back = MessageId::from_stored(id.as_bytes().to_vec()).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_from_stored_rejects_invalid_utf8() {
        assert!(MessageId::from_stored(vec![b'<', 0xff, b'>']).is_err());
    }
}
