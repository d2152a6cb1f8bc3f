//! Strongly-typed identifiers used across the domain.
//!
//! Product and user ids are opaque string keys: they scope every entry in the
//! backing store, so they are validated once at construction and treated as
//! immutable afterwards.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a sale product (key scope for stock, lock and participants).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

/// Identifier of a participating user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a validated identifier. Rejects empty or
            /// whitespace-only input.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(DomainError::invalid_id(concat!($name, " cannot be empty")));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_string_newtype!(ProductId, "ProductId");
impl_string_newtype!(UserId, "UserId");

/// Per-attempt lock ownership token.
///
/// A fresh random nonce is generated for every admission attempt. Using the
/// user id as the token would let two concurrent attempts by the same user
/// share ownership of one lock entry, defeating compare-and-delete.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockToken(Uuid);

impl LockToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl core::fmt::Display for LockToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for LockToken {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| DomainError::invalid_id(format!("LockToken: {}", e)))?;
        Ok(Self(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_rejects_empty_input() {
        assert!(ProductId::new("").is_err());
        assert!(ProductId::new("   ").is_err());
    }

    #[test]
    fn product_id_keeps_value_verbatim() {
        let id = ProductId::new("p-2024-limited").unwrap();
        assert_eq!(id.as_str(), "p-2024-limited");
        assert_eq!(id.to_string(), "p-2024-limited");
    }

    #[test]
    fn user_id_parses_from_str() {
        let id: UserId = "u1".parse().unwrap();
        assert_eq!(id.as_str(), "u1");
        assert!("".parse::<UserId>().is_err());
    }

    #[test]
    fn lock_tokens_are_unique_per_attempt() {
        let a = LockToken::generate();
        let b = LockToken::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn lock_token_round_trips_through_display() {
        let token = LockToken::generate();
        let parsed: LockToken = token.to_string().parse().unwrap();
        assert_eq!(token, parsed);
    }

    #[test]
    fn lock_token_rejects_garbage() {
        assert!("not-a-token".parse::<LockToken>().is_err());
    }
}
