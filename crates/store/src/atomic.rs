//! Atomic store abstraction (mechanics only).
//!
//! ## Design Philosophy
//!
//! The admission core coordinates many independent callers exclusively
//! through indivisible server-side operations on a shared store. The trait
//! below is the exact primitive set that coordination needs, nothing more:
//!
//! - **Indivisible mutations**: increment/decrement and compare-and-delete
//!   execute as one server-side operation, never as read-then-write.
//! - **Transport-agnostic**: implementations range from a networked Redis
//!   adapter to an in-memory fake; both honor the same contract, so tests
//!   exercise the real coordination logic against the fake.
//! - **Single-key only**: no operation spans multiple keys or products.
//!   Multi-key atomicity is deliberately not part of the contract.
//!
//! ## Error model
//!
//! Expected negative answers (lock already held, member absent) are `Ok`
//! boolean results. [`StoreError`] is reserved for genuine failures:
//! unreachable backend, unexpected replies, corrupted values.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failure talking to the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable (connection, network, timeout). The only
    /// retryable condition: no partial mutation is assumed to have occurred,
    /// so callers may safely re-enter through the dedup check.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend answered, but the command failed or the reply was not
    /// what the contract promises.
    #[error("store command failed: {0}")]
    Command(String),

    /// A simulated atomic counter gave up after too many contended
    /// compare-and-swap rounds.
    #[error("counter contention: gave up after {retries} retries")]
    Contention { retries: u32 },

    /// A stored value does not parse as its expected shape (e.g. a
    /// non-numeric stock counter).
    #[error("corrupted value at {key}: {reason}")]
    Corrupted { key: String, reason: String },
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    pub fn corrupted(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupted {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether a caller may retry the whole operation from the top.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Minimal primitive set the admission core requires from its store.
///
/// Implementations must be safe to share across tasks; every method is one
/// logical server-side operation.
#[async_trait]
pub trait AtomicStore: Send + Sync {
    /// Read a string value. `None` if the key is unset (or expired).
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Unconditionally write a string value, clearing any TTL.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write `value` only if `key` is currently unset, with expiry `ttl`.
    /// Returns whether the write happened. This is the lock-acquire
    /// primitive: one eager attempt, no blocking, no queueing.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Delete a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Atomically add 1 to the integer at `key` (unset counts as 0) and
    /// return the resulting value.
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    /// Atomically subtract 1 from the integer at `key` (unset counts as 0)
    /// and return the resulting value. The result, not the prior value:
    /// callers decide on the post-decrement state.
    async fn decrement(&self, key: &str) -> Result<i64, StoreError>;

    /// Delete `key` only if its current value equals `expected`, as one
    /// server-side operation. Returns whether the delete happened; mismatch
    /// or absent key is `Ok(false)`, never an error. This is the safe
    /// lock-release primitive: a separate read+delete could remove a lock
    /// already re-acquired by another holder after TTL expiry.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError>;

    /// Whether `member` is in the set at `key` (unset set is empty).
    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Add `member` to the set at `key`, creating the set if needed.
    /// Returns whether the member was newly added (duplicates are harmless).
    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Cardinality of the set at `key` (unset set is 0).
    async fn set_size(&self, key: &str) -> Result<u64, StoreError>;
}

#[async_trait]
impl<S> AtomicStore for Arc<S>
where
    S: AtomicStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        (**self).set_if_absent(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete(key).await
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        (**self).increment(key).await
    }

    async fn decrement(&self, key: &str) -> Result<i64, StoreError> {
        (**self).decrement(key).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        (**self).compare_and_delete(key, expected).await
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        (**self).set_contains(key, member).await
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        (**self).set_add(key, member).await
    }

    async fn set_size(&self, key: &str) -> Result<u64, StoreError> {
        (**self).set_size(key).await
    }
}
