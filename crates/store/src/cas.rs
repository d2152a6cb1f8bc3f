//! Counter simulation for stores without a native atomic counter.
//!
//! Some backends offer get/set and a conditional write, but no indivisible
//! increment/decrement. [`CasCounterStore`] wraps such a store and implements
//! the counter half of [`AtomicStore`] as a bounded compare-and-swap loop:
//! read the current value, attempt to swap in the updated one, retry on a
//! lost race. Past [`MAX_CAS_RETRIES`] contended rounds it gives up with
//! [`StoreError::Contention`] instead of spinning forever.
//!
//! The admission core never sees the simulation: it talks to the wrapper
//! through the same `AtomicStore` contract.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::atomic::{AtomicStore, StoreError};

/// Retry bound for one simulated counter operation.
pub const MAX_CAS_RETRIES: u32 = 16;

/// Conditional-write primitive needed to simulate a counter.
///
/// `expected == None` means "key must be unset".
#[async_trait]
pub trait CompareAndSwap: Send + Sync {
    /// Atomically replace the value at `key` with `new` if the current value
    /// equals `expected`. Returns whether the swap happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
impl CompareAndSwap for crate::in_memory::InMemoryAtomicStore {
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StoreError> {
        // The fake's mutex makes read-check-write one operation, which is
        // exactly what a real CAS primitive guarantees server-side.
        let current = self.get(key).await?;
        if current.as_deref() != expected {
            return Ok(false);
        }
        self.set(key, new).await?;
        Ok(true)
    }
}

/// Store adapter that turns a CAS primitive into atomic counters.
///
/// All non-counter operations delegate to the wrapped store unchanged.
#[derive(Debug)]
pub struct CasCounterStore<S> {
    inner: S,
    max_retries: u32,
}

impl<S> CasCounterStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            max_retries: MAX_CAS_RETRIES,
        }
    }

    pub fn with_max_retries(inner: S, max_retries: u32) -> Self {
        Self { inner, max_retries }
    }
}

impl<S> CasCounterStore<S>
where
    S: AtomicStore + CompareAndSwap,
{
    async fn add(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        for attempt in 0..self.max_retries {
            let current = self.inner.get(key).await?;
            let parsed = match current.as_deref() {
                None => 0,
                Some(raw) => raw
                    .parse::<i64>()
                    .map_err(|e| StoreError::corrupted(key, e.to_string()))?,
            };
            let next = parsed + delta;
            if self
                .inner
                .compare_and_swap(key, current.as_deref(), &next.to_string())
                .await?
            {
                return Ok(next);
            }
            debug!(key, attempt, "counter CAS lost race, retrying");
        }
        Err(StoreError::Contention {
            retries: self.max_retries,
        })
    }
}

#[async_trait]
impl<S> AtomicStore for CasCounterStore<S>
where
    S: AtomicStore + CompareAndSwap,
{
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.delete(key).await
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        self.add(key, 1).await
    }

    async fn decrement(&self, key: &str) -> Result<i64, StoreError> {
        self.add(key, -1).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        self.inner.compare_and_delete(key, expected).await
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.inner.set_contains(key, member).await
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.inner.set_add(key, member).await
    }

    async fn set_size(&self, key: &str) -> Result<u64, StoreError> {
        self.inner.set_size(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryAtomicStore;

    /// Store whose CAS always loses, to drive the retry bound.
    struct AlwaysContended(InMemoryAtomicStore);

    #[async_trait]
    impl AtomicStore for AlwaysContended {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key).await
        }
        async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.0.set(key, value).await
        }
        async fn set_if_absent(
            &self,
            key: &str,
            value: &str,
            ttl: Duration,
        ) -> Result<bool, StoreError> {
            self.0.set_if_absent(key, value, ttl).await
        }
        async fn delete(&self, key: &str) -> Result<bool, StoreError> {
            self.0.delete(key).await
        }
        async fn increment(&self, key: &str) -> Result<i64, StoreError> {
            self.0.increment(key).await
        }
        async fn decrement(&self, key: &str) -> Result<i64, StoreError> {
            self.0.decrement(key).await
        }
        async fn compare_and_delete(
            &self,
            key: &str,
            expected: &str,
        ) -> Result<bool, StoreError> {
            self.0.compare_and_delete(key, expected).await
        }
        async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
            self.0.set_contains(key, member).await
        }
        async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
            self.0.set_add(key, member).await
        }
        async fn set_size(&self, key: &str) -> Result<u64, StoreError> {
            self.0.set_size(key).await
        }
    }

    #[async_trait]
    impl CompareAndSwap for AlwaysContended {
        async fn compare_and_swap(
            &self,
            _key: &str,
            _expected: Option<&str>,
            _new: &str,
        ) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn simulated_counter_matches_native_semantics() {
        let store = CasCounterStore::new(InMemoryAtomicStore::new());
        store.set("stock", "2").await.unwrap();

        assert_eq!(store.decrement("stock").await.unwrap(), 1);
        assert_eq!(store.decrement("stock").await.unwrap(), 0);
        assert_eq!(store.decrement("stock").await.unwrap(), -1);
        assert_eq!(store.increment("stock").await.unwrap(), 0);
        assert_eq!(store.get("stock").await.unwrap().as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn simulated_counter_treats_unset_as_zero() {
        let store = CasCounterStore::new(InMemoryAtomicStore::new());
        assert_eq!(store.increment("fresh").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_contention() {
        let store = CasCounterStore::with_max_retries(
            AlwaysContended(InMemoryAtomicStore::new()),
            3,
        );
        let err = store.decrement("stock").await.unwrap_err();
        assert!(matches!(err, StoreError::Contention { retries: 3 }));
    }

    #[tokio::test]
    async fn corrupted_counter_is_not_retried() {
        let store = CasCounterStore::new(InMemoryAtomicStore::new());
        store.set("stock", "lots").await.unwrap();
        let err = store.decrement("stock").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { .. }));
    }
}
