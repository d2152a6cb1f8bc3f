//! Per-product admission lock.

use std::sync::Arc;
use std::time::Duration;

use flashgate_core::keys;
use flashgate_core::{LockToken, ProductId};
use flashgate_store::{AtomicStore, StoreError};
use tracing::{debug, info};

/// Default lock TTL. Must exceed the critical section's worst-case latency
/// (one decrement, one set-add, one compensating increment at most).
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);

/// TTL-bounded mutual exclusion per product.
///
/// Acquisition is one eager set-if-absent: no blocking, no queueing, no
/// internal retry. The TTL bounds worst-case starvation when a holder
/// crashes without releasing. Release is an atomic compare-and-delete on the
/// holder's token, so an attempt that outlived its TTL can never delete a
/// lock already re-acquired by someone else.
#[derive(Debug)]
pub struct AdmissionLock<S> {
    store: Arc<S>,
}

impl<S> Clone for AdmissionLock<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: AtomicStore> AdmissionLock<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// One attempt to take the lock for `product`. Returns whether this
    /// token now holds it.
    pub async fn try_acquire(
        &self,
        product: &ProductId,
        token: &LockToken,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let acquired = self
            .store
            .set_if_absent(&keys::lock_key(product), &token.to_string(), ttl)
            .await?;
        debug!(%product, %token, acquired, "lock acquisition attempted");
        Ok(acquired)
    }

    /// Release the lock if `token` still owns it. Mismatch or absent entry
    /// returns `false` without error: the lock either expired and moved on,
    /// or was never ours to release.
    pub async fn release(
        &self,
        product: &ProductId,
        token: &LockToken,
    ) -> Result<bool, StoreError> {
        let released = self
            .store
            .compare_and_delete(&keys::lock_key(product), &token.to_string())
            .await?;
        if released {
            info!(%product, %token, "lock released");
        } else {
            debug!(%product, %token, "lock release skipped, token no longer owns entry");
        }
        Ok(released)
    }
}
