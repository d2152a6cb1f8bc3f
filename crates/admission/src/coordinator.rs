//! Admission orchestration.
//!
//! One `participate` call walks the whole protocol: dedup fast path, lock
//! acquisition, atomic stock decrement (with compensating rollback on
//! overdraft), registry update, and an unconditional lock release on every
//! exit path after acquisition.

use std::sync::Arc;
use std::time::Duration;

use flashgate_core::keys;
use flashgate_core::{LockToken, ProductId, UserId};
use flashgate_store::{AtomicStore, StoreError};
use tracing::{info, instrument, warn};

use crate::ledger::InventoryLedger;
use crate::lock::{AdmissionLock, DEFAULT_LOCK_TTL};
use crate::outcome::ParticipationOutcome;
use crate::registry::ParticipantRegistry;

/// Orchestrates registry, ledger and lock into the admission protocol, and
/// carries the administrative surface (stock provisioning, reset, counts).
///
/// The lock is per-product: all attempts for a product serialize through one
/// critical section, trading throughput for race-free correctness even
/// though the decrement itself is already atomic at the store level.
#[derive(Debug)]
pub struct ParticipationCoordinator<S> {
    store: Arc<S>,
    registry: ParticipantRegistry<S>,
    ledger: InventoryLedger<S>,
    lock: AdmissionLock<S>,
    lock_ttl: Duration,
}

// Manual impl: the derive would demand `S: Clone`, but sharing the `Arc`
// is all cloning means here.
impl<S> Clone for ParticipationCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            registry: self.registry.clone(),
            ledger: self.ledger.clone(),
            lock: self.lock.clone(),
            lock_ttl: self.lock_ttl,
        }
    }
}

impl<S: AtomicStore> ParticipationCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_lock_ttl(store, DEFAULT_LOCK_TTL)
    }

    /// The TTL must exceed the critical section's worst-case latency; it is
    /// the only thing freeing the lock if this process dies mid-attempt.
    pub fn with_lock_ttl(store: Arc<S>, lock_ttl: Duration) -> Self {
        Self {
            registry: ParticipantRegistry::new(store.clone()),
            ledger: InventoryLedger::new(store.clone()),
            lock: AdmissionLock::new(store.clone()),
            store,
            lock_ttl,
        }
    }

    /// Attempt to admit `user` to the sale for `product`.
    ///
    /// Every return is a terminal outcome; `Err` means the store itself
    /// failed, in which case no partial mutation is assumed and the dedup
    /// check makes a full retry safe.
    #[instrument(skip_all, fields(user = %user, product = %product))]
    pub async fn participate(
        &self,
        user: &UserId,
        product: &ProductId,
    ) -> Result<ParticipationOutcome, StoreError> {
        // Fast path only: two first-time concurrent requests by the same
        // user can both pass this check. The lock below is the real guard.
        if self.registry.is_member(product, user).await? {
            return Ok(ParticipationOutcome::AlreadyParticipated);
        }

        let token = LockToken::generate();
        if !self.lock.try_acquire(product, &token, self.lock_ttl).await? {
            return Ok(ParticipationOutcome::LockDenied);
        }

        let outcome = self.admit_under_lock(user, product).await;

        // Release runs on every exit path after acquisition; skipping it
        // would starve all other requests for the remainder of the TTL.
        match self.lock.release(product, &token).await {
            Ok(_) => {}
            Err(release_err) if outcome.is_ok() => {
                // The admission stands; the TTL will reclaim the entry.
                warn!(%product, %token, error = %release_err, "lock release failed after attempt");
            }
            // The admission error is the one the caller needs to see.
            Err(_) => {}
        }

        if let Ok(ParticipationOutcome::Admitted { remaining }) = &outcome {
            info!(%user, %product, remaining, "participation admitted");
        }
        outcome
    }

    /// Critical section: runs only while the per-product lock is held.
    async fn admit_under_lock(
        &self,
        user: &UserId,
        product: &ProductId,
    ) -> Result<ParticipationOutcome, StoreError> {
        // Authoritative dedup. The pre-lock check races: two first-time
        // attempts by the same user can both pass it, and only one of them
        // may take a unit. Under the per-product lock this check cannot race.
        if self.registry.is_member(product, user).await? {
            return Ok(ParticipationOutcome::AlreadyParticipated);
        }

        let remaining = self.ledger.decrement(product).await?;
        if remaining < 0 {
            // Overdraft: compensate immediately so the negative value is
            // never observable after this attempt completes.
            self.ledger.increment(product).await?;
            return Ok(ParticipationOutcome::SoldOut);
        }

        self.registry.add(product, user).await?;
        Ok(ParticipationOutcome::Admitted { remaining })
    }

    /// Current stock for `product`; an uninitialized product reads as 0.
    pub async fn available_stock(&self, product: &ProductId) -> Result<i64, StoreError> {
        self.ledger.peek(product).await
    }

    /// Whether `user` has been admitted to `product`.
    pub async fn is_participated(
        &self,
        user: &UserId,
        product: &ProductId,
    ) -> Result<bool, StoreError> {
        self.registry.is_member(product, user).await
    }

    /// Explicit manual unlock for client-initiated cancellation. Only the
    /// attempt that holds `token` can free the entry; anyone else gets
    /// `false`.
    #[instrument(skip_all, fields(product = %product))]
    pub async fn release_lock(
        &self,
        product: &ProductId,
        token: &LockToken,
    ) -> Result<bool, StoreError> {
        self.lock.release(product, token).await
    }

    // === Administrative surface ===

    /// Provision (or overwrite) the stock counter for a sale.
    #[instrument(skip_all, fields(product = %product, quantity))]
    pub async fn initialize_stock(
        &self,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), StoreError> {
        self.store
            .set(&keys::stock_key(product), &quantity.to_string())
            .await?;
        info!(%product, quantity, "stock initialized");
        Ok(())
    }

    /// Clear stock and participants for `product`. After a reset the stock
    /// reads as 0 until the next initialization.
    #[instrument(skip_all, fields(product = %product))]
    pub async fn reset_flash_sale(&self, product: &ProductId) -> Result<(), StoreError> {
        self.store.delete(&keys::stock_key(product)).await?;
        self.store.delete(&keys::participants_key(product)).await?;
        info!(%product, "flash sale reset");
        Ok(())
    }

    /// Number of admitted participants for `product`.
    pub async fn participants_count(&self, product: &ProductId) -> Result<u64, StoreError> {
        self.registry.count(product).await
    }
}
