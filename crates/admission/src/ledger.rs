//! Atomic stock depletion with compensating rollback.

use std::sync::Arc;

use flashgate_core::ProductId;
use flashgate_core::keys;
use flashgate_store::{AtomicStore, StoreError};

/// Per-product stock counter.
///
/// Depletion is a single indivisible subtract against the store; the caller
/// inspects the **result**, not a prior read. A decrement that lands below
/// zero must be answered by an immediate [`increment`](Self::increment) so a
/// negative value is never observable once the attempt completes.
#[derive(Debug)]
pub struct InventoryLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for InventoryLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: AtomicStore> InventoryLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Atomically take one unit. Returns the stock remaining after the
    /// subtract; a negative result means the take overdrew and must be
    /// compensated.
    pub async fn decrement(&self, product: &ProductId) -> Result<i64, StoreError> {
        self.store.decrement(&keys::stock_key(product)).await
    }

    /// Compensating rollback of an overdraft. Not a general restock
    /// operation: it exists solely to undo a decrement that went below zero.
    pub async fn increment(&self, product: &ProductId) -> Result<i64, StoreError> {
        self.store.increment(&keys::stock_key(product)).await
    }

    /// Non-mutating stock read; an unset counter reads as 0.
    pub async fn peek(&self, product: &ProductId) -> Result<i64, StoreError> {
        let key = keys::stock_key(product);
        match self.store.get(&key).await? {
            None => Ok(0),
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|e| StoreError::corrupted(key, e.to_string())),
        }
    }
}
