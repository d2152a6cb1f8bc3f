//! Per-product participant membership.

use std::sync::Arc;

use flashgate_core::keys;
use flashgate_core::{ProductId, UserId};
use flashgate_store::{AtomicStore, StoreError};

/// Set of admitted users per product.
///
/// Membership means "admitted". The set only grows; it is cleared solely by
/// an administrative reset. The membership check is a fast-path optimization
/// for repeat callers and is **never** the sole concurrency guard: two
/// first-time concurrent requests by the same user can both see `false`, and
/// the per-product lock is what keeps them from both being admitted.
#[derive(Debug)]
pub struct ParticipantRegistry<S> {
    store: Arc<S>,
}

impl<S> Clone for ParticipantRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: AtomicStore> ParticipantRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Whether `user` has already been admitted to `product`.
    pub async fn is_member(
        &self,
        product: &ProductId,
        user: &UserId,
    ) -> Result<bool, StoreError> {
        self.store
            .set_contains(&keys::participants_key(product), user.as_str())
            .await
    }

    /// Record `user` as admitted. Set semantics: duplicate adds are harmless.
    pub async fn add(&self, product: &ProductId, user: &UserId) -> Result<(), StoreError> {
        self.store
            .set_add(&keys::participants_key(product), user.as_str())
            .await?;
        Ok(())
    }

    /// Number of admitted users for `product`.
    pub async fn count(&self, product: &ProductId) -> Result<u64, StoreError> {
        self.store.set_size(&keys::participants_key(product)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashgate_store::InMemoryAtomicStore;

    fn product() -> ProductId {
        ProductId::new("p1").unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn membership_starts_empty() {
        let registry = ParticipantRegistry::new(Arc::new(InMemoryAtomicStore::new()));
        assert!(!registry.is_member(&product(), &user("u1")).await.unwrap());
        assert_eq!(registry.count(&product()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let registry = ParticipantRegistry::new(Arc::new(InMemoryAtomicStore::new()));
        registry.add(&product(), &user("u1")).await.unwrap();
        registry.add(&product(), &user("u1")).await.unwrap();

        assert!(registry.is_member(&product(), &user("u1")).await.unwrap());
        assert_eq!(registry.count(&product()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn membership_is_scoped_by_product() {
        let registry = ParticipantRegistry::new(Arc::new(InMemoryAtomicStore::new()));
        let other = ProductId::new("p2").unwrap();
        registry.add(&product(), &user("u1")).await.unwrap();

        assert!(!registry.is_member(&other, &user("u1")).await.unwrap());
        assert_eq!(registry.count(&other).await.unwrap(), 0);
    }
}
