//! Advisory sale start time.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use flashgate_core::keys::START_TIME_KEY;
use flashgate_store::{AtomicStore, StoreError};
use tracing::{info, warn};

/// Global sale start timestamp.
///
/// Purely advisory metadata for the service layer: the admission core does
/// **not** gate `participate` on it. When no value has been set, reads fall
/// back to a computed default of one hour from now.
#[derive(Debug)]
pub struct SaleSchedule<S> {
    store: Arc<S>,
}

impl<S> Clone for SaleSchedule<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: AtomicStore> SaleSchedule<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Set the advertised start time (stored as RFC 3339).
    pub async fn set_start_time(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.store.set(START_TIME_KEY, &at.to_rfc3339()).await?;
        info!(start_time = %at, "sale start time set");
        Ok(())
    }

    /// The advertised start time, or one hour from now if unset. A stored
    /// value that fails to parse is corruption, not a reason to fall back.
    pub async fn start_time(&self) -> Result<DateTime<Utc>, StoreError> {
        match self.store.get(START_TIME_KEY).await? {
            None => {
                warn!("sale start time not set, returning default of one hour from now");
                Ok(Utc::now() + Duration::hours(1))
            }
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| StoreError::corrupted(START_TIME_KEY, e.to_string())),
        }
    }
}
