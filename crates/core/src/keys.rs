//! Store key schema.
//!
//! Every entry the core touches lives under the `flashsale:` namespace, keyed
//! by product. Keeping the schema in one place means the store adapters never
//! build keys themselves.

use crate::id::ProductId;

const STOCK_KEY_PREFIX: &str = "flashsale:stock:";
const LOCK_KEY_PREFIX: &str = "flashsale:lock:";
const PARTICIPANT_KEY_PREFIX: &str = "flashsale:participants:";

/// Global advisory sale start time (single key, not per product).
pub const START_TIME_KEY: &str = "flashsale:starttime";

/// Key of the per-product stock counter.
pub fn stock_key(product: &ProductId) -> String {
    format!("{STOCK_KEY_PREFIX}{product}")
}

/// Key of the per-product admission lock entry.
pub fn lock_key(product: &ProductId) -> String {
    format!("{LOCK_KEY_PREFIX}{product}")
}

/// Key of the per-product participant set.
pub fn participants_key(product: &ProductId) -> String {
    format!("{PARTICIPANT_KEY_PREFIX}{product}")
}
