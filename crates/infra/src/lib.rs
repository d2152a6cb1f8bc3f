//! Infrastructure layer: networked store adapter, configuration.

pub mod config;

#[cfg(feature = "redis")]
pub mod redis_store;

pub use config::StoreConfig;

#[cfg(feature = "redis")]
pub use redis_store::RedisAtomicStore;
