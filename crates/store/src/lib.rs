//! `flashgate-store` — the atomic store capability.
//!
//! The external key-value store is the **sole** coordination substrate of the
//! admission core: there is no in-process shared mutable state. This crate
//! defines the minimal primitive set the core requires ([`AtomicStore`]), an
//! in-memory implementation for tests and development, and a bounded
//! compare-and-swap adapter for backends lacking a native atomic counter.

pub mod atomic;
pub mod cas;
pub mod in_memory;

pub use atomic::{AtomicStore, StoreError};
pub use cas::{CasCounterStore, CompareAndSwap};
pub use in_memory::InMemoryAtomicStore;
