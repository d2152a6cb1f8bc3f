//! Flash-sale admission domain.
//!
//! This crate contains the admission-control rules for a limited-inventory
//! flash sale: no user admitted twice, admissions never exceeding configured
//! inventory, and all coordination flowing through the injected
//! [`AtomicStore`](flashgate_store::AtomicStore) rather than in-process
//! shared state.

pub mod coordinator;
pub mod ledger;
pub mod lock;
pub mod outcome;
pub mod registry;
pub mod schedule;

#[cfg(test)]
mod integration_tests;

pub use coordinator::ParticipationCoordinator;
pub use ledger::InventoryLedger;
pub use lock::{AdmissionLock, DEFAULT_LOCK_TTL};
pub use outcome::{ParticipationOutcome, ParticipationResponse};
pub use registry::ParticipantRegistry;
pub use schedule::SaleSchedule;
