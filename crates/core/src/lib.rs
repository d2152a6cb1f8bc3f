//! `flashgate-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no IO, no store access):
//! typed identifiers, the store key schema, and the domain error model.

pub mod error;
pub mod id;
pub mod keys;

pub use error::{DomainError, DomainResult};
pub use id::{LockToken, ProductId, UserId};
