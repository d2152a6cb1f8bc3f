//! In-memory atomic store for tests/dev.
//!
//! - No IO / single process
//! - Honors the same atomicity contract as the networked adapter: every
//!   operation runs under one mutex acquisition, so nothing interleaves
//!   mid-operation
//! - TTLs expire lazily on access, like Redis lazy deletion
//! - `set_offline` injects `StoreError::Unavailable` on every operation, for
//!   exercising failure paths

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::atomic::{AtomicStore, StoreError};

#[derive(Debug, Clone)]
struct ValueEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl ValueEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default)]
struct State {
    values: HashMap<String, ValueEntry>,
    sets: HashMap<String, HashSet<String>>,
}

impl State {
    /// Drop the entry if its TTL has passed, then return the live value.
    fn live_value(&mut self, key: &str, now: Instant) -> Option<&ValueEntry> {
        if self.values.get(key).is_some_and(|e| e.is_expired(now)) {
            self.values.remove(key);
        }
        self.values.get(key)
    }

    fn parse_counter(&mut self, key: &str, now: Instant) -> Result<i64, StoreError> {
        match self.live_value(key, now) {
            None => Ok(0),
            Some(entry) => entry
                .value
                .parse::<i64>()
                .map_err(|e| StoreError::corrupted(key, e.to_string())),
        }
    }
}

/// Mutex-guarded fake of the atomic store.
#[derive(Debug, Default)]
pub struct InMemoryAtomicStore {
    state: Mutex<State>,
    offline: AtomicBool,
}

impl InMemoryAtomicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `StoreError::Unavailable`,
    /// simulating a backend outage.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, State>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("store is offline"));
        }
        self.state
            .lock()
            .map_err(|_| StoreError::unavailable("store mutex poisoned"))
    }
}

#[async_trait]
impl AtomicStore for InMemoryAtomicStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut state = self.guard()?;
        Ok(state.live_value(key, Instant::now()).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut state = self.guard()?;
        state.values.insert(
            key.to_string(),
            ValueEntry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut state = self.guard()?;
        let now = Instant::now();
        if state.live_value(key, now).is_some() {
            return Ok(false);
        }
        state.values.insert(
            key.to_string(),
            ValueEntry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut state = self.guard()?;
        let now = Instant::now();
        let existed = state.live_value(key, now).is_some();
        state.values.remove(key);
        let set_existed = state.sets.remove(key).is_some();
        Ok(existed || set_existed)
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut state = self.guard()?;
        let now = Instant::now();
        let next = state.parse_counter(key, now)? + 1;
        state.values.insert(
            key.to_string(),
            ValueEntry {
                value: next.to_string(),
                expires_at: None,
            },
        );
        Ok(next)
    }

    async fn decrement(&self, key: &str) -> Result<i64, StoreError> {
        let mut state = self.guard()?;
        let now = Instant::now();
        let next = state.parse_counter(key, now)? - 1;
        state.values.insert(
            key.to_string(),
            ValueEntry {
                value: next.to_string(),
                expires_at: None,
            },
        );
        Ok(next)
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        let mut state = self.guard()?;
        let now = Instant::now();
        match state.live_value(key, now) {
            Some(entry) if entry.value == expected => {
                state.values.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let state = self.guard()?;
        Ok(state.sets.get(key).is_some_and(|s| s.contains(member)))
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut state = self.guard()?;
        Ok(state
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_size(&self, key: &str) -> Result<u64, StoreError> {
        let state = self.guard()?;
        Ok(state.sets.get(key).map_or(0, |s| s.len() as u64))
    }
}
