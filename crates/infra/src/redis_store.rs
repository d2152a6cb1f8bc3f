//! Redis-backed atomic store.
//!
//! Maps each [`AtomicStore`] primitive to a single Redis command:
//!
//! - get/set → `GET` / `SET`
//! - set-if-absent with TTL → `SET key value NX EX secs` (lock acquire)
//! - atomic counters → `INCR` / `DECR`
//! - compare-and-delete → a Lua script, so check and delete execute as one
//!   server-side operation (lock release)
//! - set membership → `SISMEMBER` / `SADD` / `SCARD`
//!
//! All commands run on a multiplexed connection shared across tasks; Redis's
//! single-threaded command execution is what makes each of these indivisible.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::instrument;

use flashgate_store::{AtomicStore, StoreError};

/// Check-then-delete as one server-side operation. Deleting only when the
/// stored value matches keeps a stale holder from removing a lock that was
/// re-acquired after TTL expiry.
const COMPARE_AND_DELETE_SCRIPT: &str =
    "if redis.call('get', KEYS[1]) == ARGV[1] then return redis.call('del', KEYS[1]) else return 0 end";

#[derive(Clone)]
pub struct RedisAtomicStore {
    conn: MultiplexedConnection,
    compare_and_delete: Arc<redis::Script>,
}

impl RedisAtomicStore {
    /// Connect and verify the server answers a `PING`.
    pub async fn connect(url: impl AsRef<str>) -> Result<Self, StoreError> {
        let client = redis::Client::open(url.as_ref()).map_err(map_redis_err)?;
        let mut conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(map_redis_err)?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;

        Ok(Self {
            conn,
            compare_and_delete: Arc::new(redis::Script::new(COMPARE_AND_DELETE_SCRIPT)),
        })
    }

    fn conn(&self) -> MultiplexedConnection {
        // Multiplexed connections are designed to be cloned per operation.
        self.conn.clone()
    }
}

fn map_redis_err(e: redis::RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout()
    {
        StoreError::unavailable(e.to_string())
    } else {
        StoreError::command(e.to_string())
    }
}

#[async_trait]
impl AtomicStore for RedisAtomicStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(map_redis_err)
    }

    #[instrument(skip(self, value), err)]
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        // EX takes whole seconds; round sub-second TTLs up to 1.
        let secs = ttl.as_secs().max(1);
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(secs)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        let removed: u64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(removed > 0)
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn();
        redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)
    }

    async fn decrement(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn();
        redis::cmd("DECR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)
    }

    #[instrument(skip(self, expected), err)]
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        let deleted: i64 = self
            .compare_and_delete
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(deleted == 1)
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        redis::cmd("SISMEMBER")
            .arg(key)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        let added: i64 = redis::cmd("SADD")
            .arg(key)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(added > 0)
    }

    async fn set_size(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn();
        redis::cmd("SCARD")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)
    }
}
