use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use redis::{Client, Script, aio::ConnectionManager};

use crate::{HitpoolError, Remote, RemoteStore, TtlSeconds};

const INCREMENT_SCRIPT: &str = r#"
    local counter_key = KEYS[1]

    local amount = tonumber(ARGV[1])
    local ttl_seconds = tonumber(ARGV[2])

    local total = redis.call("INCRBY", counter_key, amount)
    redis.call("EXPIRE", counter_key, ttl_seconds)

    return total
"#;

const RESET_SCRIPT: &str = r#"
    local counter_key = KEYS[1]

    local ttl_seconds = tonumber(ARGV[1])

    local previous = tonumber(redis.call("GETSET", counter_key, 0)) or 0
    redis.call("EXPIRE", counter_key, ttl_seconds)

    return previous
"#;

/// Redis-backed [`RemoteStore`].
///
/// Each counter is a plain Redis integer under its qualified name.
///
/// # Requirements
///
/// - **Redis:** any version with Lua scripting
/// - **Runtime:** Tokio or Smol (via `redis-tokio` or `redis-smol` features)
///
/// # Semantics
///
/// - **Increment:** `INCRBY` then `EXPIRE <ttl>`, atomically in one Lua script
/// - **Reset:** `GETSET <name> 0` then `EXPIRE <ttl>`, atomically in one Lua script
/// - **Bind:** issues `PING`, so an unreachable server fails counter creation
/// - **Connections:** each bound counter keeps one connection manager, picked
///   round-robin at bind time, so counters spread over the store's connections
///
/// # Examples
///
/// ```ignore
/// use hitpool::{Pool, PoolOptions};
/// use hitpool::redis::RedisRemoteStore;
///
/// let client = redis::Client::open("redis://127.0.0.1:6379/")?;
/// let store = RedisRemoteStore::connect(&client, 4).await?;
///
/// let pool = Pool::new(store, PoolOptions::default());
/// ```
#[derive(Clone)]
pub struct RedisRemoteStore {
    connections: Arc<[ConnectionManager]>,
    round_robin: Arc<AtomicUsize>,
    increment_script: Script,
    reset_script: Script,
}

impl std::fmt::Debug for RedisRemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `ConnectionManager` does not implement `Debug`.
        f.debug_struct("RedisRemoteStore")
            .field("connections", &self.connections.len())
            .field("round_robin", &self.round_robin)
            .field("increment_script", &self.increment_script)
            .field("reset_script", &self.reset_script)
            .finish()
    }
}

impl RedisRemoteStore {
    /// Open `connection_count` connection managers on `client`.
    ///
    /// Fails with [`HitpoolError::InvalidRedisClientConnectionCount`] when
    /// `connection_count` is 0, before any connection is attempted.
    pub async fn connect(client: &Client, connection_count: usize) -> Result<Self, HitpoolError> {
        if connection_count == 0 {
            return Err(HitpoolError::InvalidRedisClientConnectionCount(
                "connection count must be > 0".to_string(),
            ));
        }

        let connections = futures::future::try_join_all(
            (0..connection_count).map(|_| client.get_connection_manager()),
        )
        .await?;

        Ok(Self::with_connections(connections))
    } // end method connect

    /// Create a store sharing one existing connection manager.
    pub fn from_connection_manager(connection_manager: ConnectionManager) -> Self {
        Self::with_connections(vec![connection_manager])
    }

    fn with_connections(connections: Vec<ConnectionManager>) -> Self {
        Self {
            connections: Arc::from(connections),
            round_robin: Arc::new(AtomicUsize::new(0)),
            increment_script: Script::new(INCREMENT_SCRIPT),
            reset_script: Script::new(RESET_SCRIPT),
        }
    }

    /// Number of connection managers counters are spread over.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn next_connection(&self) -> ConnectionManager {
        let index = self.round_robin.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        self.connections[index].clone()
    }
}

#[async_trait]
impl RemoteStore for RedisRemoteStore {
    async fn bind(&self, name: &str, ttl: TtlSeconds) -> Result<Arc<dyn Remote>, HitpoolError> {
        if name.is_empty() {
            return Err(HitpoolError::InvalidCounterKey(
                "redis key must not be empty".to_string(),
            ));
        }

        let mut connection_manager = self.next_connection();

        let _: String = redis::cmd("PING")
            .query_async(&mut connection_manager)
            .await?;

        Ok(Arc::new(RedisRemote {
            name: Arc::from(name),
            ttl,
            connection_manager,
            increment_script: self.increment_script.clone(),
            reset_script: self.reset_script.clone(),
        }))
    }
}

struct RedisRemote {
    name: Arc<str>,
    ttl: TtlSeconds,
    connection_manager: ConnectionManager,
    increment_script: Script,
    reset_script: Script,
}

#[async_trait]
impl Remote for RedisRemote {
    fn name(&self) -> &str {
        &self.name
    }

    async fn increment(&self, amount: i64) -> Result<i64, HitpoolError> {
        let mut connection_manager = self.connection_manager.clone();

        let total: i64 = self
            .increment_script
            .key(&*self.name)
            .arg(amount)
            .arg(*self.ttl)
            .invoke_async(&mut connection_manager)
            .await?;

        Ok(total)
    } // end method increment

    async fn reset(&self) -> Result<i64, HitpoolError> {
        let mut connection_manager = self.connection_manager.clone();

        let previous: i64 = self
            .reset_script
            .key(&*self.name)
            .arg(*self.ttl)
            .invoke_async(&mut connection_manager)
            .await?;

        Ok(previous)
    } // end method reset
}
