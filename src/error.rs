/// Error type for this crate.
#[derive(Debug, thiserror::Error)]
pub enum HitpoolError {
    /// Redis error.
    #[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
    #[error("redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    /// Empty resource key or invalid counter name prefix.
    #[error("invalid counter key: {0}")]
    InvalidCounterKey(String),

    /// Invalid time-to-live hint.
    #[error("invalid ttl: {0}")]
    InvalidTtlSeconds(String),

    /// Invalid remote call timeout.
    #[error("invalid remote timeout: {0}")]
    InvalidRemoteTimeoutMs(String),

    /// Invalid number of Redis connections.
    #[error("invalid redis client connection count: {0}")]
    InvalidRedisClientConnectionCount(String),

    /// The remote store could not be reached.
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote call did not complete within the configured timeout.
    #[error("remote call timed out after {0}ms")]
    RemoteTimeout(u64),
}
