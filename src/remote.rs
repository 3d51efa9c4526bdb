//! Capabilities the counters need from the shared store.
//!
//! A [`RemoteStore`] hands out one [`Remote`] per counter name. Counters only ever
//! talk to their [`Remote`], so any backend offering an atomic increment-by and an
//! atomic reset can sit behind a [`Pool`](crate::Pool).
//!
//! Adapters shipped with this crate:
//!
//! - [`LocalRemoteStore`](crate::LocalRemoteStore): in-process, always available
//! - `RedisRemoteStore`: Redis, behind the `redis-tokio` / `redis-smol` features

use std::sync::Arc;

use async_trait::async_trait;

use crate::{HitpoolError, TtlSeconds};

/// One named counter held by the shared store.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Fully qualified name of the counter in the store.
    fn name(&self) -> &str;

    /// Atomically add `amount` (which may be zero or negative) and return the new total.
    ///
    /// Implementations refresh the counter's expiry, if they support one.
    async fn increment(&self, amount: i64) -> Result<i64, HitpoolError>;

    /// Atomically set the counter to zero and return the previous total.
    async fn reset(&self) -> Result<i64, HitpoolError>;
}

/// Factory binding counter names to [`Remote`] handles.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Bind `name` in the store.
    ///
    /// Fails when the store is unreachable or the name is unusable. `ttl` is an
    /// expiry hint, refreshed by every increment.
    async fn bind(&self, name: &str, ttl: TtlSeconds) -> Result<Arc<dyn Remote>, HitpoolError>;
}
