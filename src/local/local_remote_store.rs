use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::{HitpoolError, Remote, RemoteStore, TtlSeconds};

struct LocalTotal {
    value: i64,
    expires_at: Instant,
}

impl LocalTotal {
    fn current(&self, now: Instant) -> i64 {
        if self.expires_at <= now { 0 } else { self.value }
    }
}

#[derive(Default)]
struct LocalRemoteState {
    totals: DashMap<Arc<str>, LocalTotal>,
    unavailable: AtomicBool,
    increment_calls: AtomicU64,
}

impl LocalRemoteState {
    fn ensure_available(&self) -> Result<(), HitpoolError> {
        if self.unavailable.load(Ordering::Acquire) {
            Err(HitpoolError::RemoteUnavailable(
                "local store is marked unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// In-process shared counter store.
///
/// Every clone shares the same totals, so several [`Pool`](crate::Pool)s built on
/// clones of one store behave like independent instances sharing one remote store.
///
/// # Key Characteristics
///
/// - **Atomic per call:** increments and resets hold the entry's shard lock
/// - **Expiry:** a counter not incremented for its TTL restarts from `0`
/// - **Outage simulation:** [`set_unavailable`](LocalRemoteStore::set_unavailable)
///   makes every call fail with [`HitpoolError::RemoteUnavailable`]
/// - **Process-scoped:** nothing is shared across processes
#[derive(Clone, Default)]
pub struct LocalRemoteStore {
    state: Arc<LocalRemoteState>,
}

impl LocalRemoteStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current total of `name`, `0` when absent or expired.
    pub fn total(&self, name: &str) -> i64 {
        self.state
            .totals
            .get(name)
            .map_or(0, |total| total.current(Instant::now()))
    }

    /// Number of increment calls received, failed ones included.
    pub fn increment_calls(&self) -> u64 {
        self.state.increment_calls.load(Ordering::Relaxed)
    }

    /// Simulate an outage: while set, binds, increments and resets fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::Release);
    }

    /// Drop expired counters.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.state.totals.retain(|_, total| total.expires_at > now);
    }
}

#[async_trait]
impl RemoteStore for LocalRemoteStore {
    async fn bind(&self, name: &str, ttl: TtlSeconds) -> Result<Arc<dyn Remote>, HitpoolError> {
        self.state.ensure_available()?;

        if name.is_empty() {
            return Err(HitpoolError::InvalidCounterKey(
                "remote name must not be empty".to_string(),
            ));
        }

        Ok(Arc::new(LocalRemote {
            name: Arc::from(name),
            ttl: ttl.as_duration(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct LocalRemote {
    name: Arc<str>,
    ttl: Duration,
    state: Arc<LocalRemoteState>,
}

#[async_trait]
impl Remote for LocalRemote {
    fn name(&self) -> &str {
        &self.name
    }

    async fn increment(&self, amount: i64) -> Result<i64, HitpoolError> {
        self.state.increment_calls.fetch_add(1, Ordering::Relaxed);
        self.state.ensure_available()?;

        let now = Instant::now();
        let mut total = self
            .state
            .totals
            .entry(Arc::clone(&self.name))
            .or_insert(LocalTotal {
                value: 0,
                expires_at: now,
            });

        total.value = total.current(now).saturating_add(amount);
        total.expires_at = now + self.ttl;

        Ok(total.value)
    }

    async fn reset(&self) -> Result<i64, HitpoolError> {
        self.state.ensure_available()?;

        let now = Instant::now();
        let previous = match self.state.totals.get_mut(&self.name) {
            Some(mut total) => {
                let previous = total.current(now);
                total.value = 0;
                previous
            }
            None => 0,
        };

        Ok(previous)
    }
}
