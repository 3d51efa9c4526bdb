//! Registry of counters keyed by resource.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;

use crate::{
    AdmissionDecision, Counter, CounterKey, HitpoolError, RemoteStore, RemoteTimeoutMs,
    TtlSeconds, runtime,
};

/// Configuration for a [`Pool`].
///
/// # Examples
///
/// ```ignore
/// use hitpool::{CounterKey, PoolOptions, RemoteTimeoutMs, TtlSeconds};
///
/// let options = PoolOptions {
///     prefix: Some(CounterKey::try_from("myapp")?), // remote names: myapp:<key>
///     default_ttl: TtlSeconds::try_from(600)?,
///     remote_timeout_ms: Some(RemoteTimeoutMs::try_from(50)?),
/// };
/// ```
#[derive(Clone, Debug, Default)]
pub struct PoolOptions {
    /// Prefix for remote counter names, which are built as `<prefix>:<key>`.
    ///
    /// If `None`, defaults to `"hitpool"`.
    pub prefix: Option<CounterKey>,

    /// Expiry hint used when [`Pool::touch`] is called without one.
    pub default_ttl: TtlSeconds,

    /// Upper bound on each remote call made by the pool's counters.
    ///
    /// `None` leaves remote calls unbounded; callers can still cancel by dropping
    /// the future.
    pub remote_timeout_ms: Option<RemoteTimeoutMs>,
}

/// Registry mapping resource keys to [`Counter`]s.
///
/// Counters are created lazily by [`touch`](Pool::touch), each bound to the remote
/// counter `<prefix>:<key>`. A key has at most one counter for the lifetime of the
/// pool, and operations on keys without a counter are silent no-ops.
///
/// # Examples
///
/// ```ignore
/// use hitpool::{LocalRemoteStore, Pool, PoolOptions};
///
/// let pool = Pool::new(LocalRemoteStore::new(), PoolOptions::default());
///
/// pool.touch("search", None).await;
/// pool.touch("upload", None).await;
///
/// // Both resources admitted, or neither.
/// let allowed = pool.check_admission([("search", 100), ("upload", 10)]).await?;
/// ```
pub struct Pool {
    store: Arc<dyn RemoteStore>,
    prefix: CounterKey,
    default_ttl: TtlSeconds,
    remote_timeout_ms: Option<RemoteTimeoutMs>,
    counters: DashMap<String, Arc<Counter>>,
    sync_loop_generation: AtomicU64,
}

impl Pool {
    /// Create an empty pool backed by `store`.
    pub fn new<S>(store: S, options: PoolOptions) -> Self
    where
        S: RemoteStore + 'static,
    {
        Self {
            store: Arc::new(store),
            prefix: options.prefix.unwrap_or_else(CounterKey::default_prefix),
            default_ttl: options.default_ttl,
            remote_timeout_ms: options.remote_timeout_ms,
            counters: DashMap::new(),
            sync_loop_generation: AtomicU64::new(0),
        }
    } // end constructor

    /// Prefix of the remote counter names.
    pub fn prefix(&self) -> &CounterKey {
        &self.prefix
    }

    /// Number of registered counters.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether no counter has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Counter registered for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Arc<Counter>> {
        self.counters
            .get(key)
            .map(|counter| Arc::clone(counter.value()))
    }

    /// Local total for `key`, or `0` when no counter is registered.
    pub fn count(&self, key: &str) -> i64 {
        self.get(key).map_or(0, |counter| counter.count())
    }

    /// Counter for `key`, creating and registering it on first touch.
    ///
    /// Returns `None` when the counter cannot be created (empty key, unreachable
    /// store); the failure is logged and the key stays unregistered. See
    /// [`try_touch`](Pool::try_touch) to get the error instead.
    pub async fn touch(&self, key: &str, ttl: Option<TtlSeconds>) -> Option<Arc<Counter>> {
        match self.try_touch(key, ttl).await {
            Ok(counter) => Some(counter),
            Err(err) => {
                tracing::warn!(key, error = ?err, "hitpool.touch.failed, key left unmonitored");
                None
            }
        }
    }

    /// Counter for `key`, creating and registering it on first touch.
    ///
    /// `ttl` is the expiry hint for the remote counter, defaulting to
    /// [`PoolOptions::default_ttl`]; it only applies when the counter is created.
    ///
    /// Concurrent first touches of the same key register exactly one counter: every
    /// caller gets the winner, and the losers' remote bindings are discarded.
    pub async fn try_touch(
        &self,
        key: &str,
        ttl: Option<TtlSeconds>,
    ) -> Result<Arc<Counter>, HitpoolError> {
        if let Some(counter) = self.get(key) {
            return Ok(counter);
        }

        if key.is_empty() {
            return Err(HitpoolError::InvalidCounterKey(
                "resource key must not be empty".to_string(),
            ));
        }

        let remote = self
            .store
            .bind(&self.prefix.qualify(key), ttl.unwrap_or(self.default_ttl))
            .await?;

        let entry = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Counter::new(remote, self.remote_timeout_ms)));

        Ok(Arc::clone(entry.value()))
    } // end method try_touch

    /// Visit registered counters until `f` returns `false`.
    ///
    /// Iterates over a snapshot, so `f` may touch new keys.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &Arc<Counter>) -> bool,
    {
        let snapshot: Vec<(String, Arc<Counter>)> = self
            .counters
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        for (key, counter) in &snapshot {
            if !f(key, counter) {
                return;
            }
        }
    }

    /// Record one hit on every registered key in `keys`. Unregistered keys are ignored.
    pub fn record_hits<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        for key in keys {
            if let Some(counter) = self.counters.get(key.as_ref()) {
                counter.hit();
            }
        }
    }

    /// All-or-nothing admission of one hit across several resources.
    ///
    /// Each `(key, limit)` pair is checked with [`Counter::limit_check`], in iteration
    /// order. Keys without a registered counter are skipped, so their limit is not
    /// enforced.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: every participating key admitted the hit
    /// - `Ok(false)`: a key rejected; hits admitted earlier in this call are rolled back
    /// - `Err(_)`: a key reached its limit and failed to reconcile; hits admitted
    ///   earlier in this call are rolled back and the error is returned
    ///
    /// Rollback is local only. If an earlier key reconciled with the store during this
    /// call, that remote increment stays even though the batch is not admitted.
    pub async fn check_admission<I, K>(&self, limits: I) -> Result<bool, HitpoolError>
    where
        I: IntoIterator<Item = (K, i64)>,
        K: AsRef<str>,
    {
        let mut admitted: Vec<Arc<Counter>> = Vec::new();

        for (key, limit) in limits {
            let key = key.as_ref();
            let Some(counter) = self.get(key) else {
                continue;
            };

            match counter.limit_check(limit).await {
                AdmissionDecision::Allowed => admitted.push(counter),
                AdmissionDecision::Rejected => {
                    Self::roll_back(key, &admitted);
                    return Ok(false);
                }
                AdmissionDecision::AllowedUnsynced { error } => {
                    Self::roll_back(key, &admitted);
                    return Err(error);
                }
            }
        }

        Ok(true)
    } // end method check_admission

    fn roll_back(failed_key: &str, admitted: &[Arc<Counter>]) {
        if admitted.is_empty() {
            return;
        }

        tracing::debug!(
            failed_key,
            rolled_back = admitted.len(),
            "hitpool.admission.rollback"
        );

        for counter in admitted {
            counter.rollback_one();
        }
    }

    /// Reconcile every registered counter with the store.
    ///
    /// All counters are attempted. Each failure is logged and the last one is returned.
    pub async fn sync_all(&self) -> Result<(), HitpoolError> {
        let counters: Vec<Arc<Counter>> = self
            .counters
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let results = futures::future::join_all(counters.iter().map(|counter| counter.sync())).await;

        let mut last_error = None;
        for (counter, result) in counters.iter().zip(results) {
            if let Err(err) = result {
                tracing::warn!(counter = counter.name(), error = ?err, "hitpool.sync.failed");
                last_error = Some(err);
            }
        }

        match last_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    } // end method sync_all

    /// Reconcile all counters every `period` in a background task.
    ///
    /// Without it, a counter only reconciles when a check lands on its limit, so
    /// counters far below their limits never learn about other instances' hits.
    ///
    /// The task holds a weak reference and ends when the pool is dropped. Calling
    /// this again replaces the running loop. Must be called within a runtime.
    pub fn run_sync_loop(self: &Arc<Self>, period: Duration) {
        let generation = self.sync_loop_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let pool = Arc::downgrade(self);

        runtime::spawn_task(async move {
            let mut interval = runtime::new_interval(period);

            // Tokio's interval ticks immediately on first await; discard that so the
            // first sync happens after `period`.
            #[cfg(feature = "tokio")]
            runtime::tick(&mut interval).await;

            loop {
                runtime::tick(&mut interval).await;

                let Some(pool) = pool.upgrade() else {
                    break;
                };

                if pool.sync_loop_generation.load(Ordering::Acquire) != generation {
                    break;
                }

                if let Err(err) = pool.sync_all().await {
                    tracing::error!(error = ?err, "hitpool.sync_loop.error, reconciliation pass failed");
                }
            }
        });
    } // end method run_sync_loop

    /// Stop the loop started by [`run_sync_loop`](Pool::run_sync_loop), after its
    /// current pass.
    pub fn stop_sync_loop(&self) {
        self.sync_loop_generation.fetch_add(1, Ordering::AcqRel);
    }
}
