use std::{
    cmp::Ordering as CmpOrdering,
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};

use futures::lock::Mutex;

use crate::{AdmissionDecision, HitpoolError, Remote, RemoteTimeoutMs, runtime};

/// Local approximation of one shared remote counter.
///
/// Hits are absorbed locally and merged into the remote total lazily. The remote
/// store is contacted only when [`sync`](Counter::sync) or [`reset`](Counter::reset)
/// is called, or when [`limit_check`](Counter::limit_check) lands exactly on its limit.
///
/// # State
///
/// - `local_total`: best local estimate of the global total, bumped by every hit
/// - `synced_baseline`: the remote total returned by the last successful sync
///
/// `local_total - synced_baseline` is the number of hits recorded here and not yet
/// pushed to the store.
///
/// # Semantics & Limitations
///
/// **Approximate across instances:**
/// - The local view may be stale by up to one reconciliation interval
/// - Several instances can cross the same limit at the same time, each believing
///   it is the one crossing it
/// - This overshoot is bounded and **expected**, not a bug
///
/// **Amortized round trips:**
/// - Admissions far below the limit never leave the process
/// - One remote call per boundary crossing, i.e. roughly once per `limit` admitted hits
///
/// # Thread Safety
///
/// Counts are plain atomics, so hits and checks never block. Reconciliations of the
/// same counter are serialized so one delta is never pushed twice.
pub struct Counter {
    remote: Arc<dyn Remote>,
    remote_timeout_ms: Option<RemoteTimeoutMs>,
    local_total: AtomicI64,
    synced_baseline: AtomicI64,
    sync_lock: Mutex<()>,
}

impl Counter {
    /// Create an empty counter reconciling against `remote`.
    ///
    /// With `remote_timeout_ms` set, every remote call made by this counter fails
    /// with [`HitpoolError::RemoteTimeout`] once the timeout elapses.
    pub fn new(remote: Arc<dyn Remote>, remote_timeout_ms: Option<RemoteTimeoutMs>) -> Self {
        Self {
            remote,
            remote_timeout_ms,
            local_total: AtomicI64::new(0),
            synced_baseline: AtomicI64::new(0),
            sync_lock: Mutex::new(()),
        }
    } // end constructor

    /// Name of the remote counter this instance reconciles against.
    pub fn name(&self) -> &str {
        self.remote.name()
    }

    /// Current local estimate of the global total. Never contacts the store.
    pub fn count(&self) -> i64 {
        self.local_total.load(Ordering::Relaxed)
    }

    /// Remote total observed by the last successful reconciliation.
    pub fn synced_baseline(&self) -> i64 {
        self.synced_baseline.load(Ordering::Acquire)
    }

    /// Hits recorded locally and not yet merged into the remote total.
    pub fn pending(&self) -> i64 {
        self.count().wrapping_sub(self.synced_baseline())
    }

    /// Record one hit locally.
    pub fn hit(&self) {
        self.local_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Undo one speculative hit recorded by [`limit_check`](Counter::limit_check).
    ///
    /// Local only. Remote increments already pushed by a sync are not reverted.
    pub fn rollback_one(&self) {
        self.local_total.fetch_sub(1, Ordering::Relaxed);
    }

    /// Clear the local state and ask the store to reset the shared counter.
    ///
    /// Returns `(previous_synced_baseline, previous_local_total)`.
    ///
    /// The remote reset is best-effort: a failure is logged and not returned. The two
    /// halves are not transactional with each other, nor with hits or syncs running
    /// concurrently on this counter.
    ///
    /// A sync in flight when the reset lands still applies
    /// `remote_total - observed_local_total` to the cleared counter, so the local
    /// total can go negative until the next reconciliation.
    pub async fn reset(&self) -> (i64, i64) {
        let previous_local_total = self.local_total.swap(0, Ordering::AcqRel);
        let previous_synced_baseline = self.synced_baseline.swap(0, Ordering::AcqRel);

        if let Err(err) = self.call_remote(self.remote.reset()).await {
            tracing::warn!(
                counter = self.name(),
                error = ?err,
                "hitpool.reset.remote_failed, local state cleared but remote reset failed"
            );
        }

        (previous_synced_baseline, previous_local_total)
    } // end method reset

    /// Push unmerged local hits to the store and adopt its total.
    ///
    /// Sends `local_total - synced_baseline` as an increment. On success the remote
    /// total becomes authoritative: hits merged by other instances since the last
    /// reconciliation are folded into the local view, and the remote total becomes
    /// the new baseline. Hits recorded while the call was in flight stay pending.
    ///
    /// On failure, timeout, or cancellation (dropping the future) local state is left
    /// exactly as it was, so the delta is retried by the next sync.
    pub async fn sync(&self) -> Result<i64, HitpoolError> {
        let _guard = self.sync_lock.lock().await;

        let local_total = self.local_total.load(Ordering::Acquire);
        let synced_baseline = self.synced_baseline.load(Ordering::Acquire);

        let remote_total = self
            .call_remote(self.remote.increment(local_total.wrapping_sub(synced_baseline)))
            .await?;

        self.local_total
            .fetch_add(remote_total.wrapping_sub(local_total), Ordering::AcqRel);
        self.synced_baseline.store(remote_total, Ordering::Release);

        Ok(remote_total)
    } // end method sync

    /// Admission check against `limit`, counting the hit when admitted.
    ///
    /// # Behavior
    ///
    /// 1. If the local total is already at or above `limit`, reject without any change
    /// 2. Otherwise speculatively count the hit, then compare the new total to `limit`:
    ///    - below: admit (purely local, the steady state)
    ///    - above: a concurrent hit won the race; undo and reject
    ///    - equal: this hit reached the boundary; reconcile with the store and admit.
    ///      If the reconciliation fails the hit stays admitted and the error is
    ///      returned in [`AdmissionDecision::AllowedUnsynced`]
    ///
    /// A rejection never changes the local total.
    pub async fn limit_check(&self, limit: i64) -> AdmissionDecision {
        if self.local_total.load(Ordering::Acquire) >= limit {
            return AdmissionDecision::Rejected;
        }

        let observed = self.local_total.fetch_add(1, Ordering::AcqRel).wrapping_add(1);

        match observed.cmp(&limit) {
            CmpOrdering::Less => AdmissionDecision::Allowed,
            CmpOrdering::Greater => {
                self.rollback_one();
                AdmissionDecision::Rejected
            }
            CmpOrdering::Equal => match self.sync().await {
                Ok(_) => AdmissionDecision::Allowed,
                Err(error) => {
                    tracing::warn!(
                        counter = self.name(),
                        limit,
                        error = ?error,
                        "hitpool.limit.sync_failed, admitting at boundary without reconciliation"
                    );
                    AdmissionDecision::AllowedUnsynced { error }
                }
            },
        }
    } // end method limit_check

    async fn call_remote<F>(&self, fut: F) -> Result<i64, HitpoolError>
    where
        F: Future<Output = Result<i64, HitpoolError>>,
    {
        let Some(remote_timeout_ms) = self.remote_timeout_ms else {
            return fut.await;
        };

        match runtime::timeout(remote_timeout_ms.as_duration(), fut).await {
            Some(result) => result,
            None => Err(HitpoolError::RemoteTimeout(*remote_timeout_ms)),
        }
    }
} // end of impl

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter")
            .field("name", &self.name())
            .field("local_total", &self.count())
            .field("synced_baseline", &self.synced_baseline())
            .finish()
    }
}
