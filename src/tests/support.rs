use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::oneshot;

use crate::{
    Counter, HitpoolError, LocalRemoteStore, Remote, RemoteStore, RemoteTimeoutMs, TtlSeconds,
};

/// Remote whose calls never complete.
pub(super) struct StalledRemote;

#[async_trait]
impl Remote for StalledRemote {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn increment(&self, _amount: i64) -> Result<i64, HitpoolError> {
        futures::future::pending().await
    }

    async fn reset(&self) -> Result<i64, HitpoolError> {
        futures::future::pending().await
    }
}

/// Store binding every name to a [`StalledRemote`].
pub(super) struct StalledStore;

#[async_trait]
impl RemoteStore for StalledStore {
    async fn bind(&self, _name: &str, _ttl: TtlSeconds) -> Result<Arc<dyn Remote>, HitpoolError> {
        Ok(Arc::new(StalledRemote))
    }
}

pub(super) async fn local_counter(store: &LocalRemoteStore, name: &str) -> Counter {
    let remote = store.bind(name, TtlSeconds::default()).await.unwrap();
    Counter::new(remote, None)
}

pub(super) fn stalled_counter(remote_timeout_ms: Option<u64>) -> Counter {
    Counter::new(
        Arc::new(StalledRemote),
        remote_timeout_ms.map(|ms| RemoteTimeoutMs::try_from(ms).unwrap()),
    )
}

/// Remote whose next increment waits until the armed gate is released.
pub(super) struct GatedRemote {
    inner: Arc<dyn Remote>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl GatedRemote {
    pub(super) fn new(inner: Arc<dyn Remote>) -> Self {
        Self {
            inner,
            gate: Mutex::new(None),
        }
    }

    /// Hold the next increment until the returned sender fires.
    pub(super) fn arm(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }
}

#[async_trait]
impl Remote for GatedRemote {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn increment(&self, amount: i64) -> Result<i64, HitpoolError> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.inner.increment(amount).await
    }

    async fn reset(&self) -> Result<i64, HitpoolError> {
        self.inner.reset().await
    }
}
