//! Executor glue for tests, matching whichever runtime the crate is built with.

use std::{future::Future, time::Duration};

/// Drive `fut` to completion on a fresh single-threaded executor.
///
/// Tasks spawned by the crate (the sync loop) run on the same executor while
/// `fut` is waiting.
pub(super) fn block_on<F: Future>(fut: F) -> F::Output {
    #[cfg(feature = "tokio")]
    {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .enable_io()
            .build()
            .unwrap()
            .block_on(fut)
    }

    #[cfg(all(feature = "smol", not(feature = "tokio")))]
    {
        smol::block_on(fut)
    }
}

pub(super) async fn sleep(period: Duration) {
    #[cfg(feature = "tokio")]
    tokio::time::sleep(period).await;

    #[cfg(all(feature = "smol", not(feature = "tokio")))]
    smol::Timer::after(period).await;
}
