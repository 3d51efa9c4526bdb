use std::{future::Future, time::Duration};

#[cfg(not(any(feature = "tokio", feature = "smol")))]
compile_error!("hitpool needs an async runtime: enable the `tokio` or the `smol` feature");

#[cfg(feature = "tokio")]
pub(crate) type Interval = tokio::time::Interval;

#[cfg(all(feature = "smol", not(feature = "tokio")))]
pub(crate) type Interval = smol::Timer;

#[cfg(feature = "tokio")]
pub(crate) fn new_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval
}

#[cfg(all(feature = "smol", not(feature = "tokio")))]
pub(crate) fn new_interval(period: Duration) -> Interval {
    smol::Timer::interval(period)
}

#[cfg(feature = "tokio")]
pub(crate) fn spawn_task<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(fut);
}

#[cfg(all(feature = "smol", not(feature = "tokio")))]
pub(crate) fn spawn_task<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    smol::spawn(fut).detach();
}

#[cfg(feature = "tokio")]
pub(crate) async fn tick(interval: &mut Interval) {
    interval.tick().await;
}

#[cfg(all(feature = "smol", not(feature = "tokio")))]
pub(crate) async fn tick(interval: &mut Interval) {
    use futures::StreamExt;
    interval.next().await;
}

/// Resolves to `None` when `fut` does not complete within `limit`. The inner
/// future is dropped in that case.
#[cfg(feature = "tokio")]
pub(crate) async fn timeout<F>(limit: Duration, fut: F) -> Option<F::Output>
where
    F: Future,
{
    tokio::time::timeout(limit, fut).await.ok()
}

#[cfg(all(feature = "smol", not(feature = "tokio")))]
pub(crate) async fn timeout<F>(limit: Duration, fut: F) -> Option<F::Output>
where
    F: Future,
{
    let timer = smol::Timer::after(limit);

    futures::pin_mut!(fut);

    match futures::future::select(fut, timer).await {
        futures::future::Either::Left((output, _timer)) => Some(output),
        futures::future::Either::Right((_instant, _fut)) => None,
    }
}
