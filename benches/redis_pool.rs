use criterion::{Criterion, criterion_group, criterion_main};

#[cfg(feature = "redis-tokio")]
mod enabled {
    use std::{env, hint::black_box, time::Duration};

    use criterion::Criterion;

    use hitpool::redis::RedisRemoteStore;
    use hitpool::{CounterKey, Pool, PoolOptions};

    fn redis_url() -> String {
        env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:16379/".to_string())
    }

    pub fn bench_sync(c: &mut Criterion) {
        let mut group = c.benchmark_group("redis_pool");
        group.sample_size(50);

        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(2)
            .build()
            .unwrap();

        let pool = rt.block_on(async {
            let client = redis::Client::open(redis_url()).unwrap();
            let store = RedisRemoteStore::connect(&client, 1).await.unwrap();

            let pool = Pool::new(
                store,
                PoolOptions {
                    prefix: Some(CounterKey::try_from("bench").unwrap()),
                    ..PoolOptions::default()
                },
            );
            pool.touch("user_1", None).await.unwrap();
            pool
        });

        let counter = pool.get("user_1").unwrap();

        // Ensure connection is warm.
        rt.block_on(async {
            let _ = counter.sync().await.unwrap();
        });

        group.bench_function("sync/hot_key", |b| {
            b.iter(|| {
                counter.hit();
                let _ = rt.block_on(async { black_box(counter.sync().await) });
            });
        });

        group.bench_function("limit_check/boundary", |b| {
            b.iter(|| {
                let _ = rt.block_on(async {
                    // Every call lands on the limit and reconciles.
                    let limit = counter.count() + 1;
                    black_box(counter.limit_check(black_box(limit)).await)
                });
            });
        });

        // Give outstanding IO a moment before runtime drop.
        std::thread::sleep(Duration::from_millis(50));
        group.finish();
    }
}

#[cfg(feature = "redis-tokio")]
fn bench_sync(c: &mut Criterion) {
    enabled::bench_sync(c)
}

#[cfg(not(feature = "redis-tokio"))]
fn bench_sync(_: &mut Criterion) {}

criterion_group!(benches, bench_sync);
criterion_main!(benches);
