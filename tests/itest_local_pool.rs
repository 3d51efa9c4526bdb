use std::sync::Arc;

use hitpool::{AdmissionDecision, LocalRemoteStore, Pool, PoolOptions};

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Runtime::new().unwrap().block_on(f)
}

#[test]
fn batched_admission_across_resources() {
    block_on(async {
        let pool = Pool::new(LocalRemoteStore::new(), PoolOptions::default());

        pool.touch("search", None).await.unwrap();
        pool.touch("upload", None).await.unwrap();

        for _ in 0..2 {
            assert!(
                pool.check_admission([("search", 100), ("upload", 2)])
                    .await
                    .unwrap()
            );
        }

        // "upload" is full, so "search" is not charged either.
        assert!(
            !pool
                .check_admission([("search", 100), ("upload", 2)])
                .await
                .unwrap()
        );
        assert_eq!(pool.count("search"), 2);
        assert_eq!(pool.count("upload"), 2);
    });
}

#[test]
fn instances_share_limits_through_one_store() {
    block_on(async {
        let store = LocalRemoteStore::new();
        let instances: Vec<Arc<Pool>> = (0..3)
            .map(|_| Arc::new(Pool::new(store.clone(), PoolOptions::default())))
            .collect();

        for pool in &instances {
            pool.touch("k", None).await.unwrap();
        }

        let limit = 10;
        let mut allowed = 0;
        for round in 0..20 {
            let pool = &instances[round % instances.len()];
            let counter = pool.get("k").unwrap();
            if counter.limit_check(limit).await.is_allowed() {
                allowed += 1;
            }

            for pool in &instances {
                pool.sync_all().await.unwrap();
            }
        }

        // Reconciling every instance after each admission keeps their views exact.
        assert_eq!(allowed, limit);
        assert_eq!(store.total("hitpool:k"), limit);
    });
}

#[test]
fn unsynced_admission_is_still_allowed() {
    block_on(async {
        let store = LocalRemoteStore::new();
        let pool = Pool::new(store.clone(), PoolOptions::default());
        let counter = pool.touch("k", None).await.unwrap();

        store.set_unavailable(true);

        let decision = counter.limit_check(1).await;
        assert!(decision.is_allowed());
        assert!(matches!(decision, AdmissionDecision::AllowedUnsynced { .. }));
    });
}
