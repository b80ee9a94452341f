use arbor_federation::{RefreshCoordinator, RefreshKey};
use arbor_types::{Contribution, Expiration, NodePath};
use std::sync::Arc;

fn key(node: &str, source: &str) -> RefreshKey {
    RefreshKey::new(node.parse::<NodePath>().unwrap(), source)
}

// ── Single flight under concurrency ──────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn n_concurrent_callers_start_exactly_one_fetch() {
    let coordinator = Arc::new(RefreshCoordinator::new());
    let k = key("/docs", "a");

    let mut attachers = Vec::new();
    for _ in 0..16 {
        let coordinator = Arc::clone(&coordinator);
        let k = k.clone();
        attachers.push(tokio::spawn(async move { coordinator.attach(&k) }));
    }

    let mut waiters = Vec::new();
    let mut starts = 0;
    for attacher in attachers {
        let (waiter, started) = attacher.await.unwrap();
        if started {
            starts += 1;
        }
        waiters.push(waiter);
    }
    assert_eq!(starts, 1, "exactly one caller may start the fetch");
    assert_eq!(coordinator.inflight_count(), 1);

    let outcome = Ok(Contribution::empty("a", Expiration::Never).unwrap());
    coordinator.complete(&k, &outcome);

    for waiter in waiters {
        assert_eq!(waiter.wait().await, Some(outcome.clone()));
    }
    assert_eq!(coordinator.inflight_count(), 0);
}

// ── Key granularity ──────────────────────────────────────────────

#[tokio::test]
async fn same_source_different_nodes_are_independent_fetches() {
    let coordinator = RefreshCoordinator::new();
    let (_w1, started1) = coordinator.attach(&key("/docs", "a"));
    let (_w2, started2) = coordinator.attach(&key("/media", "a"));
    assert!(started1);
    assert!(started2);
    assert_eq!(coordinator.inflight_count(), 2);
}

#[tokio::test]
async fn completion_of_one_pair_leaves_others_inflight() {
    let coordinator = RefreshCoordinator::new();
    let docs = key("/docs", "a");
    let media = key("/media", "a");
    let (_w1, _) = coordinator.attach(&docs);
    let (_w2, _) = coordinator.attach(&media);

    let outcome = Ok(Contribution::empty("a", Expiration::Never).unwrap());
    coordinator.complete(&docs, &outcome);

    assert!(!coordinator.is_inflight(&docs));
    assert!(coordinator.is_inflight(&media));
}

// ── Re-request after completion ──────────────────────────────────

#[tokio::test]
async fn a_completed_pair_can_be_fetched_again() {
    let coordinator = RefreshCoordinator::new();
    let k = key("/docs", "a");

    let (first, started) = coordinator.attach(&k);
    assert!(started);
    let outcome = Ok(Contribution::empty("a", Expiration::Never).unwrap());
    coordinator.complete(&k, &outcome);
    assert_eq!(first.wait().await, Some(outcome));

    let (_second, started_again) = coordinator.attach(&k);
    assert!(started_again, "a fresh entry is created after completion");
}
