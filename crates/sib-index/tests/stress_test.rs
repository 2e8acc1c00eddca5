//! Stress Test - concurrent put/find/remove against one index
//!
//! Run with: cargo test --package sib-index --test stress_test

use sib_index::*;
use sib_statemodel::State;
use sib_test_utils::*;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const THREADS: usize = 8;
const PER_THREAD: usize = 1_000;

#[test]
fn stress_test_concurrent_destinations() {
    println!("\n[STRESS TEST] {THREADS} threads x {PER_THREAD} destinations...");

    let start = Instant::now();
    let index = Arc::new(setup_destination_index());

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                let mut kept = Vec::new();
                for i in 0..PER_THREAD {
                    let queue = TestDestination::new(&format!("T{t}-Q{i}")).shared();
                    index.put(Arc::clone(&queue), queue_type(State::Unreconciled)).unwrap();
                    index.create(&queue).unwrap();
                    assert!(index
                        .find_by_name(&queue.name, &queue.bus, Some(&StateFilter::visible_only()))
                        .is_some());

                    if i % 2 == 0 {
                        index.delete(&queue).unwrap();
                        index.remove(&queue).unwrap();
                        assert!(index.find_by_uuid(&queue.uuid, None).is_none());
                    } else {
                        kept.push(queue);
                    }
                }
                kept
            })
        })
        .collect();

    let kept: Vec<_> = workers
        .into_iter()
        .flat_map(|w| w.join().unwrap())
        .collect();

    let duration = start.elapsed();
    println!("  Completed in {:.2}s", duration.as_secs_f64());

    // no lost updates
    assert_eq!(index.len(), THREADS * PER_THREAD / 2);
    assert_eq!(kept.len(), index.len());
    for queue in &kept {
        assert_eq!(index.get_state(queue), Some(State::Active));
    }
    index.verify_integrity().unwrap();

    println!("  ✓ Stress test passed\n");
}

#[test]
fn stress_test_same_name_contention() {
    let index = Arc::new(setup_destination_index());

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for _ in 0..200 {
                    let queue = TestDestination::new("SHARED").shared();
                    index.put(Arc::clone(&queue), queue_type(State::Active)).unwrap();
                    let _ = index.find_by_name("SHARED", DEFAULT_LOCAL_BUS, None);
                    index.remove(&queue).unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert!(index.is_empty());
    assert!(!index.contains_name(DEFAULT_LOCAL_BUS, "SHARED"));
    index.verify_integrity().unwrap();
}

#[test]
fn stress_test_subscription_counters() {
    let index = Arc::new(SubscriptionIndex::new());

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for i in 0..500 {
                    let sub = if (t + i) % 3 == 0 {
                        TestSubscription::durable()
                    } else {
                        TestSubscription::non_durable()
                    };
                    index.put(Arc::clone(&sub));
                    if i % 4 == 0 {
                        index.remove(&sub).unwrap();
                    }
                    let counts = index.counts();
                    assert!(counts.total() <= THREADS * 500);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(index.total_subscriptions(), index.len());
    assert_eq!(index.len(), THREADS * 375);
    index.verify_integrity().unwrap();
}
