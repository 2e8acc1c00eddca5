//! Bulk put / find / remove timing on one thread

use crate::handler::SimDestination;
use serde::Serialize;
use sib_index::{DestinationFlags, DestinationIndex, EntryType, IndexConfig, StateFilter};
use sib_statemodel::State;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Stress test report
#[derive(Debug, Clone, Serialize)]
pub struct StressReport {
    pub destinations: usize,
    pub put_ms: u64,
    pub find_ms: u64,
    pub remove_ms: u64,
    pub failures: usize,
    pub success: bool,
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Register, create, look up and remove `destinations` queues
#[must_use]
pub fn run_stress(destinations: usize, config: &IndexConfig) -> StressReport {
    let index = DestinationIndex::new(config);
    let bus = config.local_bus.as_str();
    let queues: Vec<_> = (0..destinations)
        .map(|i| Arc::new(SimDestination::new(format!("Q{i}"), bus)))
        .collect();
    let mut failures = 0;

    let start = Instant::now();
    for queue in &queues {
        let ty = EntryType::destination(State::Unreconciled, DestinationFlags::default().with_queue(true));
        if index.put(Arc::clone(queue), ty).is_err() || index.create(queue).is_err() {
            failures += 1;
        }
    }
    let put_ms = elapsed_ms(start);

    let start = Instant::now();
    let visible = StateFilter::visible_only();
    for queue in &queues {
        let by_name = index.find_by_name(&queue.name, bus, Some(&visible));
        let by_uuid = index.find_by_uuid(&queue.uuid, Some(&visible));
        if !matches!((by_name, by_uuid), (Some(a), Some(b)) if Arc::ptr_eq(&a, &b)) {
            failures += 1;
        }
    }
    let find_ms = elapsed_ms(start);

    let start = Instant::now();
    for queue in &queues {
        if index.remove(queue).is_err() {
            failures += 1;
        }
    }
    let remove_ms = elapsed_ms(start);

    if let Err(e) = index.verify_integrity() {
        warn!(%e, "integrity check failed");
        failures += 1;
    }
    let success = failures == 0 && index.is_empty();

    info!(destinations, put_ms, find_ms, remove_ms, failures, "stress run finished");
    StressReport {
        destinations,
        put_ms,
        find_ms,
        remove_ms,
        failures,
        success,
    }
}
