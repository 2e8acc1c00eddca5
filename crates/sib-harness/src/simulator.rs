//! Seeded Concurrent Simulator
//!
//! Several rayon workers share one [`DestinationIndex`] and one
//! [`SubscriptionIndex`]. Each worker draws operations from its own
//! `StdRng` seeded with `seed + worker`, and only removes or transitions
//! handlers it registered itself, so every failure other than a rejected
//! transition is a violation.
//!
//! Names are drawn from a pool shared by all workers, which keeps duplicate
//! name registrations and stale-slot removals on the hot path.
//!
//! After the workers finish:
//! - both indexes pass `verify_integrity`
//! - the destination count equals what the workers still hold
//! - the subscription counters equal a recount of what the workers still hold

use crate::handler::{SimDestination, SimSubscription};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sib_index::{
    DestinationFlags, DestinationIndex, EntryType, IndexConfig, IndexError, StateFilter,
    SubscriptionCounts, SubscriptionIndex,
};
use sib_statemodel::{State, Transition};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Concurrent workers
    pub workers: usize,
    /// Operations issued by each worker
    pub operations_per_worker: usize,
    /// Size of the shared destination name pool
    pub destinations: usize,
    /// Buses names are spread over; bus 0 is the local bus
    pub buses: usize,
    /// Index settings
    pub index: IndexConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            workers: 4,
            operations_per_worker: 10_000,
            destinations: 64,
            buses: 2,
            index: IndexConfig::default(),
        }
    }
}

impl SimulatorConfig {
    /// With seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// With worker count
    #[inline]
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// With operations per worker
    #[inline]
    #[must_use]
    pub fn with_operations(mut self, operations: usize) -> Self {
        self.operations_per_worker = operations;
        self
    }

    /// With name pool size
    #[inline]
    #[must_use]
    pub fn with_destinations(mut self, destinations: usize) -> Self {
        self.destinations = destinations;
        self
    }

    /// With bus count
    #[inline]
    #[must_use]
    pub fn with_buses(mut self, buses: usize) -> Self {
        self.buses = buses;
        self
    }

    /// Parse from TOML and validate
    ///
    /// # Errors
    /// Returns [`IndexError::Config`] on malformed TOML or invalid values.
    pub fn from_toml_str(input: &str) -> Result<Self, IndexError> {
        let config: Self = toml::from_str(input).map_err(|e| IndexError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values
    ///
    /// # Errors
    /// Returns [`IndexError::Config`] if a count is zero or the index
    /// settings are invalid.
    pub fn validate(&self) -> Result<(), IndexError> {
        for (field, value) in [
            ("workers", self.workers),
            ("destinations", self.destinations),
            ("buses", self.buses),
        ] {
            if value == 0 {
                return Err(IndexError::Config(format!("{field} must be at least 1")));
            }
        }
        self.index.validate()
    }

    fn bus_name(&self, bus: usize) -> String {
        if bus == 0 {
            self.index.local_bus.clone()
        } else {
            format!("Bus{bus}")
        }
    }
}

/// Operation counts, summed over all workers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorStats {
    pub puts: u64,
    pub removes: u64,
    pub transitions: u64,
    pub rejected_transitions: u64,
    pub name_lookups: u64,
    pub name_hits: u64,
    pub uuid_lookups: u64,
    pub fatal_removes: u64,
    pub subscription_puts: u64,
    pub subscription_removes: u64,
}

impl SimulatorStats {
    fn merge(&mut self, other: &Self) {
        self.puts += other.puts;
        self.removes += other.removes;
        self.transitions += other.transitions;
        self.rejected_transitions += other.rejected_transitions;
        self.name_lookups += other.name_lookups;
        self.name_hits += other.name_hits;
        self.uuid_lookups += other.uuid_lookups;
        self.fatal_removes += other.fatal_removes;
        self.subscription_puts += other.subscription_puts;
        self.subscription_removes += other.subscription_removes;
    }
}

/// Final report from simulator
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: SimulatorStats,
    pub violations: Vec<String>,
    /// Destinations registered at the end
    pub destinations: usize,
    /// Of which visible
    pub visible_destinations: usize,
    /// Subscription counters at the end
    pub subscriptions: SubscriptionCounts,
    pub duration_ms: u64,
}

impl SimulatorReport {
    /// No violations were recorded
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();
        let stats = &self.stats;

        report.push_str("=== SIB Index Simulator Report ===\n\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Workers: {}", self.config.workers);
        let _ = writeln!(report, "Operations per Worker: {}", self.config.operations_per_worker);
        let _ = writeln!(report, "Puts: {}", stats.puts);
        let _ = writeln!(report, "Removes: {}", stats.removes);
        let _ = writeln!(report, "Transitions Applied: {}", stats.transitions);
        let _ = writeln!(report, "Transitions Rejected: {}", stats.rejected_transitions);
        let _ = writeln!(report, "Name Lookups: {} ({} hits)", stats.name_lookups, stats.name_hits);
        let _ = writeln!(report, "UUID Lookups: {}", stats.uuid_lookups);
        let _ = writeln!(report, "Fatal Removes (expected): {}", stats.fatal_removes);
        let _ = writeln!(
            report,
            "Subscriptions: {} put, {} removed",
            stats.subscription_puts, stats.subscription_removes
        );
        let _ = writeln!(
            report,
            "Final Destinations: {} ({} visible)",
            self.destinations, self.visible_destinations
        );
        let _ = writeln!(
            report,
            "Final Subscriptions: {} durable, {} non-durable",
            self.subscriptions.durable, self.subscriptions.non_durable
        );
        let _ = writeln!(report, "Duration: {}ms", self.duration_ms);
        let _ = writeln!(report, "Violations: {}", self.violations.len());

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {v}", i + 1);
            }
        }

        let _ = write!(
            report,
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Put,
    Remove,
    Transition(Transition),
    FindByName,
    FindByUuid,
    SubscriptionPut,
    SubscriptionRemove,
}

fn next_operation(rng: &mut StdRng) -> Operation {
    match rng.random_range(0..100) {
        0..=19 => Operation::Put,
        20..=29 => Operation::Remove,
        30..=54 => Operation::Transition(Transition::ALL[rng.random_range(0..Transition::ALL.len())]),
        55..=69 => Operation::FindByName,
        70..=79 => Operation::FindByUuid,
        80..=91 => Operation::SubscriptionPut,
        _ => Operation::SubscriptionRemove,
    }
}

#[derive(Debug, Default)]
struct WorkerOutcome {
    stats: SimulatorStats,
    violations: Vec<String>,
    destinations: usize,
    subscriptions: SubscriptionCounts,
}

struct Worker<'a> {
    id: usize,
    config: &'a SimulatorConfig,
    destinations: &'a DestinationIndex<SimDestination>,
    subscriptions: &'a SubscriptionIndex<SimSubscription>,
    rng: StdRng,
    owned: Vec<Arc<SimDestination>>,
    subscribed: Vec<Arc<SimSubscription>>,
    outcome: WorkerOutcome,
}

impl Worker<'_> {
    fn violation(&mut self, message: String) {
        warn!(worker = self.id, %message, "violation");
        self.outcome.violations.push(message);
    }

    fn random_name(&mut self) -> (String, String) {
        let name = format!("D{}", self.rng.random_range(0..self.config.destinations));
        let bus = self.config.bus_name(self.rng.random_range(0..self.config.buses));
        (name, bus)
    }

    fn random_owned(&mut self) -> Option<Arc<SimDestination>> {
        if self.owned.is_empty() {
            return None;
        }
        let i = self.rng.random_range(0..self.owned.len());
        Some(Arc::clone(&self.owned[i]))
    }

    fn step(&mut self, operation: Operation) {
        match operation {
            Operation::Put => self.put(),
            Operation::Remove => self.remove(),
            Operation::Transition(transition) => self.transition(transition),
            Operation::FindByName => self.find_by_name(),
            Operation::FindByUuid => self.find_by_uuid(),
            Operation::SubscriptionPut => self.subscription_put(),
            Operation::SubscriptionRemove => self.subscription_remove(),
        }
    }

    fn put(&mut self) {
        let (name, bus) = self.random_name();
        let dest = Arc::new(SimDestination::new(name, bus));
        let flags = DestinationFlags::default().with_queue(self.rng.random_bool(0.5));
        match self
            .destinations
            .put(Arc::clone(&dest), EntryType::destination(State::Unreconciled, flags))
        {
            Ok(_) => {
                self.outcome.stats.puts += 1;
                self.owned.push(dest);
            }
            Err(e) => self.violation(format!("put of {} failed: {e}", dest.uuid)),
        }
    }

    fn remove(&mut self) {
        if self.owned.is_empty() {
            return;
        }
        let i = self.rng.random_range(0..self.owned.len());
        let dest = self.owned.swap_remove(i);
        match self.destinations.remove(&dest) {
            Ok(_) => self.outcome.stats.removes += 1,
            Err(e) => self.violation(format!("remove of owned {} failed: {e}", dest.uuid)),
        }
    }

    fn transition(&mut self, transition: Transition) {
        let Some(dest) = self.random_owned() else {
            return;
        };
        match self.destinations.transition(&dest, transition) {
            Ok(()) => self.outcome.stats.transitions += 1,
            Err(IndexError::Transition(_)) => self.outcome.stats.rejected_transitions += 1,
            Err(e) => self.violation(format!("{transition} on owned {} failed: {e}", dest.uuid)),
        }
    }

    fn find_by_name(&mut self) {
        let (name, bus) = self.random_name();
        self.outcome.stats.name_lookups += 1;
        let visible = StateFilter::visible_only();
        if let Some(found) = self.destinations.find_by_name(&name, &bus, Some(&visible)) {
            self.outcome.stats.name_hits += 1;
            if found.name != name || found.bus != bus {
                self.violation(format!(
                    "lookup of {bus}/{name} returned {}/{}",
                    found.bus, found.name
                ));
            }
        }
    }

    fn find_by_uuid(&mut self) {
        let Some(dest) = self.random_owned() else {
            return;
        };
        self.outcome.stats.uuid_lookups += 1;
        match self.destinations.find_by_uuid(&dest.uuid, None) {
            Some(found) if Arc::ptr_eq(&found, &dest) => {}
            Some(_) => self.violation(format!("uuid {} resolves to another handler", dest.uuid)),
            None => self.violation(format!("owned destination {} not found by uuid", dest.uuid)),
        }
    }

    fn subscription_put(&mut self) {
        let sub = Arc::new(SimSubscription::new(self.rng.random_bool(0.4)));
        self.subscriptions.put(Arc::clone(&sub));
        self.subscribed.push(sub);
        self.outcome.stats.subscription_puts += 1;
    }

    fn subscription_remove(&mut self) {
        if self.subscribed.is_empty() {
            return;
        }
        let i = self.rng.random_range(0..self.subscribed.len());
        let sub = self.subscribed.swap_remove(i);
        if self.subscriptions.remove(&sub).is_some() {
            self.outcome.stats.subscription_removes += 1;
        } else {
            self.violation(format!("owned subscription {} not registered", sub.uuid));
        }
    }

    /// Removing a destination nobody registered must fail fatally
    fn remove_unregistered(&mut self) {
        let ghost = SimDestination::new(format!("ghost-{}", self.id), self.config.bus_name(0));
        match self.destinations.remove(&ghost) {
            Err(e) if e.is_fatal() => self.outcome.stats.fatal_removes += 1,
            other => self.violation(format!("remove of unregistered destination returned {other:?}")),
        }
    }

    fn run(mut self) -> WorkerOutcome {
        for _ in 0..self.config.operations_per_worker {
            let operation = next_operation(&mut self.rng);
            self.step(operation);
        }
        self.remove_unregistered();

        self.outcome.destinations = self.owned.len();
        for sub in &self.subscribed {
            if sub.durable {
                self.outcome.subscriptions.durable += 1;
            } else {
                self.outcome.subscriptions.non_durable += 1;
            }
        }
        debug!(
            worker = self.id,
            destinations = self.outcome.destinations,
            violations = self.outcome.violations.len(),
            "worker finished"
        );
        self.outcome
    }
}

/// Run the simulator
#[must_use]
pub fn run_simulator(config: &SimulatorConfig) -> SimulatorReport {
    info!(
        seed = config.seed,
        workers = config.workers,
        operations = config.operations_per_worker,
        "starting simulation"
    );
    let start = Instant::now();

    let destinations = DestinationIndex::new(&config.index);
    let subscriptions = SubscriptionIndex::with_capacity(config.index.initial_capacity);

    let outcomes: Vec<WorkerOutcome> = (0..config.workers)
        .into_par_iter()
        .map(|id| {
            Worker {
                id,
                config,
                destinations: &destinations,
                subscriptions: &subscriptions,
                rng: StdRng::seed_from_u64(config.seed.wrapping_add(id as u64)),
                owned: Vec::new(),
                subscribed: Vec::new(),
                outcome: WorkerOutcome::default(),
            }
            .run()
        })
        .collect();

    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();
    let mut held_destinations = 0;
    let mut held_subscriptions = SubscriptionCounts::default();
    for outcome in outcomes {
        stats.merge(&outcome.stats);
        violations.extend(outcome.violations);
        held_destinations += outcome.destinations;
        held_subscriptions.durable += outcome.subscriptions.durable;
        held_subscriptions.non_durable += outcome.subscriptions.non_durable;
    }

    if let Err(e) = destinations.verify_integrity() {
        violations.push(format!("destination index: {e}"));
    }
    if let Err(e) = subscriptions.verify_integrity() {
        violations.push(format!("subscription index: {e}"));
    }
    if destinations.len() != held_destinations {
        violations.push(format!(
            "destination index holds {} entries, workers hold {held_destinations}",
            destinations.len()
        ));
    }
    let counts = subscriptions.counts();
    if counts != held_subscriptions {
        violations.push(format!(
            "subscription counters {counts:?} differ from held {held_subscriptions:?}"
        ));
    }

    let report = SimulatorReport {
        config: config.clone(),
        stats,
        violations,
        destinations: destinations.len(),
        visible_destinations: destinations.snapshot(Some(&StateFilter::visible_only())).len(),
        subscriptions: counts,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    };

    info!(
        passed = report.passed(),
        violations = report.violations.len(),
        duration_ms = report.duration_ms,
        "simulation finished"
    );
    report
}
