//! Integration tests for the dispatch cycle.
//!
//! Runs full cycles against the in-memory registries and a static weather
//! source:
//! - Threshold matching (inclusive boundary, zero-snowfall exclusion)
//! - One job per contract per day, re-armed on the next day
//! - Per-contract error isolation and fatal fetch aborts
//! - Concurrent cycles racing on the same contract
//! - Registry fan-out bounded by the concurrency limit

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use plowline_core::types::{DbId, Timestamp};
use plowline_core::weather::MonitoredCity;
use plowline_db::models::contract::ServiceContract;
use plowline_db::models::job::{Job, NewDispatchedJob};
use plowline_db::models::status::JobStatus;
use plowline_dispatch::registry::memory::{InMemoryContractRegistry, InMemoryJobRegistry};
use plowline_dispatch::weather::fixed::StaticWeatherSource;
use plowline_dispatch::{
    DispatchConfig, DispatchError, DispatchResult, Dispatcher, FetchError, InsertOutcome,
    JobRegistry, RegistryError,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn contract(id: i64, city: &str, threshold: f64) -> ServiceContract {
    let at = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
    ServiceContract {
        id,
        customer_id: 100 + id,
        address: format!("{id} Main St"),
        city: city.to_string(),
        snow_threshold_inches: threshold,
        is_priority: false,
        created_at: at,
        updated_at: at,
    }
}

fn config(cities: &[&str]) -> DispatchConfig {
    DispatchConfig::for_cities(
        cities
            .iter()
            .enumerate()
            .map(|(i, name)| MonitoredCity::new(*name, 40.0 + i as f64, -70.0))
            .collect(),
    )
}

fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap()
}

fn result(created: usize, skipped: usize, errors: usize) -> DispatchResult {
    DispatchResult {
        created,
        skipped,
        errors,
    }
}

struct Harness {
    weather: Arc<StaticWeatherSource>,
    contracts: Arc<InMemoryContractRegistry>,
    jobs: Arc<InMemoryJobRegistry>,
    dispatcher: Dispatcher,
}

impl Harness {
    fn new(
        weather: StaticWeatherSource,
        contracts: Vec<ServiceContract>,
        jobs: InMemoryJobRegistry,
    ) -> Self {
        let weather = Arc::new(weather);
        let contracts = Arc::new(InMemoryContractRegistry::new(contracts));
        let jobs = Arc::new(jobs);
        let dispatcher = Dispatcher::new(weather.clone(), contracts.clone(), jobs.clone());
        Self {
            weather,
            contracts,
            jobs,
            dispatcher,
        }
    }

    /// The example scenario: A=3.5", B=0", C=5.0" with four contracts.
    fn example() -> Self {
        Self::new(
            StaticWeatherSource::new([("A", 3.5), ("B", 0.0), ("C", 5.0)]),
            vec![
                contract(1, "A", 2.0),
                contract(2, "A", 4.0),
                contract(3, "B", 1.0),
                contract(4, "C", 5.0),
            ],
            InMemoryJobRegistry::new(),
        )
    }
}

/// Job registry that counts overlapping day lookups before delegating.
#[derive(Default)]
struct TrackingJobRegistry {
    inner: InMemoryJobRegistry,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl JobRegistry for TrackingJobRegistry {
    async fn find_jobs_for_contract_on_day(
        &self,
        contract_id: DbId,
        day_start: Timestamp,
        day_end: Timestamp,
    ) -> Result<Vec<Job>, RegistryError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(StdDuration::from_millis(5)).await;
        let found = self
            .inner
            .find_jobs_for_contract_on_day(contract_id, day_start, day_end)
            .await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        found
    }

    async fn insert_job(&self, job: &NewDispatchedJob) -> Result<InsertOutcome, RegistryError> {
        self.inner.insert_job(job).await
    }
}

// ---------------------------------------------------------------------------
// Matching and dedup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn example_scenario_creates_then_skips() {
    let h = Harness::example();
    let config = config(&["A", "B", "C"]);

    let first = h.dispatcher.run_cycle_at(&config, morning()).await.unwrap();
    assert_eq!(first, result(2, 0, 0));

    let mut dispatched: Vec<_> = h.jobs.jobs().unwrap().iter().map(|j| j.contract_id).collect();
    dispatched.sort();
    assert_eq!(dispatched, vec![1, 4]);

    let second = h
        .dispatcher
        .run_cycle_at(&config, morning() + Duration::hours(3))
        .await
        .unwrap();
    assert_eq!(second, result(0, 2, 0));
    assert_eq!(h.jobs.jobs().unwrap().len(), 2);
}

#[tokio::test]
async fn repeated_cycles_keep_one_job_per_day() {
    let h = Harness::new(
        StaticWeatherSource::new([("A", 6.0)]),
        vec![contract(1, "A", 2.0)],
        InMemoryJobRegistry::new(),
    );
    let config = config(&["A"]);

    let mut total = DispatchResult::default();
    for hour in 0..6 {
        let now = morning() + Duration::hours(hour * 2);
        let r = h.dispatcher.run_cycle_at(&config, now).await.unwrap();
        total.created += r.created;
        total.skipped += r.skipped;
        total.errors += r.errors;
    }

    assert_eq!(total, result(1, 5, 0));
    assert_eq!(h.jobs.jobs_for_contract(1).unwrap().len(), 1);
}

#[tokio::test]
async fn next_day_rearms_contract() {
    let h = Harness::new(
        StaticWeatherSource::new([("A", 3.0)]),
        vec![contract(1, "A", 2.0)],
        InMemoryJobRegistry::new(),
    );
    let config = config(&["A"]);

    let late = Utc.with_ymd_and_hms(2026, 1, 15, 23, 59, 0).unwrap();
    let early = Utc.with_ymd_and_hms(2026, 1, 16, 0, 1, 0).unwrap();

    assert_eq!(h.dispatcher.run_cycle_at(&config, late).await.unwrap(), result(1, 0, 0));
    assert_eq!(h.dispatcher.run_cycle_at(&config, early).await.unwrap(), result(1, 0, 0));

    let jobs = h.jobs.jobs_for_contract(1).unwrap();
    assert_eq!(jobs.len(), 2);
    assert_ne!(jobs[0].dispatch_day, jobs[1].dispatch_day);
}

#[tokio::test]
async fn rising_snowfall_dispatches_once_per_day() {
    let h = Harness::new(
        StaticWeatherSource::new([("A", 1.0)]),
        vec![contract(1, "A", 2.0)],
        InMemoryJobRegistry::new(),
    );
    let config = config(&["A"]);

    let dry = h.dispatcher.run_cycle_at(&config, morning()).await.unwrap();
    assert_eq!(dry, result(0, 0, 0));

    h.weather.set_snowfall("A", 3.0).unwrap();
    let crossed = h
        .dispatcher
        .run_cycle_at(&config, morning() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(crossed, result(1, 0, 0));

    h.weather.set_snowfall("A", 5.0).unwrap();
    let heavier = h
        .dispatcher
        .run_cycle_at(&config, morning() + Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(heavier, result(0, 1, 0));

    let jobs = h.jobs.jobs_for_contract(1).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].snowfall_inches, 3.0);
}

#[tokio::test]
async fn day_boundary_follows_configured_offset() {
    let h = Harness::new(
        StaticWeatherSource::new([("A", 3.0)]),
        vec![contract(1, "A", 2.0)],
        InMemoryJobRegistry::new(),
    );
    let mut config = config(&["A"]);
    config.day_offset = plowline_core::day_bucket::offset_from_minutes(-300).unwrap();

    // 22:00 and 03:00 UTC straddle UTC midnight but are the same day at UTC-5.
    let evening = Utc.with_ymd_and_hms(2026, 1, 15, 22, 0, 0).unwrap();
    let after_midnight = Utc.with_ymd_and_hms(2026, 1, 16, 3, 0, 0).unwrap();

    assert_eq!(h.dispatcher.run_cycle_at(&config, evening).await.unwrap(), result(1, 0, 0));
    assert_eq!(
        h.dispatcher.run_cycle_at(&config, after_midnight).await.unwrap(),
        result(0, 1, 0)
    );
}

#[tokio::test]
async fn threshold_boundary_is_inclusive() {
    let h = Harness::new(
        StaticWeatherSource::new([("A", 4.0)]),
        vec![contract(1, "A", 4.0), contract(2, "A", 4.01)],
        InMemoryJobRegistry::new(),
    );

    let r = h.dispatcher.run_cycle_at(&config(&["A"]), morning()).await.unwrap();

    assert_eq!(r, result(1, 0, 0));
    assert_eq!(h.jobs.jobs_for_contract(1).unwrap().len(), 1);
    assert!(h.jobs.jobs_for_contract(2).unwrap().is_empty());
}

#[tokio::test]
async fn zero_snowfall_matches_zero_threshold_contract_never() {
    let h = Harness::new(
        StaticWeatherSource::new([("A", 0.0)]),
        vec![contract(1, "A", 0.0)],
        InMemoryJobRegistry::new(),
    );

    let r = h.dispatcher.run_cycle_at(&config(&["A"]), morning()).await.unwrap();

    assert_eq!(r, DispatchResult::default());
    assert!(h.jobs.jobs().unwrap().is_empty());
}

#[tokio::test]
async fn contracts_in_other_cities_are_ignored() {
    let h = Harness::new(
        StaticWeatherSource::new([("A", 5.0), ("B", 0.0)]),
        vec![contract(1, "B", 1.0)],
        InMemoryJobRegistry::new(),
    );

    let r = h.dispatcher.run_cycle_at(&config(&["A", "B"]), morning()).await.unwrap();

    assert_eq!(r, DispatchResult::default());
}

// ---------------------------------------------------------------------------
// Job contents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn job_carries_contract_and_reading_details() {
    let mut priority = contract(1, "A", 2.0);
    priority.is_priority = true;
    let h = Harness::new(
        StaticWeatherSource::new([("A", 3.5)]),
        vec![priority],
        InMemoryJobRegistry::new(),
    );
    let mut config = config(&["A"]);
    config.dispatch_lead_time = Duration::minutes(45);

    h.dispatcher.run_cycle_at(&config, morning()).await.unwrap();

    let job = &h.jobs.jobs().unwrap()[0];
    assert_eq!(job.contract_id, 1);
    assert_eq!(job.customer_id, 101);
    assert_eq!(job.address, "1 Main St, A");
    assert_eq!(job.scheduled_at, morning() + Duration::minutes(45));
    assert_eq!(job.status_id, JobStatus::Pending.id());
    assert_eq!(job.snowfall_inches, 3.5);
    assert!(job.is_priority);
    assert!(job.notes.contains("3.5\"") && job.notes.contains("2\""));
    assert_eq!(job.created_at, morning());
    assert_eq!(job.updated_at, morning());
    assert_eq!(job.dispatch_day, Some(morning().date_naive()));
}

// ---------------------------------------------------------------------------
// Error isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_insert_does_not_affect_other_contracts() {
    let h = Harness::new(
        StaticWeatherSource::new([("A", 5.0), ("C", 5.0)]),
        vec![
            contract(1, "A", 1.0),
            contract(2, "A", 2.0),
            contract(3, "C", 3.0),
            contract(4, "C", 4.0),
        ],
        InMemoryJobRegistry::new(),
    );
    h.jobs.fail_inserts_for(3).unwrap();

    let r = h.dispatcher.run_cycle_at(&config(&["A", "C"]), morning()).await.unwrap();

    assert_eq!(r, result(3, 0, 1));
    assert!(h.jobs.jobs_for_contract(3).unwrap().is_empty());
}

#[tokio::test]
async fn failed_dedup_lookup_counts_error_and_creates_nothing() {
    let h = Harness::new(
        StaticWeatherSource::new([("A", 5.0)]),
        vec![contract(1, "A", 1.0), contract(2, "A", 1.0)],
        InMemoryJobRegistry::new(),
    );
    h.jobs.fail_lookups_for(2).unwrap();

    let r = h.dispatcher.run_cycle_at(&config(&["A"]), morning()).await.unwrap();

    assert_eq!(r, result(1, 0, 1));
    assert!(h.jobs.jobs_for_contract(2).unwrap().is_empty());
}

#[tokio::test]
async fn failed_contract_lookup_is_isolated_to_its_city() {
    let h = Harness::new(
        StaticWeatherSource::new([("A", 5.0), ("C", 5.0)]),
        vec![contract(1, "A", 1.0), contract(2, "C", 1.0)],
        InMemoryJobRegistry::new(),
    );
    h.contracts.fail_lookups_for_city("A").unwrap();

    let r = h.dispatcher.run_cycle_at(&config(&["A", "C"]), morning()).await.unwrap();

    assert_eq!(r, result(1, 0, 1));
    assert_eq!(h.jobs.jobs_for_contract(2).unwrap().len(), 1);
}

#[tokio::test]
async fn slow_registry_counts_as_per_contract_error() {
    let h = Harness::new(
        StaticWeatherSource::new([("A", 5.0)]),
        vec![contract(1, "A", 1.0), contract(2, "A", 1.0)],
        InMemoryJobRegistry::with_lookup_delay(StdDuration::from_millis(500)),
    );
    let mut config = config(&["A"]);
    config.per_operation_timeout = StdDuration::from_millis(20);

    let r = h.dispatcher.run_cycle_at(&config, morning()).await.unwrap();

    assert_eq!(r, result(0, 0, 2));
    assert!(h.jobs.jobs().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Fatal errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_fetch_aborts_without_writes() {
    let h = Harness::example();
    h.weather.fail_with("provider down").unwrap();

    let outcome = h.dispatcher.run_cycle_at(&config(&["A", "B", "C"]), morning()).await;

    assert_matches!(outcome, Err(DispatchError::Fetch(FetchError::Unavailable(_))));
    assert!(h.jobs.jobs().unwrap().is_empty());
}

#[tokio::test]
async fn slow_fetch_times_out() {
    let h = Harness::new(
        StaticWeatherSource::new([("A", 5.0)]).with_delay(StdDuration::from_millis(500)),
        vec![contract(1, "A", 1.0)],
        InMemoryJobRegistry::new(),
    );
    let mut config = config(&["A"]);
    config.per_operation_timeout = StdDuration::from_millis(20);

    let outcome = h.dispatcher.run_cycle_at(&config, morning()).await;

    assert_matches!(outcome, Err(DispatchError::Fetch(FetchError::Timeout)));
    assert!(h.jobs.jobs().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_configuration_is_rejected_before_fetch() {
    let h = Harness::example();
    let mut config = config(&["A", "B", "C"]);
    config.dispatch_lead_time = Duration::hours(-1);

    let outcome = h.dispatcher.run_cycle_at(&config, morning()).await;

    assert_matches!(outcome, Err(DispatchError::Configuration(_)));
    assert!(h.jobs.jobs().unwrap().is_empty());
}

#[tokio::test]
async fn recovered_source_resumes_dispatch() {
    let h = Harness::example();
    let config = config(&["A", "B", "C"]);
    h.weather.fail_with("provider down").unwrap();
    assert!(h.dispatcher.run_cycle_at(&config, morning()).await.is_err());

    h.weather.recover().unwrap();
    let r = h.dispatcher.run_cycle_at(&config, morning()).await.unwrap();

    assert_eq!(r, result(2, 0, 0));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_cycles_create_exactly_one_job() {
    // The lookup delay lets both cycles pass the dedup check before either
    // inserts, so the registry constraint is what decides the winner.
    let h = Harness::new(
        StaticWeatherSource::new([("A", 5.0)]),
        vec![contract(1, "A", 1.0)],
        InMemoryJobRegistry::with_lookup_delay(StdDuration::from_millis(50)),
    );
    let config = config(&["A"]);

    let (a, b) = tokio::join!(
        h.dispatcher.run_cycle_at(&config, morning()),
        h.dispatcher.run_cycle_at(&config, morning() + Duration::minutes(1)),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.created + b.created, 1);
    assert_eq!(a.skipped + b.skipped, 1);
    assert_eq!(a.errors + b.errors, 0);
    assert_eq!(h.jobs.jobs_for_contract(1).unwrap().len(), 1);
}

#[tokio::test]
async fn wide_fan_out_respects_per_contract_outcomes() {
    let contracts: Vec<_> = (1..=40).map(|id| contract(id, "A", (id % 5) as f64)).collect();
    let h = Harness::new(
        StaticWeatherSource::new([("A", 3.0)]),
        contracts,
        InMemoryJobRegistry::new(),
    );
    h.jobs.fail_inserts_for(7).unwrap();
    let mut config = config(&["A"]);
    config.concurrency_limit = 4;

    let r = h.dispatcher.run_cycle_at(&config, morning()).await.unwrap();

    // Thresholds 0..=3 match a 3" reading: 32 of the 40 contracts.
    assert_eq!(r, result(31, 0, 1));
}

#[tokio::test]
async fn registry_calls_stay_within_concurrency_limit() {
    let contracts: Vec<_> = (1..=40).map(|id| contract(id, "A", 1.0)).collect();
    let jobs = Arc::new(TrackingJobRegistry::default());
    let dispatcher = Dispatcher::new(
        Arc::new(StaticWeatherSource::new([("A", 3.0)])),
        Arc::new(InMemoryContractRegistry::new(contracts)),
        jobs.clone(),
    );
    let mut config = config(&["A"]);
    config.concurrency_limit = 4;

    let r = dispatcher.run_cycle_at(&config, morning()).await.unwrap();

    assert_eq!(r, result(40, 0, 0));
    let peak = jobs.peak.load(Ordering::SeqCst);
    assert!(peak <= 4, "peak of {peak} lookups in flight exceeds the limit");
    assert!(peak >= 2, "lookups never overlapped");
}

// ---------------------------------------------------------------------------
// Weather snapshot
// ---------------------------------------------------------------------------

#[tokio::test]
async fn snapshot_reports_every_city_without_writing() {
    let h = Harness::example();

    let readings = h
        .dispatcher
        .weather_snapshot(&config(&["A", "B", "C"]))
        .await
        .unwrap();

    let cities: Vec<_> = readings.iter().map(|r| r.city.as_str()).collect();
    assert_eq!(cities, vec!["A", "B", "C"]);
    assert!(h.jobs.jobs().unwrap().is_empty());
}

#[tokio::test]
async fn snapshot_surfaces_fetch_failure() {
    let h = Harness::example();
    h.weather.fail_with("provider down").unwrap();

    let outcome = h.dispatcher.weather_snapshot(&config(&["A"])).await;

    assert_matches!(outcome, Err(DispatchError::Fetch(_)));
}
