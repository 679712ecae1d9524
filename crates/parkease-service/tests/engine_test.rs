//! Occupancy engine behavior over the in-memory backend.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use futures::future::join_all;
use rust_decimal_macros::dec;

use parkease_core::clock::{Clock, ManualClock};
use parkease_core::error::ErrorKind;
use parkease_core::types::{EmployeeId, LocationId, OccupancyRecordId};
use parkease_database::memory::{FaultPoint, MemoryOccupancyStore, MemoryRateProvider};
use parkease_database::store::{CapacityStore, OccupancyLedger};
use parkease_entity::location::{CreateLocation, Location, UpdateLocation};
use parkease_service::{OccupancyEngine, RateService};

struct Harness {
    store: Arc<MemoryOccupancyStore>,
    rates: RateService,
    clock: Arc<ManualClock>,
    engine: OccupancyEngine,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryOccupancyStore::new());
        let provider = Arc::new(MemoryRateProvider::new(dec!(2.50)).unwrap());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap(),
        ));
        let engine = OccupancyEngine::new(store.clone(), provider.clone(), clock.clone());
        Self {
            store,
            rates: RateService::new(provider),
            clock,
            engine,
        }
    }

    async fn location(&self, name: &str, slots: i32) -> Location {
        self.store
            .create_location(&CreateLocation {
                name: name.to_string(),
                latitude: 48.8566,
                longitude: 2.3522,
                total_slots: slots,
            })
            .await
            .unwrap()
    }

    async fn available(&self, id: LocationId) -> i32 {
        self.store.get_available(id).await.unwrap()
    }

    async fn park(&self, id: LocationId, plate: &str) -> OccupancyRecordId {
        self.engine
            .check_in(id, EmployeeId::new(), plate)
            .await
            .unwrap()
            .id
    }
}

#[tokio::test]
async fn test_check_in_takes_a_slot() {
    let h = Harness::new();
    let loc = h.location("Central", 3).await;

    let record = h
        .engine
        .check_in(loc.id, EmployeeId::new(), "  AB-123  ")
        .await
        .unwrap();

    assert_eq!(record.license_plate, "AB-123");
    assert_eq!(record.entry_time, h.clock.now());
    assert!(record.is_open());
    assert!(record.cost.is_none());
    assert_eq!(h.available(loc.id).await, 2);
}

#[tokio::test]
async fn test_check_in_unknown_location() {
    let h = Harness::new();
    let err = h
        .engine
        .check_in(LocationId::new(), EmployeeId::new(), "AB-123")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::LocationNotFound);
}

#[tokio::test]
async fn test_check_in_blank_plate_changes_nothing() {
    let h = Harness::new();
    let loc = h.location("Central", 3).await;

    let err = h
        .engine
        .check_in(loc.id, EmployeeId::new(), "   ")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(h.available(loc.id).await, 3);
    assert_eq!(h.store.count_open(loc.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_full_location_refuses() {
    let h = Harness::new();
    let loc = h.location("Tiny", 1).await;
    h.park(loc.id, "FIRST").await;

    let err = h
        .engine
        .check_in(loc.id, EmployeeId::new(), "SECOND")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::CapacityExceeded);
    assert_eq!(h.available(loc.id).await, 0);
    assert_eq!(h.store.count_open(loc.id).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_race_for_last_slot_has_one_winner() {
    let h = Harness::new();
    let loc_id = h.location("Last Slot", 1).await.id;

    let attempts = (0..2).map(|i| {
        let engine = h.engine.clone();
        tokio::spawn(async move {
            engine
                .check_in(loc_id, EmployeeId::new(), &format!("RACE-{i}"))
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let wins = results.iter().filter(|r| r.is_ok()).count();
    let refusals = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind == ErrorKind::CapacityExceeded))
        .count();
    assert_eq!(wins, 1);
    assert_eq!(refusals, 1);
    assert_eq!(h.available(loc_id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_check_ins_never_oversell() {
    let h = Harness::new();
    let loc_id = h.location("Stadium", 10).await.id;

    let attempts = (0..50).map(|i| {
        let engine = h.engine.clone();
        tokio::spawn(async move {
            engine
                .check_in(loc_id, EmployeeId::new(), &format!("CAR-{i}"))
                .await
        })
    });
    let results = join_all(attempts).await;

    let wins = results
        .iter()
        .filter(|joined| matches!(joined, Ok(Ok(_))))
        .count();
    assert_eq!(wins, 10);
    assert_eq!(h.available(loc_id).await, 0);
    assert_eq!(h.store.count_open(loc_id).await.unwrap(), 10);
}

#[tokio::test]
async fn test_two_hours_at_base_rate() {
    let h = Harness::new();
    let loc = h.location("Central", 3).await;
    let record_id = h.park(loc.id, "AB-123").await;

    h.clock.advance(Duration::hours(2));
    let receipt = h.engine.check_out(record_id, loc.id).await.unwrap();

    assert_eq!(receipt.cost, dec!(5.00));
    assert_eq!(receipt.hourly_rate, dec!(2.50));
    assert_eq!(receipt.billed_hours, dec!(2));
    assert_eq!(receipt.license_plate, "AB-123");
    assert_eq!(h.available(loc.id).await, 3);

    let stored = h.store.find_record(record_id).await.unwrap().unwrap();
    assert_eq!(stored.exit_time, Some(receipt.exit_time));
    assert_eq!(stored.cost, Some(dec!(5.00)));
}

#[tokio::test]
async fn test_ninety_minutes_at_ten() {
    let h = Harness::new();
    let loc = h.location("Central", 3).await;
    h.rates.set(dec!(10.00)).await.unwrap();
    let record_id = h.park(loc.id, "XY-9").await;

    h.clock.advance(Duration::minutes(90));
    let receipt = h.engine.check_out(record_id, loc.id).await.unwrap();
    assert_eq!(receipt.cost, dec!(15.00));
}

#[tokio::test]
async fn test_rate_change_applies_to_later_check_outs_only() {
    let h = Harness::new();
    let loc = h.location("Central", 3).await;
    let first = h.park(loc.id, "ONE").await;
    let second = h.park(loc.id, "TWO").await;

    h.clock.advance(Duration::hours(1));
    let early = h.engine.check_out(first, loc.id).await.unwrap();
    assert_eq!(early.cost, dec!(2.50));

    h.rates.set(dec!(4.00)).await.unwrap();
    let late = h.engine.check_out(second, loc.id).await.unwrap();
    assert_eq!(late.cost, dec!(4.00));

    let closed = h.store.find_record(first).await.unwrap().unwrap();
    assert_eq!(closed.cost, Some(dec!(2.50)));
}

#[tokio::test]
async fn test_no_double_check_out() {
    let h = Harness::new();
    let loc = h.location("Central", 3).await;
    let record_id = h.park(loc.id, "AB-123").await;

    h.clock.advance(Duration::minutes(30));
    h.engine.check_out(record_id, loc.id).await.unwrap();

    let err = h.engine.check_out(record_id, loc.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecordNotFoundOrClosed);
    assert_eq!(h.available(loc.id).await, 3);
}

#[tokio::test]
async fn test_check_out_unknown_record_or_location() {
    let h = Harness::new();
    let loc = h.location("Central", 3).await;
    let record_id = h.park(loc.id, "AB-123").await;
    h.clock.advance(Duration::minutes(5));

    let err = h
        .engine
        .check_out(OccupancyRecordId::new(), loc.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecordNotFoundOrClosed);

    let err = h
        .engine
        .check_out(record_id, LocationId::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecordNotFoundOrClosed);
}

#[tokio::test]
async fn test_check_out_from_wrong_location() {
    let h = Harness::new();
    let a = h.location("A", 3).await;
    let b = h.location("B", 3).await;
    let record_id = h.park(a.id, "AB-123").await;
    h.clock.advance(Duration::minutes(5));

    let err = h.engine.check_out(record_id, b.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecordNotFoundOrClosed);
    assert_eq!(h.available(a.id).await, 2);
    assert_eq!(h.available(b.id).await, 3);
}

#[tokio::test]
async fn test_clock_not_advanced_is_violation() {
    let h = Harness::new();
    let loc = h.location("Central", 3).await;
    let record_id = h.park(loc.id, "AB-123").await;

    let err = h.engine.check_out(record_id, loc.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConsistencyViolation);

    let record = h.store.find_record(record_id).await.unwrap().unwrap();
    assert!(record.is_open());
    assert_eq!(h.available(loc.id).await, 2);
}

#[tokio::test]
async fn test_broken_counter_is_not_clamped() {
    let h = Harness::new();
    let now = Utc::now();
    let broken = Location {
        id: LocationId::new(),
        name: "Tampered".to_string(),
        latitude: 0.0,
        longitude: 0.0,
        total_slots: 5,
        available_slots: 7,
        created_at: now,
        updated_at: now,
    };
    h.store.insert_raw_location(broken.clone());

    let err = h
        .engine
        .check_in(broken.id, EmployeeId::new(), "AB-123")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConsistencyViolation);
    assert!(err.is_fatal());
    assert_eq!(h.available(broken.id).await, 7);
    assert_eq!(h.store.count_open(broken.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_check_in_faults_roll_back() {
    for point in [
        FaultPoint::Begin,
        FaultPoint::AdjustAvailable,
        FaultPoint::InsertRecord,
        FaultPoint::Commit,
    ] {
        let h = Harness::new();
        let loc = h.location("Central", 3).await;
        h.store.faults().arm(point);

        let err = h
            .engine
            .check_in(loc.id, EmployeeId::new(), "AB-123")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unavailable, "fault at {point}");
        assert!(err.is_retryable());
        assert_eq!(h.available(loc.id).await, 3, "fault at {point}");
        assert_eq!(h.store.count_open(loc.id).await.unwrap(), 0, "fault at {point}");

        h.park(loc.id, "RETRY").await;
        assert_eq!(h.available(loc.id).await, 2, "retry after {point}");
    }
}

#[tokio::test]
async fn test_check_out_faults_roll_back() {
    for point in [
        FaultPoint::Begin,
        FaultPoint::CloseRecord,
        FaultPoint::AdjustAvailable,
        FaultPoint::Commit,
    ] {
        let h = Harness::new();
        let loc = h.location("Central", 3).await;
        let record_id = h.park(loc.id, "AB-123").await;
        h.clock.advance(Duration::hours(1));
        h.store.faults().arm(point);

        let err = h.engine.check_out(record_id, loc.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unavailable, "fault at {point}");
        assert_eq!(h.available(loc.id).await, 2, "fault at {point}");

        let record = h.store.find_record(record_id).await.unwrap().unwrap();
        assert!(record.is_open(), "fault at {point}");
        assert!(record.cost.is_none(), "fault at {point}");

        let receipt = h.engine.check_out(record_id, loc.id).await.unwrap();
        assert_eq!(receipt.cost, dec!(2.50), "retry after {point}");
        assert_eq!(h.available(loc.id).await, 3, "retry after {point}");
    }
}

#[tokio::test]
async fn test_locations_are_isolated() {
    let h = Harness::new();
    let a = h.location("A", 2).await;
    let b = h.location("B", 2).await;

    let record_id = h.park(a.id, "ONLY-A").await;
    h.park(a.id, "ALSO-A").await;
    assert_eq!(h.available(a.id).await, 0);
    assert_eq!(h.available(b.id).await, 2);

    h.clock.advance(Duration::minutes(10));
    h.engine.check_out(record_id, a.id).await.unwrap();
    assert_eq!(h.available(a.id).await, 1);
    assert_eq!(h.available(b.id).await, 2);
    assert_eq!(h.store.count_open(b.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_counter_conservation_over_a_day() {
    let h = Harness::new();
    let loc = h.location("Central", 4).await;
    let mut parked = Vec::new();

    for round in 0..12 {
        if round % 3 == 2 {
            let record_id: OccupancyRecordId = parked.remove(0);
            h.clock.advance(Duration::minutes(15));
            h.engine.check_out(record_id, loc.id).await.unwrap();
        } else if let Ok(record) = h
            .engine
            .check_in(loc.id, EmployeeId::new(), &format!("P-{round}"))
            .await
        {
            parked.push(record.id);
        }

        let available = h.available(loc.id).await;
        assert!((0..=4).contains(&available));
        assert_eq!(available, 4 - parked.len() as i32);
        assert_eq!(h.store.count_open(loc.id).await.unwrap(), parked.len() as u64);
    }
}

#[tokio::test]
async fn test_shrinking_location_is_not_clamped() {
    let h = Harness::new();
    let loc = h.location("Shrinking", 4).await;
    for plate in ["A", "B", "C"] {
        h.park(loc.id, plate).await;
    }

    let edited = h
        .store
        .update_location(
            loc.id,
            &UpdateLocation {
                name: loc.name.clone(),
                latitude: loc.latitude,
                longitude: loc.longitude,
                total_slots: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.available_slots, -1);

    let err = h
        .engine
        .check_in(loc.id, EmployeeId::new(), "D")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::CapacityExceeded);
}
