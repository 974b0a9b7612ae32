// libs/availability-cell/tests/schedule_test.rs
//
// Integration tests for schedule management and slot generation: weekly
// pattern validation, exception handling, and the derived bookable grid.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use availability_cell::models::{
    AddExceptionRequest, AvailabilityError, DaySchedule, SetAvailabilityRequest, TimeRange,
    WeeklySchedule,
};
use availability_cell::services::{ScheduleService, SlotEngine};

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

struct TestSetup {
    service: Arc<ScheduleService>,
    engine: SlotEngine,
    clinician_id: Uuid,
}

impl TestSetup {
    fn new() -> Self {
        let service = Arc::new(ScheduleService::new());
        let engine = SlotEngine::new(service.clone(), 30);

        Self {
            service,
            engine,
            clinician_id: Uuid::new_v4(),
        }
    }

    async fn with_week(week: WeeklySchedule) -> Self {
        let setup = Self::new();
        setup
            .service
            .set_availability(setup.clinician_id, SetAvailabilityRequest { week })
            .await
            .expect("Failed to store weekly schedule");
        setup
    }
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn range(sh: u32, sm: u32, eh: u32, em: u32) -> TimeRange {
    TimeRange::new(time(sh, sm), time(eh, em))
}

// 2025-09-01 is a Monday.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
}

fn sunday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 7).unwrap()
}

fn monday_morning_week() -> WeeklySchedule {
    WeeklySchedule {
        monday: DaySchedule {
            open: vec![range(9, 0, 12, 0)],
            breaks: vec![],
        },
        ..WeeklySchedule::default()
    }
}

fn monday_with_lunch_break_week() -> WeeklySchedule {
    WeeklySchedule {
        monday: DaySchedule {
            open: vec![range(9, 0, 13, 0)],
            breaks: vec![range(12, 0, 12, 30)],
        },
        ..WeeklySchedule::default()
    }
}

// ==============================================================================
// WEEKLY SCHEDULE MANAGEMENT
// ==============================================================================

#[tokio::test]
async fn test_set_availability_creates_record() {
    let setup = TestSetup::new();

    let record = setup
        .service
        .set_availability(
            setup.clinician_id,
            SetAvailabilityRequest {
                week: monday_morning_week(),
            },
        )
        .await
        .expect("Schedule should be accepted");

    assert_eq!(record.clinician_id, setup.clinician_id);
    assert!(record.is_enabled);
    assert!(record.exceptions.is_empty());
    assert_eq!(record.week.monday.open, vec![range(9, 0, 12, 0)]);
    assert!(record.week.tuesday.is_closed());
}

#[tokio::test]
async fn test_get_availability_unknown_clinician_returns_not_found() {
    let setup = TestSetup::new();

    let result = setup.service.get_availability(Uuid::new_v4()).await;
    assert_matches!(result.unwrap_err(), AvailabilityError::NotFound);
}

#[tokio::test]
async fn test_rejects_inverted_interval() {
    let setup = TestSetup::new();
    let week = WeeklySchedule {
        monday: DaySchedule {
            open: vec![range(12, 0, 9, 0)],
            breaks: vec![],
        },
        ..WeeklySchedule::default()
    };

    let result = setup
        .service
        .set_availability(setup.clinician_id, SetAvailabilityRequest { week })
        .await;
    assert_matches!(
        result.unwrap_err(),
        AvailabilityError::InvalidAvailability(_)
    );
}

#[tokio::test]
async fn test_rejects_overlapping_open_intervals() {
    let setup = TestSetup::new();
    let week = WeeklySchedule {
        monday: DaySchedule {
            open: vec![range(9, 0, 12, 0), range(11, 0, 14, 0)],
            breaks: vec![],
        },
        ..WeeklySchedule::default()
    };

    let result = setup
        .service
        .set_availability(setup.clinician_id, SetAvailabilityRequest { week })
        .await;
    assert_matches!(
        result.unwrap_err(),
        AvailabilityError::InvalidAvailability(_)
    );
}

#[tokio::test]
async fn test_accepts_touching_open_intervals() {
    // Half-open intervals: 09:00-12:00 and 12:00-14:00 share only a
    // boundary, which is not an overlap.
    let setup = TestSetup::new();
    let week = WeeklySchedule {
        monday: DaySchedule {
            open: vec![range(9, 0, 12, 0), range(12, 0, 14, 0)],
            breaks: vec![],
        },
        ..WeeklySchedule::default()
    };

    let result = setup
        .service
        .set_availability(setup.clinician_id, SetAvailabilityRequest { week })
        .await;
    assert!(result.is_ok(), "Touching intervals should be accepted");
}

#[tokio::test]
async fn test_weekday_lookup_returns_ordered_intervals() {
    use chrono::Weekday;

    // Intervals arrive unsorted and are normalized on write.
    let setup = TestSetup::with_week(WeeklySchedule {
        monday: DaySchedule {
            open: vec![range(14, 0, 17, 0), range(9, 0, 12, 0)],
            breaks: vec![range(10, 0, 10, 30)],
        },
        ..WeeklySchedule::default()
    })
    .await;

    let open = setup
        .service
        .open_intervals(setup.clinician_id, Weekday::Mon)
        .await
        .expect("Lookup should succeed");
    assert_eq!(open, vec![range(9, 0, 12, 0), range(14, 0, 17, 0)]);

    let breaks = setup
        .service
        .breaks(setup.clinician_id, Weekday::Mon)
        .await
        .expect("Lookup should succeed");
    assert_eq!(breaks, vec![range(10, 0, 10, 30)]);

    let closed = setup
        .service
        .open_intervals(setup.clinician_id, Weekday::Tue)
        .await
        .expect("Lookup should succeed");
    assert!(closed.is_empty(), "Unconfigured weekdays are closed");

    let result = setup.service.open_intervals(Uuid::new_v4(), Weekday::Mon).await;
    assert_matches!(result.unwrap_err(), AvailabilityError::NotFound);
}

#[tokio::test]
async fn test_rejects_break_outside_open_hours() {
    let setup = TestSetup::new();
    let week = WeeklySchedule {
        monday: DaySchedule {
            open: vec![range(9, 0, 12, 0)],
            breaks: vec![range(13, 0, 13, 30)],
        },
        ..WeeklySchedule::default()
    };

    let result = setup
        .service
        .set_availability(setup.clinician_id, SetAvailabilityRequest { week })
        .await;
    assert_matches!(
        result.unwrap_err(),
        AvailabilityError::InvalidAvailability(_)
    );
}

// ==============================================================================
// SLOT GENERATION
// ==============================================================================

#[tokio::test]
async fn test_monday_morning_yields_six_slots() {
    let setup = TestSetup::with_week(monday_morning_week()).await;

    let slots = setup
        .engine
        .generate_slots(setup.clinician_id, monday(), None)
        .await
        .expect("Slot generation should succeed");

    let starts: Vec<NaiveTime> = slots.iter().map(|s| s.start_time).collect();
    assert_eq!(
        starts,
        vec![
            time(9, 0),
            time(9, 30),
            time(10, 0),
            time(10, 30),
            time(11, 0),
            time(11, 30),
        ]
    );
    assert_eq!(slots.last().unwrap().end_time, time(12, 0));
}

#[tokio::test]
async fn test_slot_generation_is_deterministic() {
    let setup = TestSetup::with_week(monday_with_lunch_break_week()).await;

    let first = setup
        .engine
        .generate_slots(setup.clinician_id, monday(), None)
        .await
        .expect("First generation should succeed");
    let second = setup
        .engine
        .generate_slots(setup.clinician_id, monday(), None)
        .await
        .expect("Second generation should succeed");

    assert_eq!(first, second, "Same inputs must produce the same grid");
}

#[tokio::test]
async fn test_lunch_break_is_carved_out_of_grid() {
    let setup = TestSetup::with_week(monday_with_lunch_break_week()).await;

    let slots = setup
        .engine
        .generate_slots(setup.clinician_id, monday(), None)
        .await
        .expect("Slot generation should succeed");
    let starts: Vec<NaiveTime> = slots.iter().map(|s| s.start_time).collect();

    assert!(
        starts.contains(&time(11, 30)),
        "Slot ending exactly at the break start is bookable"
    );
    assert!(!starts.contains(&time(12, 0)), "Break window is excluded");
    assert!(!starts.contains(&time(12, 15)), "Off-grid break times never appear");
    assert!(
        starts.contains(&time(12, 30)),
        "Grid resumes when the break ends on a grid position"
    );
}

#[tokio::test]
async fn test_slot_starts_lists_bare_grid_positions() {
    let setup = TestSetup::with_week(monday_morning_week()).await;

    let starts = setup
        .engine
        .slot_starts(setup.clinician_id, monday())
        .await
        .expect("Slot generation should succeed");

    assert_eq!(
        starts,
        vec![
            time(9, 0),
            time(9, 30),
            time(10, 0),
            time(10, 30),
            time(11, 0),
            time(11, 30),
        ]
    );
}

#[tokio::test]
async fn test_custom_slot_duration_overrides_default() {
    let setup = TestSetup::with_week(monday_morning_week()).await;

    let slots = setup
        .engine
        .generate_slots(setup.clinician_id, monday(), Some(60))
        .await
        .expect("Slot generation should succeed");

    let starts: Vec<NaiveTime> = slots.iter().map(|s| s.start_time).collect();
    assert_eq!(starts, vec![time(9, 0), time(10, 0), time(11, 0)]);
}

#[tokio::test]
async fn test_non_positive_slot_duration_is_rejected() {
    let setup = TestSetup::with_week(monday_morning_week()).await;

    let result = setup
        .engine
        .generate_slots(setup.clinician_id, monday(), Some(0))
        .await;
    assert_matches!(
        result.unwrap_err(),
        AvailabilityError::InvalidAvailability(_)
    );
}

#[tokio::test]
async fn test_closed_day_yields_empty_grid() {
    let setup = TestSetup::with_week(monday_morning_week()).await;

    let slots = setup
        .engine
        .generate_slots(setup.clinician_id, sunday(), None)
        .await
        .expect("Slot generation should succeed");
    assert!(slots.is_empty(), "Days without open intervals have no slots");
}

// ==============================================================================
// SCHEDULE EXCEPTIONS
// ==============================================================================

#[tokio::test]
async fn test_whole_day_exception_empties_grid() {
    let setup = TestSetup::with_week(monday_morning_week()).await;

    setup
        .service
        .add_exception(
            setup.clinician_id,
            AddExceptionRequest {
                date: monday(),
                blocked: None,
                reason: Some("Annual leave".to_string()),
            },
        )
        .await
        .expect("Exception should be accepted");

    let slots = setup
        .engine
        .generate_slots(setup.clinician_id, monday(), None)
        .await
        .expect("Slot generation should succeed");
    assert!(slots.is_empty(), "Whole-day exceptions suppress every slot");
}

#[tokio::test]
async fn test_blocked_window_exception_carves_grid() {
    let setup = TestSetup::with_week(monday_morning_week()).await;

    setup
        .service
        .add_exception(
            setup.clinician_id,
            AddExceptionRequest {
                date: monday(),
                blocked: Some(range(10, 0, 11, 0)),
                reason: None,
            },
        )
        .await
        .expect("Exception should be accepted");

    let slots = setup
        .engine
        .generate_slots(setup.clinician_id, monday(), None)
        .await
        .expect("Slot generation should succeed");
    let starts: Vec<NaiveTime> = slots.iter().map(|s| s.start_time).collect();

    assert_eq!(
        starts,
        vec![time(9, 0), time(9, 30), time(11, 0), time(11, 30)]
    );
}

#[tokio::test]
async fn test_exception_only_affects_its_own_date() {
    let setup = TestSetup::with_week(monday_morning_week()).await;

    setup
        .service
        .add_exception(
            setup.clinician_id,
            AddExceptionRequest {
                date: monday(),
                blocked: None,
                reason: None,
            },
        )
        .await
        .expect("Exception should be accepted");

    // The following Monday is unaffected.
    let next_monday = NaiveDate::from_ymd_opt(2025, 9, 8).unwrap();
    let slots = setup
        .engine
        .generate_slots(setup.clinician_id, next_monday, None)
        .await
        .expect("Slot generation should succeed");
    assert_eq!(slots.len(), 6);
}

#[tokio::test]
async fn test_duplicate_exception_date_is_rejected() {
    let setup = TestSetup::with_week(monday_morning_week()).await;
    let request = AddExceptionRequest {
        date: monday(),
        blocked: None,
        reason: None,
    };

    setup
        .service
        .add_exception(setup.clinician_id, request.clone())
        .await
        .expect("First exception should be accepted");

    let result = setup.service.add_exception(setup.clinician_id, request).await;
    assert_matches!(
        result.unwrap_err(),
        AvailabilityError::InvalidAvailability(_)
    );
}

#[tokio::test]
async fn test_remove_exception_restores_grid() {
    let setup = TestSetup::with_week(monday_morning_week()).await;

    setup
        .service
        .add_exception(
            setup.clinician_id,
            AddExceptionRequest {
                date: monday(),
                blocked: None,
                reason: None,
            },
        )
        .await
        .expect("Exception should be accepted");

    setup
        .service
        .remove_exception(setup.clinician_id, monday())
        .await
        .expect("Exception should be removed");

    let slots = setup
        .engine
        .generate_slots(setup.clinician_id, monday(), None)
        .await
        .expect("Slot generation should succeed");
    assert_eq!(slots.len(), 6, "Grid returns once the exception is gone");

    // Removing again reports the missing exception.
    let result = setup
        .service
        .remove_exception(setup.clinician_id, monday())
        .await;
    assert_matches!(result.unwrap_err(), AvailabilityError::NotFound);
}

// ==============================================================================
// DISABLE / RE-ENABLE
// ==============================================================================

#[tokio::test]
async fn test_disable_hides_schedule_until_reset() {
    let setup = TestSetup::with_week(monday_morning_week()).await;

    setup
        .service
        .disable(setup.clinician_id)
        .await
        .expect("Disable should succeed");

    let result = setup.service.get_availability(setup.clinician_id).await;
    assert_matches!(result.unwrap_err(), AvailabilityError::NotFound);

    let slots = setup
        .engine
        .generate_slots(setup.clinician_id, monday(), None)
        .await;
    assert_matches!(slots.unwrap_err(), AvailabilityError::NotFound);

    // Setting a fresh schedule re-enables the clinician.
    setup
        .service
        .set_availability(
            setup.clinician_id,
            SetAvailabilityRequest {
                week: monday_morning_week(),
            },
        )
        .await
        .expect("Re-enable via set_availability should succeed");

    let record = setup
        .service
        .get_availability(setup.clinician_id)
        .await
        .expect("Record should be visible again");
    assert!(record.is_enabled);
}
