// libs/availability-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::time::hhmm;

// ==============================================================================
// WEEKLY AVAILABILITY MODELS
// ==============================================================================

/// Half-open wall-clock interval: `start` is included, `end` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    /// Half-open overlap check: ranges that only touch at an endpoint
    /// do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Working pattern for a single weekday: the intervals the clinician is open
/// plus any recurring breaks carved out of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaySchedule {
    #[serde(default)]
    pub open: Vec<TimeRange>,
    #[serde(default)]
    pub breaks: Vec<TimeRange>,
}

impl DaySchedule {
    pub fn is_closed(&self) -> bool {
        self.open.is_empty()
    }
}

/// A clinician's recurring weekly pattern. Absent days are closed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklySchedule {
    #[serde(default)]
    pub monday: DaySchedule,
    #[serde(default)]
    pub tuesday: DaySchedule,
    #[serde(default)]
    pub wednesday: DaySchedule,
    #[serde(default)]
    pub thursday: DaySchedule,
    #[serde(default)]
    pub friday: DaySchedule,
    #[serde(default)]
    pub saturday: DaySchedule,
    #[serde(default)]
    pub sunday: DaySchedule,
}

impl WeeklySchedule {
    pub fn day(&self, weekday: Weekday) -> &DaySchedule {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn days(&self) -> [(&'static str, &DaySchedule); 7] {
        [
            ("monday", &self.monday),
            ("tuesday", &self.tuesday),
            ("wednesday", &self.wednesday),
            ("thursday", &self.thursday),
            ("friday", &self.friday),
            ("saturday", &self.saturday),
            ("sunday", &self.sunday),
        ]
    }

    pub fn days_mut(&mut self) -> [&mut DaySchedule; 7] {
        [
            &mut self.monday,
            &mut self.tuesday,
            &mut self.wednesday,
            &mut self.thursday,
            &mut self.friday,
            &mut self.saturday,
            &mut self.sunday,
        ]
    }
}

/// One-off deviation from the weekly pattern (vacation day, blocked window).
/// Without a time range the whole day is unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleException {
    pub date: NaiveDate,
    #[serde(default)]
    pub blocked: Option<TimeRange>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Persisted availability record for one clinician. Records are never
/// deleted; disabling keeps the schedule around for re-enabling later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicianAvailability {
    pub clinician_id: Uuid,
    pub week: WeeklySchedule,
    pub exceptions: Vec<ScheduleException>,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolved picture of one clinician-day: the weekly pattern joined with any
/// dated exceptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlan {
    pub clinician_id: Uuid,
    pub date: NaiveDate,
    pub open: Vec<TimeRange>,
    pub breaks: Vec<TimeRange>,
    pub blocked: Vec<TimeRange>,
    pub closed_all_day: bool,
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

/// A bookable grid position. Slots are derived from the weekly schedule on
/// demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub clinician_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    pub week: WeeklySchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddExceptionRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub blocked: Option<TimeRange>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    pub slot_minutes: Option<i32>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Clinician availability not found")]
    NotFound,

    #[error("Invalid availability: {0}")]
    InvalidAvailability(String),
}
