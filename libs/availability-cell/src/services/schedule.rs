// libs/availability-cell/src/services/schedule.rs
use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{
    AddExceptionRequest, AvailabilityError, ClinicianAvailability, DayPlan, DaySchedule,
    ScheduleException, SetAvailabilityRequest, TimeRange, WeeklySchedule,
};

/// Owns the availability records. Schedules are read-mostly: slot generation
/// and booking validation read them on every call, while edits are rare, so
/// the map sits behind a plain `RwLock` without partition locking.
pub struct ScheduleService {
    schedules: RwLock<HashMap<Uuid, ClinicianAvailability>>,
}

impl ScheduleService {
    pub fn new() -> Self {
        Self {
            schedules: RwLock::new(HashMap::new()),
        }
    }

    /// Replace a clinician's entire weekly pattern. Creates the record on
    /// first use and re-enables a previously disabled clinician.
    pub async fn set_availability(
        &self,
        clinician_id: Uuid,
        request: SetAvailabilityRequest,
    ) -> Result<ClinicianAvailability, AvailabilityError> {
        debug!("Updating weekly availability for clinician: {}", clinician_id);

        let week = normalize_week(request.week);
        validate_week(&week)?;

        let now = Utc::now();
        let mut schedules = self.schedules.write().await;
        let record = schedules
            .entry(clinician_id)
            .or_insert_with(|| ClinicianAvailability {
                clinician_id,
                week: WeeklySchedule::default(),
                exceptions: Vec::new(),
                is_enabled: true,
                created_at: now,
                updated_at: now,
            });

        record.week = week;
        record.is_enabled = true;
        record.updated_at = now;

        Ok(record.clone())
    }

    /// Fetch the full availability record. Disabled clinicians read as
    /// not found so callers cannot book against a retired schedule.
    pub async fn get_availability(
        &self,
        clinician_id: Uuid,
    ) -> Result<ClinicianAvailability, AvailabilityError> {
        let schedules = self.schedules.read().await;
        schedules
            .get(&clinician_id)
            .filter(|record| record.is_enabled)
            .cloned()
            .ok_or(AvailabilityError::NotFound)
    }

    /// Ordered open intervals for one weekday of the recurring pattern.
    pub async fn open_intervals(
        &self,
        clinician_id: Uuid,
        weekday: Weekday,
    ) -> Result<Vec<TimeRange>, AvailabilityError> {
        let record = self.get_availability(clinician_id).await?;
        Ok(record.week.day(weekday).open.clone())
    }

    /// Ordered break intervals for one weekday of the recurring pattern.
    pub async fn breaks(
        &self,
        clinician_id: Uuid,
        weekday: Weekday,
    ) -> Result<Vec<TimeRange>, AvailabilityError> {
        let record = self.get_availability(clinician_id).await?;
        Ok(record.week.day(weekday).breaks.clone())
    }

    /// Register a one-off exception: a whole day of leave, or a blocked
    /// window within the day.
    pub async fn add_exception(
        &self,
        clinician_id: Uuid,
        request: AddExceptionRequest,
    ) -> Result<ClinicianAvailability, AvailabilityError> {
        debug!(
            "Adding schedule exception for clinician {} on {}",
            clinician_id, request.date
        );

        if let Some(blocked) = &request.blocked {
            if !blocked.is_well_formed() {
                return Err(AvailabilityError::InvalidAvailability(
                    "Blocked range start must be before its end".to_string(),
                ));
            }
        }

        let mut schedules = self.schedules.write().await;
        let record = schedules
            .get_mut(&clinician_id)
            .filter(|record| record.is_enabled)
            .ok_or(AvailabilityError::NotFound)?;

        if record
            .exceptions
            .iter()
            .any(|exception| exception.date == request.date)
        {
            return Err(AvailabilityError::InvalidAvailability(
                "An exception already exists for this date".to_string(),
            ));
        }

        record.exceptions.push(ScheduleException {
            date: request.date,
            blocked: request.blocked,
            reason: request.reason,
        });
        record.exceptions.sort_by_key(|exception| exception.date);
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    pub async fn remove_exception(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
    ) -> Result<ClinicianAvailability, AvailabilityError> {
        debug!(
            "Removing schedule exception for clinician {} on {}",
            clinician_id, date
        );

        let mut schedules = self.schedules.write().await;
        let record = schedules
            .get_mut(&clinician_id)
            .filter(|record| record.is_enabled)
            .ok_or(AvailabilityError::NotFound)?;

        let before = record.exceptions.len();
        record.exceptions.retain(|exception| exception.date != date);

        if record.exceptions.len() == before {
            return Err(AvailabilityError::NotFound);
        }

        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    /// Soft-disable a clinician. The record stays so the schedule survives a
    /// later re-enable via `set_availability`.
    pub async fn disable(&self, clinician_id: Uuid) -> Result<(), AvailabilityError> {
        let mut schedules = self.schedules.write().await;
        let record = schedules
            .get_mut(&clinician_id)
            .ok_or(AvailabilityError::NotFound)?;

        if record.is_enabled {
            warn!("Disabling availability for clinician {}", clinician_id);
            record.is_enabled = false;
            record.updated_at = Utc::now();
        }

        Ok(())
    }

    /// Resolve one clinician-day: the weekday's pattern joined with any
    /// exception recorded for that exact date.
    pub async fn day_plan(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
    ) -> Result<DayPlan, AvailabilityError> {
        let record = self.get_availability(clinician_id).await?;
        let day = record.week.day(date.weekday());

        let mut blocked = Vec::new();
        let mut closed_all_day = false;
        for exception in record.exceptions.iter().filter(|e| e.date == date) {
            match &exception.blocked {
                Some(range) => blocked.push(*range),
                None => closed_all_day = true,
            }
        }

        Ok(DayPlan {
            clinician_id,
            date,
            open: day.open.clone(),
            breaks: day.breaks.clone(),
            blocked,
            closed_all_day,
        })
    }
}

impl Default for ScheduleService {
    fn default() -> Self {
        Self::new()
    }
}

// ==============================================================================
// WEEK VALIDATION
// ==============================================================================

fn normalize_week(mut week: WeeklySchedule) -> WeeklySchedule {
    for day in week.days_mut() {
        day.open.sort_by_key(|range| range.start);
        day.breaks.sort_by_key(|range| range.start);
    }
    week
}

fn validate_week(week: &WeeklySchedule) -> Result<(), AvailabilityError> {
    for (name, day) in week.days() {
        validate_day(name, day)?;
    }
    Ok(())
}

fn validate_day(name: &str, day: &DaySchedule) -> Result<(), AvailabilityError> {
    for range in day.open.iter().chain(day.breaks.iter()) {
        if !range.is_well_formed() {
            warn!("Rejecting schedule for {}: empty or inverted range", name);
            return Err(AvailabilityError::InvalidAvailability(format!(
                "{}: interval start must be before its end",
                name
            )));
        }
    }

    // Ranges are sorted by start, so overlap can only happen between
    // neighbours.
    for pair in day.open.windows(2) {
        if pair[0].overlaps(&pair[1]) {
            return Err(AvailabilityError::InvalidAvailability(format!(
                "{}: open intervals overlap",
                name
            )));
        }
    }

    for break_range in &day.breaks {
        let inside_open = day.open.iter().any(|open| open.contains(break_range));
        if !inside_open {
            return Err(AvailabilityError::InvalidAvailability(format!(
                "{}: break must fall inside an open interval",
                name
            )));
        }
    }

    Ok(())
}
