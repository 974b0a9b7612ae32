// libs/availability-cell/src/services/slots.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::debug;
use uuid::Uuid;

use crate::models::{AvailabilityError, DayPlan, Slot, TimeRange};
use crate::services::schedule::ScheduleService;

/// Derives the bookable grid for a clinician-day. Generation is pure over
/// the day plan: the same schedule and parameters always produce the same
/// slot sequence, so callers can re-run it at validation time and at commit
/// time and agree.
pub struct SlotEngine {
    schedule_service: Arc<ScheduleService>,
    default_slot_minutes: i32,
}

impl SlotEngine {
    pub fn new(schedule_service: Arc<ScheduleService>, default_slot_minutes: i32) -> Self {
        Self {
            schedule_service,
            default_slot_minutes,
        }
    }

    pub fn default_slot_minutes(&self) -> i32 {
        self.default_slot_minutes
    }

    /// Generate the slot grid for one clinician-day, chronologically ordered.
    /// A closed day (no open intervals, or whole-day exception) yields an
    /// empty grid rather than an error.
    pub async fn generate_slots(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
        slot_minutes: Option<i32>,
    ) -> Result<Vec<Slot>, AvailabilityError> {
        let duration = slot_minutes.unwrap_or(self.default_slot_minutes);
        if duration <= 0 {
            return Err(AvailabilityError::InvalidAvailability(
                "Slot duration must be positive".to_string(),
            ));
        }

        let plan = self.schedule_service.day_plan(clinician_id, date).await?;
        let slots = slots_for_plan(&plan, duration);

        debug!(
            "Generated {} slots for clinician {} on {}",
            slots.len(),
            clinician_id,
            date
        );
        Ok(slots)
    }

    /// Grid positions as bare start times, for on-grid validation.
    pub async fn slot_starts(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, AvailabilityError> {
        let slots = self.generate_slots(clinician_id, date, None).await?;
        Ok(slots.into_iter().map(|slot| slot.start_time).collect())
    }
}

/// Walk each open interval from its start in fixed increments. A position is
/// emitted only when the whole slot fits inside the interval and does not
/// touch a break or a blocked window; partially covered positions are
/// dropped, never truncated.
fn slots_for_plan(plan: &DayPlan, duration_minutes: i32) -> Vec<Slot> {
    if plan.closed_all_day {
        return Vec::new();
    }

    let step = Duration::minutes(duration_minutes as i64);
    let mut slots = Vec::new();

    for window in &plan.open {
        let mut current = window.start;
        loop {
            // NaiveTime arithmetic wraps at midnight; a wrapped end means the
            // slot ran off the day.
            let (slot_end, wrapped) = current.overflowing_add_signed(step);
            if wrapped != 0 || slot_end > window.end {
                break;
            }

            let candidate = TimeRange::new(current, slot_end);
            let excluded = plan.breaks.iter().any(|range| range.overlaps(&candidate))
                || plan.blocked.iter().any(|range| range.overlaps(&candidate));

            if !excluded {
                slots.push(Slot {
                    clinician_id: plan.clinician_id,
                    date: plan.date,
                    start_time: current,
                    end_time: slot_end,
                });
            }

            current = slot_end;
        }
    }

    slots
}
