// libs/booking-cell/src/services/conflict.rs
use std::collections::HashSet;

use chrono::{Duration, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use availability_cell::Slot;

use crate::models::{Appointment, AppointmentStatus, ConflictReport, SuggestedSlot};

/// Pure interval and grid arithmetic for conflict detection. All checks run
/// over a caller-supplied partition snapshot so the booking service can
/// evaluate them inside its atomic section.
pub struct ConflictDetectionService {
    max_suggested_slots: usize,
}

impl ConflictDetectionService {
    pub fn new(max_suggested_slots: usize) -> Self {
        Self { max_suggested_slots }
    }

    /// Build the full conflict picture for a requested interval: the ids of
    /// blocking appointments it overlaps, plus alternative slots when it
    /// does conflict.
    pub fn check_conflicts(
        &self,
        existing: &[Appointment],
        grid: &[Slot],
        requested_start: NaiveTime,
        requested_end: NaiveTime,
        duration_minutes: i32,
        slot_minutes: i32,
        exclude_appointment_id: Option<Uuid>,
    ) -> ConflictReport {
        debug!(
            "Checking conflicts for interval {} - {} against {} appointments",
            requested_start,
            requested_end,
            existing.len()
        );

        let conflicting_appointment_ids = self.conflicting_ids(
            existing,
            requested_start,
            requested_end,
            exclude_appointment_id,
        );
        let has_conflict = !conflicting_appointment_ids.is_empty();

        let suggested_slots = if has_conflict {
            warn!(
                "Conflict detected at {} - {} conflicting appointments",
                requested_start,
                conflicting_appointment_ids.len()
            );
            self.generate_alternative_slots(
                existing,
                grid,
                requested_start,
                duration_minutes,
                slot_minutes,
                exclude_appointment_id,
            )
        } else {
            vec![]
        };

        ConflictReport {
            has_conflict,
            conflicting_appointment_ids,
            suggested_slots,
        }
    }

    /// Ids of blocking appointments overlapping the interval, ordered by
    /// start time.
    pub fn conflicting_ids(
        &self,
        existing: &[Appointment],
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_appointment_id: Option<Uuid>,
    ) -> Vec<Uuid> {
        let mut conflicting: Vec<&Appointment> = existing
            .iter()
            .filter(|appointment| Some(appointment.id) != exclude_appointment_id)
            .filter(|appointment| self.is_blocking_status(&appointment.status))
            .filter(|appointment| {
                self.intervals_overlap(
                    start_time,
                    end_time,
                    appointment.start_time,
                    appointment.end_time(),
                )
            })
            .collect();

        conflicting.sort_by_key(|appointment| appointment.start_time);
        conflicting
            .into_iter()
            .map(|appointment| appointment.id)
            .collect()
    }

    /// Half-open overlap: two intervals conflict only when each starts
    /// before the other ends. Touching endpoints never conflict.
    pub fn intervals_overlap(
        &self,
        start1: NaiveTime,
        end1: NaiveTime,
        start2: NaiveTime,
        end2: NaiveTime,
    ) -> bool {
        start1 < end2 && start2 < end1
    }

    /// Cancelled appointments release their interval; every other status
    /// keeps blocking it.
    pub fn is_blocking_status(&self, status: &AppointmentStatus) -> bool {
        matches!(
            status,
            AppointmentStatus::Scheduled
                | AppointmentStatus::InProgress
                | AppointmentStatus::Completed
        )
    }

    /// True when `[start, start + duration)` is covered by consecutive grid
    /// slots. Duration must already be a positive multiple of the slot
    /// length.
    pub fn fits_grid(
        &self,
        grid_starts: &HashSet<NaiveTime>,
        start: NaiveTime,
        duration_minutes: i32,
        slot_minutes: i32,
    ) -> bool {
        let step = Duration::minutes(slot_minutes as i64);
        let mut current = start;
        let mut remaining = duration_minutes;

        loop {
            if !grid_starts.contains(&current) {
                return false;
            }
            remaining -= slot_minutes;
            if remaining <= 0 {
                return true;
            }

            // A wrapped addition means the next sub-slot would start past
            // midnight.
            let (next, wrapped) = current.overflowing_add_signed(step);
            if wrapped != 0 {
                return false;
            }
            current = next;
        }
    }

    /// Free alternatives on the same clinician-day, closest to the
    /// requested start first; equal distances prefer the earlier slot.
    fn generate_alternative_slots(
        &self,
        existing: &[Appointment],
        grid: &[Slot],
        requested_start: NaiveTime,
        duration_minutes: i32,
        slot_minutes: i32,
        exclude_appointment_id: Option<Uuid>,
    ) -> Vec<SuggestedSlot> {
        let grid_starts: HashSet<NaiveTime> = grid.iter().map(|slot| slot.start_time).collect();
        let mut candidates = Vec::new();

        for slot in grid {
            let start = slot.start_time;
            if !self.fits_grid(&grid_starts, start, duration_minutes, slot_minutes) {
                continue;
            }

            let end = start + Duration::minutes(duration_minutes as i64);
            if self
                .conflicting_ids(existing, start, end, exclude_appointment_id)
                .is_empty()
            {
                candidates.push(SuggestedSlot {
                    date: slot.date,
                    start_time: start,
                    end_time: end,
                });
            }
        }

        candidates.sort_by_key(|candidate| {
            let distance = candidate
                .start_time
                .signed_duration_since(requested_start)
                .num_minutes()
                .abs();
            (distance, candidate.start_time)
        });
        candidates.truncate(self.max_suggested_slots);
        candidates
    }
}
