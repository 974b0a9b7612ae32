// libs/booking-cell/src/services/booking.rs
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use tokio::sync::{OwnedMutexGuard, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use availability_cell::{AvailabilityError, Slot, SlotEngine};
use shared_store::{IdempotencyLedger, PartitionKey, PartitionLockRegistry};

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, BookingError,
    CancelAppointmentRequest, ConflictCheckQuery, ConflictReport, DayScheduleSlot,
    DayScheduleView, RescheduleAppointmentRequest,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;

/// Owns the appointment set and serializes every mutation per
/// `(clinician_id, date)` partition. Each mutating operation acquires the
/// partition guard, re-checks conflicts against the committed state, and
/// only then commits, so no double-booking can occur even under high
/// concurrency. Reads go through the `RwLock` without the guard.
pub struct BookingService {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    locks: PartitionLockRegistry,
    ledger: IdempotencyLedger,
    slot_engine: Arc<SlotEngine>,
    conflicts: ConflictDetectionService,
    lifecycle: AppointmentLifecycleService,
}

impl BookingService {
    pub fn new(slot_engine: Arc<SlotEngine>, max_suggested_slots: usize) -> Self {
        Self {
            appointments: RwLock::new(HashMap::new()),
            locks: PartitionLockRegistry::new(),
            ledger: IdempotencyLedger::new(),
            slot_engine,
            conflicts: ConflictDetectionService::new(max_suggested_slots),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Book a new appointment. On conflict the error carries the full
    /// report with alternative slots; the service never silently books an
    /// alternative.
    #[instrument(skip(self, request))]
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        let slot_minutes = self.slot_engine.default_slot_minutes();
        let duration = request.duration_minutes.unwrap_or(slot_minutes);

        debug!(
            "Booking request for clinician {} on {} at {} ({} min)",
            request.clinician_id, request.date, request.start_time, duration
        );

        if request.reason.trim().is_empty() {
            return Err(BookingError::Validation(
                "A booking reason is required".to_string(),
            ));
        }

        // Step 1: Acquire the partition guard
        let key = PartitionKey::new(request.clinician_id, request.date);
        let _guard = self.locks.lock(key).await;

        // Step 2: Idempotent replay check under the guard
        if let Some(token) = request.request_token.as_deref() {
            if let Some(existing_id) = self.ledger.recorded_appointment(token).await {
                debug!(
                    "Request token replayed - returning appointment {}",
                    existing_id
                );
                let appointments = self.appointments.read().await;
                if let Some(existing) = appointments.get(&existing_id) {
                    return Ok(existing.clone());
                }
            }
        }

        // Step 3: Validate the slot against the generated grid
        let (end_time, grid) = self
            .validate_slot(
                request.clinician_id,
                request.date,
                request.start_time,
                duration,
            )
            .await?;

        // Step 4: Final conflict check against the committed partition
        let existing = self
            .appointments_for_day(request.clinician_id, request.date)
            .await;
        let report = self.conflicts.check_conflicts(
            &existing,
            &grid,
            request.start_time,
            end_time,
            duration,
            slot_minutes,
            None,
        );
        if report.has_conflict {
            return Err(BookingError::SchedulingConflict(report));
        }

        // Step 5: Commit and record the request token
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            clinician_id: request.clinician_id,
            patient_id: request.patient_id,
            date: request.date,
            start_time: request.start_time,
            duration_minutes: duration,
            status: AppointmentStatus::Scheduled,
            reason: request.reason,
            notes: request.notes,
            contact_ref: request.contact_ref,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };

        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment.clone());
        if let Some(token) = request.request_token.as_deref() {
            self.ledger.record(token, appointment.id).await;
        }

        info!(
            "Booked appointment {} for clinician {} on {} at {}",
            appointment.id, appointment.clinician_id, appointment.date, appointment.start_time
        );
        Ok(appointment)
    }

    /// Move an appointment to a new slot. Both the source and destination
    /// partition guards are held (in canonical order) so the move can never
    /// transiently double-book; on any failure the original appointment is
    /// untouched.
    #[instrument(skip(self))]
    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        let slot_minutes = self.slot_engine.default_slot_minutes();

        // Step 1: Guard both partitions. The appointment can move between
        // the lookup and the guard, so re-read and re-acquire until the
        // guard covers its actual partition.
        let (_guards, current) = loop {
            let snapshot = self.get_appointment(appointment_id).await?;
            let old_key = PartitionKey::new(snapshot.clinician_id, snapshot.date);
            let new_key = PartitionKey::new(snapshot.clinician_id, request.new_date);

            let guards = self.locks.lock_pair(old_key, new_key).await;
            let fresh = self.get_appointment(appointment_id).await?;
            if PartitionKey::new(fresh.clinician_id, fresh.date) == old_key {
                break (guards, fresh);
            }
        };

        // Step 2: Only appointments that still hold a slot can move
        if !self.lifecycle.is_active(&current.status) {
            return Err(BookingError::InvalidTransition {
                from: current.status,
                to: AppointmentStatus::Scheduled,
            });
        }

        // Step 3: Validate the destination slot
        let (end_time, grid) = self
            .validate_slot(
                current.clinician_id,
                request.new_date,
                request.new_start_time,
                current.duration_minutes,
            )
            .await?;

        // Step 4: Conflict check at the destination, ignoring the
        // appointment being moved
        let existing = self
            .appointments_for_day(current.clinician_id, request.new_date)
            .await;
        let report = self.conflicts.check_conflicts(
            &existing,
            &grid,
            request.new_start_time,
            end_time,
            current.duration_minutes,
            slot_minutes,
            Some(appointment_id),
        );
        if report.has_conflict {
            return Err(BookingError::SchedulingConflict(report));
        }

        // Step 5: Commit the move
        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(BookingError::NotFound)?;
        appointment.date = request.new_date;
        appointment.start_time = request.new_start_time;
        appointment.updated_at = Utc::now();

        info!(
            "Rescheduled appointment {} to {} at {}",
            appointment_id, appointment.date, appointment.start_time
        );
        Ok(appointment.clone())
    }

    /// Cancel an appointment, releasing its interval for future bookings.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        let (_guard, current) = self.lock_partition_of(appointment_id).await?;

        self.lifecycle
            .validate_status_transition(&current.status, &AppointmentStatus::Cancelled)?;

        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(BookingError::NotFound)?;
        appointment.status = AppointmentStatus::Cancelled;
        appointment.cancellation_reason = request.reason;
        appointment.updated_at = Utc::now();

        info!("Cancelled appointment {}", appointment_id);
        Ok(appointment.clone())
    }

    /// Apply a status transition along the forward-only lifecycle graph.
    pub async fn transition_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, BookingError> {
        let (_guard, current) = self.lock_partition_of(appointment_id).await?;

        self.lifecycle
            .validate_status_transition(&current.status, &new_status)?;

        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(BookingError::NotFound)?;
        appointment.status = new_status;
        appointment.updated_at = Utc::now();

        info!(
            "Appointment {} transitioned to {}",
            appointment_id, appointment.status
        );
        Ok(appointment.clone())
    }

    /// Advisory conflict probe. Runs the same grid and overlap code paths
    /// as `book_appointment` but takes no guard and never mutates; `book`
    /// re-validates under the guard regardless of what this reports.
    pub async fn check_conflict(
        &self,
        query: ConflictCheckQuery,
    ) -> Result<ConflictReport, BookingError> {
        let slot_minutes = self.slot_engine.default_slot_minutes();
        let duration = query.duration_minutes.unwrap_or(slot_minutes);

        let (end_time, grid) = self
            .validate_slot(query.clinician_id, query.date, query.start_time, duration)
            .await?;

        let existing = self
            .appointments_for_day(query.clinician_id, query.date)
            .await;
        Ok(self.conflicts.check_conflicts(
            &existing,
            &grid,
            query.start_time,
            end_time,
            duration,
            slot_minutes,
            None,
        ))
    }

    /// Render one clinician-day: every grid slot flagged with whether it is
    /// still bookable, plus the day's appointments.
    pub async fn day_schedule(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
    ) -> Result<DayScheduleView, BookingError> {
        let grid = self
            .slot_engine
            .generate_slots(clinician_id, date, None)
            .await
            .map_err(availability_error)?;
        let appointments = self.appointments_for_day(clinician_id, date).await;

        let slots = grid
            .iter()
            .map(|slot| {
                let occupying = appointments.iter().find(|appointment| {
                    self.conflicts.is_blocking_status(&appointment.status)
                        && self.conflicts.intervals_overlap(
                            slot.start_time,
                            slot.end_time,
                            appointment.start_time,
                            appointment.end_time(),
                        )
                });

                DayScheduleSlot {
                    start_time: slot.start_time,
                    end_time: slot.end_time,
                    is_available: occupying.is_none(),
                    appointment_id: occupying.map(|appointment| appointment.id),
                }
            })
            .collect();

        Ok(DayScheduleView {
            clinician_id,
            date,
            slots,
            appointments,
        })
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, BookingError> {
        let appointments = self.appointments.read().await;
        appointments
            .get(&appointment_id)
            .cloned()
            .ok_or(BookingError::NotFound)
    }

    /// All appointments on one clinician-day partition, ordered by start
    /// time.
    pub async fn appointments_for_day(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
    ) -> Vec<Appointment> {
        let appointments = self.appointments.read().await;
        let mut day: Vec<Appointment> = appointments
            .values()
            .filter(|appointment| {
                appointment.clinician_id == clinician_id && appointment.date == date
            })
            .cloned()
            .collect();
        day.sort_by_key(|appointment| appointment.start_time);
        day
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    /// Guard the appointment's current partition. Re-acquires when a
    /// concurrent reschedule moves the appointment while we wait for the
    /// lock.
    async fn lock_partition_of(
        &self,
        appointment_id: Uuid,
    ) -> Result<(OwnedMutexGuard<()>, Appointment), BookingError> {
        loop {
            let snapshot = self.get_appointment(appointment_id).await?;
            let key = PartitionKey::new(snapshot.clinician_id, snapshot.date);

            let guard = self.locks.lock(key).await;
            let fresh = self.get_appointment(appointment_id).await?;
            if PartitionKey::new(fresh.clinician_id, fresh.date) == key {
                return Ok((guard, fresh));
            }
        }
    }

    /// Check that `[start, start + duration)` lies on the bookable grid:
    /// duration is a positive slot multiple, the interval stays within the
    /// day, and every covered sub-slot was actually generated. Returns the
    /// interval end and the grid for subsequent conflict evaluation.
    async fn validate_slot(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: i32,
    ) -> Result<(NaiveTime, Vec<Slot>), BookingError> {
        let slot_minutes = self.slot_engine.default_slot_minutes();

        if duration_minutes <= 0 {
            return Err(BookingError::InvalidSlot(
                "Duration must be positive".to_string(),
            ));
        }
        if duration_minutes % slot_minutes != 0 {
            return Err(BookingError::InvalidSlot(format!(
                "Duration must be a multiple of {} minutes",
                slot_minutes
            )));
        }

        let (end_time, wrapped) =
            start_time.overflowing_add_signed(Duration::minutes(duration_minutes as i64));
        if wrapped != 0 {
            return Err(BookingError::InvalidSlot(
                "Appointment would run past the end of the day".to_string(),
            ));
        }

        let grid = self
            .slot_engine
            .generate_slots(clinician_id, date, None)
            .await
            .map_err(availability_error)?;

        let grid_starts: HashSet<NaiveTime> = grid.iter().map(|slot| slot.start_time).collect();
        if !self
            .conflicts
            .fits_grid(&grid_starts, start_time, duration_minutes, slot_minutes)
        {
            return Err(BookingError::InvalidSlot(
                "Requested time is not on the bookable grid for this clinician".to_string(),
            ));
        }

        Ok((end_time, grid))
    }
}

fn availability_error(err: AvailabilityError) -> BookingError {
    match err {
        AvailabilityError::NotFound => BookingError::ClinicianNotFound,
        AvailabilityError::InvalidAvailability(msg) => BookingError::Validation(msg),
    }
}
