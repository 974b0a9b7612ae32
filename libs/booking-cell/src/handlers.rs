// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use availability_cell::SlotEngine;
use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    BookAppointmentRequest, BookingError, CancelAppointmentRequest, ConflictCheckQuery,
    DayScheduleQuery, RescheduleAppointmentRequest, UpdateStatusRequest,
};
use crate::services::BookingService;

/// Shared state for the appointment routes. The booking service reads the
/// availability cell's slot engine, so both cells agree on the grid.
pub struct BookingHandlers {
    booking_service: Arc<BookingService>,
}

impl BookingHandlers {
    pub fn new(config: &AppConfig, slot_engine: Arc<SlotEngine>) -> Self {
        Self {
            booking_service: Arc::new(BookingService::new(
                slot_engine,
                config.max_suggested_slots,
            )),
        }
    }
}

fn booking_error(err: BookingError) -> AppError {
    match err {
        BookingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        BookingError::ClinicianNotFound => {
            AppError::NotFound("Clinician availability not found".to_string())
        }
        BookingError::InvalidSlot(msg) => AppError::BadRequest(msg),
        BookingError::SchedulingConflict(report) => AppError::SchedulingConflict {
            message: "Requested slot conflicts with an existing appointment".to_string(),
            conflicting_appointment_ids: report.conflicting_appointment_ids,
            suggested_slots: serde_json::to_value(&report.suggested_slots)
                .unwrap_or_default(),
        },
        err @ BookingError::InvalidTransition { .. } => AppError::BadRequest(err.to_string()),
        BookingError::Validation(msg) => AppError::ValidationError(msg),
    }
}

// ==============================================================================
// APPOINTMENT BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(handlers): State<Arc<BookingHandlers>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = handlers
        .booking_service
        .book_appointment(request)
        .await
        .map_err(booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(handlers): State<Arc<BookingHandlers>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = handlers
        .booking_service
        .get_appointment(appointment_id)
        .await
        .map_err(booking_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_day_schedule(
    State(handlers): State<Arc<BookingHandlers>>,
    Query(query): Query<DayScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    let view = handlers
        .booking_service
        .day_schedule(query.clinician_id, query.date)
        .await
        .map_err(booking_error)?;

    Ok(Json(json!(view)))
}

#[axum::debug_handler]
pub async fn check_conflict(
    State(handlers): State<Arc<BookingHandlers>>,
    Query(query): Query<ConflictCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let report = handlers
        .booking_service
        .check_conflict(query)
        .await
        .map_err(booking_error)?;

    Ok(Json(json!(report)))
}

#[axum::debug_handler]
pub async fn update_status(
    State(handlers): State<Arc<BookingHandlers>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = handlers
        .booking_service
        .transition_status(appointment_id, request.status)
        .await
        .map_err(booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment status updated"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(handlers): State<Arc<BookingHandlers>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = handlers
        .booking_service
        .cancel_appointment(appointment_id, request)
        .await
        .map_err(booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(handlers): State<Arc<BookingHandlers>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = handlers
        .booking_service
        .reschedule_appointment(appointment_id, request)
        .await
        .map_err(booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled successfully"
    })))
}
