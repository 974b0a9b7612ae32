// libs/availability-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    AddExceptionRequest, AvailabilityError, SetAvailabilityRequest, SlotsQuery,
};
use crate::services::{ScheduleService, SlotEngine};

/// Shared state for the availability routes. The schedule service and slot
/// engine are built once and handed to the booking cell as well, so both
/// cells see the same records.
pub struct AvailabilityHandlers {
    schedule_service: Arc<ScheduleService>,
    slot_engine: Arc<SlotEngine>,
}

impl AvailabilityHandlers {
    pub fn new(config: &AppConfig) -> Self {
        let schedule_service = Arc::new(ScheduleService::new());
        let slot_engine = Arc::new(SlotEngine::new(
            schedule_service.clone(),
            config.slot_minutes,
        ));

        Self {
            schedule_service,
            slot_engine,
        }
    }

    pub fn schedule_service(&self) -> Arc<ScheduleService> {
        self.schedule_service.clone()
    }

    pub fn slot_engine(&self) -> Arc<SlotEngine> {
        self.slot_engine.clone()
    }
}

fn availability_error(err: AvailabilityError) -> AppError {
    match err {
        AvailabilityError::NotFound => {
            AppError::NotFound("Clinician availability not found".to_string())
        }
        AvailabilityError::InvalidAvailability(msg) => AppError::ValidationError(msg),
    }
}

// ==============================================================================
// AVAILABILITY MANAGEMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn set_availability(
    State(handlers): State<Arc<AvailabilityHandlers>>,
    Path(clinician_id): Path<Uuid>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let record = handlers
        .schedule_service
        .set_availability(clinician_id, request)
        .await
        .map_err(availability_error)?;

    Ok(Json(json!({
        "success": true,
        "availability": record,
        "message": "Availability updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(handlers): State<Arc<AvailabilityHandlers>>,
    Path(clinician_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let record = handlers
        .schedule_service
        .get_availability(clinician_id)
        .await
        .map_err(availability_error)?;

    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn get_slots(
    State(handlers): State<Arc<AvailabilityHandlers>>,
    Path(clinician_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = handlers
        .slot_engine
        .generate_slots(clinician_id, query.date, query.slot_minutes)
        .await
        .map_err(availability_error)?;

    Ok(Json(json!({
        "clinician_id": clinician_id,
        "date": query.date,
        "total": slots.len(),
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn add_exception(
    State(handlers): State<Arc<AvailabilityHandlers>>,
    Path(clinician_id): Path<Uuid>,
    Json(request): Json<AddExceptionRequest>,
) -> Result<Json<Value>, AppError> {
    let record = handlers
        .schedule_service
        .add_exception(clinician_id, request)
        .await
        .map_err(availability_error)?;

    Ok(Json(json!({
        "success": true,
        "availability": record,
        "message": "Exception added successfully"
    })))
}

#[axum::debug_handler]
pub async fn remove_exception(
    State(handlers): State<Arc<AvailabilityHandlers>>,
    Path((clinician_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<Value>, AppError> {
    let record = handlers
        .schedule_service
        .remove_exception(clinician_id, date)
        .await
        .map_err(|e| match e {
            AvailabilityError::NotFound => {
                AppError::NotFound("No exception recorded for this date".to_string())
            }
            other => availability_error(other),
        })?;

    Ok(Json(json!({
        "success": true,
        "availability": record,
        "message": "Exception removed successfully"
    })))
}

#[axum::debug_handler]
pub async fn disable_availability(
    State(handlers): State<Arc<AvailabilityHandlers>>,
    Path(clinician_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    handlers
        .schedule_service
        .disable(clinician_id)
        .await
        .map_err(availability_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability disabled"
    })))
}
