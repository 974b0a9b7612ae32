use std::sync::Arc;

use axum::{
    Json,
    Router,
    routing::get,
};
use serde_json::json;

use availability_cell::handlers::AvailabilityHandlers;
use availability_cell::router::availability_routes;
use booking_cell::handlers::BookingHandlers;
use booking_cell::router::appointment_routes;
use shared_config::AppConfig;

pub fn create_router(config: &AppConfig) -> Router {
    // Both cells share one slot engine so the bookable grid is agreed on.
    let availability = Arc::new(AvailabilityHandlers::new(config));
    let booking = Arc::new(BookingHandlers::new(config, availability.slot_engine()));

    Router::new()
        .route("/", get(|| async { "Appointment scheduler API is running!" }))
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/availability", availability_routes(availability))
        .nest("/appointments", appointment_routes(booking))
}
