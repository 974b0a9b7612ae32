// libs/availability-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{self, AvailabilityHandlers};

pub fn availability_routes(handlers: Arc<AvailabilityHandlers>) -> Router {
    Router::new()
        // Weekly schedule management
        .route("/clinicians/{clinician_id}", put(handlers::set_availability))
        .route("/clinicians/{clinician_id}", get(handlers::get_availability))
        .route(
            "/clinicians/{clinician_id}/disable",
            post(handlers::disable_availability),
        )
        // Bookable slot generation
        .route("/clinicians/{clinician_id}/slots", get(handlers::get_slots))
        // One-off exceptions
        .route(
            "/clinicians/{clinician_id}/exceptions",
            post(handlers::add_exception),
        )
        .route(
            "/clinicians/{clinician_id}/exceptions/{date}",
            delete(handlers::remove_exception),
        )
        .with_state(handlers)
}
