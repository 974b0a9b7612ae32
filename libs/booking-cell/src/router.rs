// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers::{self, BookingHandlers};

pub fn appointment_routes(handlers: Arc<BookingHandlers>) -> Router {
    Router::new()
        // Booking
        .route("/", post(handlers::book_appointment))
        // Day view and conflict probe
        .route("/day", get(handlers::get_day_schedule))
        .route("/conflicts/check", get(handlers::check_conflict))
        // Individual appointments
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route(
            "/{appointment_id}/status",
            patch(handlers::update_status),
        )
        .route(
            "/{appointment_id}/cancel",
            post(handlers::cancel_appointment),
        )
        .route(
            "/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .with_state(handlers)
}
