/*!
 * Booking Cell
 *
 * Appointment booking with conflict detection and lifecycle management.
 * Every mutation is serialized per (clinician, date) partition and
 * re-checks conflicts against committed state inside the guard, so
 * concurrent requests for the same interval can never both succeed.
 */

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use handlers::BookingHandlers;
pub use models::*;
pub use router::appointment_routes;
pub use services::{AppointmentLifecycleService, BookingService, ConflictDetectionService};
