/*!
 * Availability Cell
 *
 * Owns clinician working hours: weekly schedules with per-day open
 * intervals and breaks, one-off date exceptions, and the generation of
 * bookable slots on a fixed grid. The booking cell consumes the slot
 * engine exposed here when validating appointment requests.
 */

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use handlers::AvailabilityHandlers;
pub use models::*;
pub use router::availability_routes;
pub use services::{ScheduleService, SlotEngine};
