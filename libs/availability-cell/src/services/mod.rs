pub mod schedule;
pub mod slots;

pub use schedule::ScheduleService;
pub use slots::SlotEngine;
