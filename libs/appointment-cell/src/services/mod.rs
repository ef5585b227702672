// libs/appointment-cell/src/services/mod.rs
pub mod booking;
pub mod slot_time;

pub use booking::BookingOrchestrator;
pub use slot_time::FormatError;
