pub mod availability;
pub mod bookings;
pub mod businesses;
pub mod catalog;
pub mod public;
pub mod slots;
