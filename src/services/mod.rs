pub mod analytics;
pub mod availability;
pub mod bookings;
pub mod events;
pub mod payments;
pub mod reviews;
