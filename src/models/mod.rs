pub mod booking;
pub mod event;
pub mod payment;
pub mod review;
pub mod user;

pub use booking::{Booking, BookingStatus};
pub use event::{Category, Event};
pub use payment::{Payment, PaymentStatus};
pub use review::{Review, ReviewWithAuthor};
pub use user::User;
