pub mod admin;
pub mod auth;
pub mod bookings;
pub mod disease;
pub mod machinery;
pub mod notifications;
pub mod users;
pub mod vegetables;
