pub mod booking;
pub mod machinery;
pub mod notification;
pub mod user;
pub mod vegetable;
