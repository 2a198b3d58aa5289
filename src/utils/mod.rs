pub mod booking;
pub mod fields;
pub mod geo;
pub mod jwt;
pub mod password;
pub mod search;

#[cfg(test)]
pub(crate) mod fixtures;
