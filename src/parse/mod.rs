pub mod datetime;
pub mod gps;
