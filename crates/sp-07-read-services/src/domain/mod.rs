pub mod aggregate;
pub mod errors;
pub mod views;
