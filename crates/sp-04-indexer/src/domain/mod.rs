pub mod errors;
pub mod mapping;
pub mod report;
