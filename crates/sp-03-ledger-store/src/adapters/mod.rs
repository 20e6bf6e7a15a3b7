#[cfg(feature = "rocksdb")]
pub mod rocksdb;
