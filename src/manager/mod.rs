//! Data Manager
//!
//! The facade workflows call to store and read versioned objects. Each call
//! creates one coordinator, so retry counters never leak between operations.
//! The gateway routes expose the same calls over HTTP.

pub mod handlers;
pub mod service;
pub mod types;

pub use service::DataManager;

#[cfg(test)]
mod tests;
