//! Shared configuration, error, and domain types for the queue-drain worker.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
