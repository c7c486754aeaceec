//! Queue client: the pending-job list the worker drains one row at a time.
//!
//! - [`sheets::SheetsQueue`] talks to a Google Sheets tab over the v4 REST API.
//! - [`memory::InMemoryQueue`] keeps rows in process.

pub mod auth;
pub mod memory;
pub mod sheets;

pub use memory::InMemoryQueue;
pub use sheets::SheetsQueue;
