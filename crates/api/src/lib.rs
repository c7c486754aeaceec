//! Trigger gateway HTTP server.
//!
//! Endpoints:
//! - POST /webhook — bot update that drains one queue row
//! - GET  /health  — liveness probe

pub mod gateway;
pub mod middleware;
pub mod routes;
pub mod state;
