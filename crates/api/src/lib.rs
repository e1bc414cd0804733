//! Radio API server library.
//!
//! Exposes the building blocks (config, state, error handling, engine,
//! routes) so integration tests and the binary entrypoint can both use them.

pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
