//! Turbocache Server Library
//!
//! HTTP front end for the team-scoped artifact store: routing, bearer token
//! checks and environment configuration.

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod types;

pub use config::Config;
pub use error::{AppError, Result, ServerError};
pub use server::{create_router, start_server, ServerState, SharedState};
