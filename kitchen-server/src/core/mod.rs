//! Core - configuration, state, errors, server and background tasks
//!
//! - [`Config`] - environment-driven settings
//! - [`ServerState`] - shared service handles
//! - [`Server`] - HTTP server
//! - [`ServerError`] - API error type
//! - [`BackgroundTasks`] - task spawning and graceful shutdown
//! - [`TaskRegistry`] - per-task status for `/health`

pub mod config;
pub mod error;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
pub use tasks::{BackgroundTasks, TaskKind, TaskRegistry, TaskReport, TaskStatus};
