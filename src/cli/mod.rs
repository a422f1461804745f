//! CLI module
//!
//! Command-line interface for the gateway.
//!
//! # Commands
//!
//! - `serve` - Start the HTTP gateway
//! - `projects` - List tracker projects
//! - `stories` - List the stories of the configured project

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands};
pub use runner::Runner;
pub use server::{router, serve, AppState};
