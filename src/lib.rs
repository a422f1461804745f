// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Tracker Gateway
//!
//! A small internal web gateway that files work requests with the project
//! tracker and pages tracker lists over HTTP.
//!
//! ## Features
//!
//! - **Work Requests**: Validated form submissions filed as chore stories
//! - **Lazy Upstream Lists**: Tracker pages are fetched only as items are pulled
//! - **Resumable Paging**: Single-use cursor tokens with `Link` headers
//! - **Short-Lived Cursors**: Idle cursors expire after five minutes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tracker_gateway::pagination::{paginate, Cursors};
//! use tracker_gateway::tracker::{TrackerClient, TrackerClientConfig};
//!
//! let client = TrackerClient::new(TrackerClientConfig::new("token"))?;
//! let cursors = Cursors::new();
//!
//! // First page, then follow `page.next` until it is None
//! let page = paginate(&cursors, &uri, || client.projects()).await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  GET /stories[?resume=T]          (cli::server, axum)        │
//! └───────────────────────────────┬──────────────────────────────┘
//!                                 │
//! ┌───────────────────────────────┴──────────────────────────────┐
//! │  paginate: resume or start → drain 10 (+1 lookahead) → link  │
//! ├──────────────────────────────┬───────────────────────────────┤
//! │  CursorStore                 │  IterationHandle              │
//! │  token → handle, TTL timer   │  Box<dyn ItemSource> + peek   │
//! └──────────────────────────────┴───────────────┬───────────────┘
//!                                                │
//! ┌──────────────────────────────────────────────┴───────────────┐
//! │  TrackerList: buffered page + next offset → TrackerClient    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: document error variants and config fields, then drop this allow

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the gateway
pub mod error;

/// Gateway configuration
pub mod config;

/// Project tracker client and lazy lists
pub mod tracker;

/// Cursor store and HTTP pagination bridge
pub mod pagination;

/// Work request validation
pub mod intake;

/// Command-line interface and HTTP server
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
