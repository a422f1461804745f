//! Pagination module
//!
//! Bridges lazy, upstream-backed item sequences to a resumable HTTP paging
//! protocol.
//!
//! # Overview
//!
//! - `ItemSource` - Capability: produce the next item or signal completion
//! - `IterationHandle` - A paused sequence with one item of lookahead
//! - `CursorStore` - Short-lived registry of handles keyed by random tokens
//! - `paginate` - Per-request drain: resume or start, take a page, re-register
//!
//! Tokens are single use. Every page that leaves items behind is registered
//! under a new token, and resuming removes the old one before the sequence
//! advances.

mod bridge;
mod source;
mod store;

pub use bridge::{paginate, Cursors, Page, PAGE_SIZE, RESUME_PARAM};
pub use source::{into_stream, BoxedItemSource, ItemSource, IterationHandle, StaticSource};
pub use store::{CursorStore, CursorToken, CURSOR_TTL};
