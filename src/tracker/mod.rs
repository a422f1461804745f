//! Project tracker module
//!
//! Client for the upstream project-tracking service.
//!
//! # Features
//!
//! - **Token Authentication**: Every request carries the tracker token header
//! - **Lazy Lists**: `TrackerList` walks upstream pages only as items are pulled
//! - **Chores**: Work requests are filed as chore stories
//! - **Rate Limiting**: Optional token bucket rate limiter using governor

mod client;
mod list;
mod rate_limit;

pub use client::{
    TrackerClient, TrackerClientConfig, TrackerProject, DEFAULT_BASE_URL, TOKEN_HEADER,
};
pub use list::{PaginationMeta, TrackerList, OFFSET_HEADER, RETURNED_HEADER, TOTAL_HEADER};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
