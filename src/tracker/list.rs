//! Lazy, auto-paginating tracker lists
//!
//! The tracker pages list endpoints with three response headers: the offset
//! of the page, how many items it returned, and the total. A `TrackerList`
//! holds the next offset to fetch plus the items of the last page that have
//! not been handed out yet, and only fetches when that buffer runs dry.

use super::client::TrackerClient;
use crate::error::{Error, Result};
use crate::pagination::ItemSource;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::debug;
use url::Url;

/// Header with the offset of the returned page
pub const OFFSET_HEADER: &str = "X-Tracker-Pagination-Offset";
/// Header with the number of items in the returned page
pub const RETURNED_HEADER: &str = "X-Tracker-Pagination-Returned";
/// Header with the total number of items
pub const TOTAL_HEADER: &str = "X-Tracker-Pagination-Total";

/// Pagination metadata of one upstream page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationMeta {
    pub offset: u64,
    pub returned: u64,
    pub total: u64,
}

impl PaginationMeta {
    /// Read the pagination headers; a missing header counts as zero
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        Ok(Self {
            offset: read_counter(headers, OFFSET_HEADER)?,
            returned: read_counter(headers, RETURNED_HEADER)?,
            total: read_counter(headers, TOTAL_HEADER)?,
        })
    }

    /// Offset of the following page, if there is one
    pub fn next_offset(&self) -> Option<u64> {
        // an empty page never advances, so it must end the list
        if self.returned == 0 {
            return None;
        }

        // counters past u64::MAX cannot name a real page
        let next = self.offset.checked_add(self.returned)?;
        (next < self.total).then_some(next)
    }
}

fn read_counter(headers: &HeaderMap, name: &str) -> Result<u64> {
    let Some(value) = headers.get(name) else {
        return Ok(0);
    };

    value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| Error::decode(format!("invalid {name} header: {value:?}")))
}

/// Where the list will continue once its buffer is drained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    /// Nothing fetched yet
    Start,
    /// Fetch the page at this offset
    Offset(u64),
    /// No upstream pages left
    Finished,
}

/// Lazy sequence of every item under a tracker resource
///
/// Not restartable: items that were handed out are gone. Build a fresh list
/// to start over.
#[derive(Debug)]
pub struct TrackerList {
    client: TrackerClient,
    resource: Url,
    buffered: VecDeque<Value>,
    continuation: Continuation,
    pages_fetched: u32,
}

impl TrackerList {
    /// Create a list over a resolved resource locator; nothing is fetched yet
    pub fn new(client: TrackerClient, resource: Url) -> Self {
        Self {
            client,
            resource,
            buffered: VecDeque::new(),
            continuation: Continuation::Start,
            pages_fetched: 0,
        }
    }

    /// Resource this list reads
    pub fn resource(&self) -> &Url {
        &self.resource
    }

    /// Number of upstream pages fetched so far
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Whether every item has been handed out
    pub fn is_finished(&self) -> bool {
        self.buffered.is_empty() && self.continuation == Continuation::Finished
    }

    /// Locator for a page; the offset replaces any query of the resource
    fn page_url(&self, offset: Option<u64>) -> Url {
        let mut url = self.resource.clone();
        if let Some(offset) = offset {
            url.set_query(Some(&format!("offset={offset}")));
        }
        url
    }

    async fn fetch_page(&mut self, offset: Option<u64>) -> Result<()> {
        let url = self.page_url(offset);
        let response = self.client.request(Method::GET, url, None).await?;

        let meta = PaginationMeta::from_headers(response.headers())?;
        let items: Vec<Value> = response.json().await?;
        self.pages_fetched += 1;

        debug!(
            "Fetched page {} of {}: offset={} returned={} total={}",
            self.pages_fetched,
            self.resource,
            meta.offset,
            meta.returned,
            meta.total
        );

        self.continuation = match meta.next_offset() {
            Some(next) => Continuation::Offset(next),
            None => Continuation::Finished,
        };
        self.buffered.extend(items);
        Ok(())
    }
}

#[async_trait]
impl ItemSource for TrackerList {
    async fn next_item(&mut self) -> Result<Option<Value>> {
        loop {
            if let Some(item) = self.buffered.pop_front() {
                return Ok(Some(item));
            }

            let offset = match self.continuation {
                Continuation::Finished => return Ok(None),
                Continuation::Start => None,
                Continuation::Offset(offset) => Some(offset),
            };

            // a failed fetch ends the list
            let current = std::mem::replace(&mut self.continuation, Continuation::Finished);
            if let Err(e) = self.fetch_page(offset).await {
                debug!("Tracker list {} aborted after {:?}: {e}", self.resource, current);
                return Err(e);
            }
        }
    }
}
