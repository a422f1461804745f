//! Item sources and iteration handles
//!
//! An `ItemSource` produces the next item or signals completion. The bridge
//! wraps every source in an `IterationHandle`, which adds one item of
//! lookahead so a page that ends exactly on the last item is recognised as
//! the end of the sequence.

use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::stream::{self, Stream};
use serde_json::Value;
use std::collections::VecDeque;

/// A lazy, finite sequence of JSON items
#[async_trait]
pub trait ItemSource: Send {
    /// Pull the next item, or `None` once the sequence is complete
    async fn next_item(&mut self) -> Result<Option<Value>>;
}

/// Type-erased item source
pub type BoxedItemSource = Box<dyn ItemSource>;

#[async_trait]
impl<S: ItemSource + ?Sized> ItemSource for Box<S> {
    async fn next_item(&mut self) -> Result<Option<Value>> {
        (**self).next_item().await
    }
}

/// Adapt a source into a `Stream`, ending after the first error
pub fn into_stream<S: ItemSource>(source: S) -> impl Stream<Item = Result<Value>> + Send {
    stream::unfold(Some(source), |state| async move {
        let mut source = state?;
        match source.next_item().await {
            Ok(Some(item)) => Some((Ok(item), Some(source))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
}

/// In-memory item source
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    items: VecDeque<Value>,
}

impl StaticSource {
    /// Create a source yielding `items` in order
    pub fn new(items: impl IntoIterator<Item = Value>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ItemSource for StaticSource {
    async fn next_item(&mut self) -> Result<Option<Value>> {
        Ok(self.items.pop_front())
    }
}

/// Result of looking one item ahead
#[derive(Debug)]
enum Peeked {
    Item(Value),
    Failed(Error),
    End,
}

/// A paused sequence held between HTTP requests
///
/// Not shareable: at most one request may advance a handle at a time, which
/// the cursor store guarantees by handing it out to a single resumer.
pub struct IterationHandle {
    source: BoxedItemSource,
    peeked: Option<Peeked>,
}

impl IterationHandle {
    /// Wrap a freshly started source
    pub fn new(source: impl ItemSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            peeked: None,
        }
    }

    /// Check whether another item follows, pulling it ahead if needed
    ///
    /// A failed pull counts as "more": the error is kept and returned by the
    /// next `next_item` call, so it surfaces on the request that would have
    /// received the item.
    pub async fn has_more(&mut self) -> bool {
        if self.peeked.is_none() {
            self.peeked = Some(match self.source.next_item().await {
                Ok(Some(item)) => Peeked::Item(item),
                Ok(None) => Peeked::End,
                Err(e) => Peeked::Failed(e),
            });
        }

        !matches!(self.peeked, Some(Peeked::End))
    }

    /// Pull up to `limit` items; the flag is true when the sequence is exhausted
    pub async fn drain(&mut self, limit: usize) -> Result<(Vec<Value>, bool)> {
        let mut items = Vec::with_capacity(limit);

        while items.len() < limit {
            match self.next_item().await? {
                Some(item) => items.push(item),
                None => return Ok((items, true)),
            }
        }

        let exhausted = !self.has_more().await;
        Ok((items, exhausted))
    }
}

#[async_trait]
impl ItemSource for IterationHandle {
    async fn next_item(&mut self) -> Result<Option<Value>> {
        match self.peeked.take() {
            Some(Peeked::Item(item)) => Ok(Some(item)),
            Some(Peeked::Failed(e)) => Err(e),
            Some(Peeked::End) => {
                self.peeked = Some(Peeked::End);
                Ok(None)
            }
            None => self.source.next_item().await,
        }
    }
}

impl std::fmt::Debug for IterationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterationHandle")
            .field("peeked", &self.peeked)
            .finish_non_exhaustive()
    }
}
