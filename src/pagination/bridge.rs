//! HTTP pagination bridge
//!
//! Exposes a lazy item sequence as resumable pages. Each response carries up
//! to `PAGE_SIZE` items and `Link` headers: `rel="first"` always, and
//! `rel="next"` with a fresh `resume` token while items remain.

use super::source::{IterationHandle, ItemSource};
use super::store::{CursorStore, CursorToken};
use crate::error::{Error, Result};
use axum::http::header::LINK;
use axum::http::{HeaderValue, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Items per response
pub const PAGE_SIZE: usize = 10;

/// Query parameter carrying the cursor token
pub const RESUME_PARAM: &str = "resume";

/// Store of cursors shared by all paginated endpoints
pub type Cursors = CursorStore<IterationHandle>;

/// One page of a paginated response
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Items of this page, in upstream order
    pub items: Vec<Value>,
    /// Request target with `resume` removed
    pub first: String,
    /// Request target resuming after this page, if items remain
    pub next: Option<String>,
}

impl Page {
    /// Token embedded in the next link
    pub fn next_token(&self) -> Option<CursorToken> {
        let next = self.next.as_deref()?;
        let url = Url::parse(&format!("{TARGET_BASE}{next}")).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == RESUME_PARAM)
            .map(|(_, v)| CursorToken::from(v.into_owned()))
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        let links = std::iter::once(link_header(&self.first, "first"))
            .chain(self.next.as_deref().map(|next| link_header(next, "next")))
            .collect::<Result<Vec<_>>>();

        let links = match links {
            Ok(links) => links,
            Err(e) => return e.into_response(),
        };

        let mut response = Json(self.items).into_response();
        for link in links {
            response.headers_mut().append(LINK, link);
        }
        response
    }
}

fn link_header(target: &str, rel: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!("<{target}>; rel=\"{rel}\""))
        .map_err(|e| Error::Other(format!("invalid link target {target}: {e}")))
}

/// Serve one page of a resumable sequence
///
/// With a `resume` token the matching handle is taken from `cursors`
/// (unknown or expired tokens fail with `Error::CursorGone`); without one,
/// `start` begins a fresh sequence. If items remain after the page, the
/// handle is registered again under a new token.
pub async fn paginate<F, S>(cursors: &Cursors, uri: &Uri, start: F) -> Result<Page>
where
    F: FnOnce() -> Result<S>,
    S: ItemSource + 'static,
{
    let target = RequestTarget::parse(uri)?;

    let mut handle = match target.resume_token() {
        Some(token) => cursors.resume(&token).ok_or(Error::CursorGone)?,
        None => IterationHandle::new(start()?),
    };

    // an error here drops the handle, so the sequence cannot be resumed
    let (items, exhausted) = handle.drain(PAGE_SIZE).await?;

    let next = if exhausted {
        None
    } else {
        let token = cursors.create(handle);
        Some(target.with_resume(&token))
    };

    debug!(
        "Served {} items for {}, more: {}",
        items.len(),
        target.url.path(),
        next.is_some()
    );

    Ok(Page {
        items,
        first: target.without_resume(),
        next,
    })
}

/// Placeholder origin for parsing origin-form request targets
const TARGET_BASE: &str = "http://localhost";

/// Request path and query, parsed for rewriting
struct RequestTarget {
    url: Url,
}

impl RequestTarget {
    fn parse(uri: &Uri) -> Result<Self> {
        // joined textually: a target starting with `//` is a path, not an authority
        let target = uri.path_and_query().map_or("/", |pq| pq.as_str());
        Ok(Self {
            url: Url::parse(&format!("{TARGET_BASE}{target}"))?,
        })
    }

    /// The `resume` parameter, ignoring empty values
    fn resume_token(&self) -> Option<CursorToken> {
        self.url
            .query_pairs()
            .find(|(k, v)| k == RESUME_PARAM && !v.is_empty())
            .map(|(_, v)| CursorToken::from(v.into_owned()))
    }

    fn without_resume(&self) -> String {
        self.rewrite(None)
    }

    fn with_resume(&self, token: &CursorToken) -> String {
        self.rewrite(Some(token))
    }

    /// Path and query with every `resume` parameter removed, then `token` appended
    fn rewrite(&self, token: Option<&CursorToken>) -> String {
        let mut pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(k, _)| k != RESUME_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if let Some(token) = token {
            pairs.push((RESUME_PARAM.to_string(), token.to_string()));
        }

        let mut url = self.url.clone();
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }

        match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        }
    }
}
