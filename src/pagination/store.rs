//! Cursor store
//!
//! Process-wide registry of paused iteration handles keyed by random tokens.
//! Every entry owns the timer that evicts it. Timers are keyed by the entry
//! generation rather than the token, so a stale timer can never remove a
//! later entry, and any other removal path aborts the timer.

use rand::RngCore;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::debug;

/// Idle time after which an unresumed cursor is dropped
pub const CURSOR_TTL: Duration = Duration::from_secs(5 * 60);

/// Random bytes per token
const TOKEN_BYTES: usize = 16;

/// Opaque, unguessable cursor reference handed to clients
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CursorToken(String);

impl CursorToken {
    /// Generate a fresh token: 16 random bytes as lowercase hex
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);

        let mut hex = String::with_capacity(TOKEN_BYTES * 2);
        for byte in bytes {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    /// Token as sent to clients
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CursorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CursorToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CursorToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

struct Entry<H> {
    generation: u64,
    handle: H,
    eviction: AbortHandle,
}

struct Inner<H> {
    entries: HashMap<CursorToken, Entry<H>>,
    next_generation: u64,
}

type Shared<H> = Arc<Mutex<Inner<H>>>;

fn lock<H>(inner: &Mutex<Inner<H>>) -> MutexGuard<'_, Inner<H>> {
    // a panic while holding the lock cannot leave the map half-updated
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry mapping cursor tokens to suspended handles
///
/// Clones share the same registry. `create` must be called from within a
/// tokio runtime since it schedules the eviction timer.
pub struct CursorStore<H> {
    inner: Shared<H>,
    ttl: Duration,
}

impl<H: Send + 'static> CursorStore<H> {
    /// Create a store with the default five minute expiry
    pub fn new() -> Self {
        Self::with_ttl(CURSOR_TTL)
    }

    /// Create a store with a custom expiry
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                next_generation: 0,
            })),
            ttl,
        }
    }

    /// Expiry applied to new entries
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Register a handle under a fresh token and schedule its eviction
    pub fn create(&self, handle: H) -> CursorToken {
        let mut inner = lock(&self.inner);

        let token = loop {
            let token = CursorToken::generate();
            if !inner.entries.contains_key(&token) {
                break token;
            }
        };

        self.insert_locked(&mut inner, token.clone(), handle);
        token
    }

    /// Register a handle under a caller-chosen token, replacing any entry there
    #[cfg(test)]
    pub(super) fn insert(&self, token: CursorToken, handle: H) {
        let mut inner = lock(&self.inner);
        self.insert_locked(&mut inner, token, handle);
    }

    fn insert_locked(&self, inner: &mut Inner<H>, token: CursorToken, handle: H) {
        let generation = inner.next_generation;
        inner.next_generation += 1;

        // the timer blocks on the lock held by the caller until the entry is in place
        let eviction = tokio::spawn(expire(
            Arc::downgrade(&self.inner),
            token.clone(),
            generation,
            self.ttl,
        ))
        .abort_handle();

        let entry = Entry {
            generation,
            handle,
            eviction,
        };
        if let Some(replaced) = inner.entries.insert(token.clone(), entry) {
            replaced.eviction.abort();
        }

        debug!("Registered cursor {token} (generation {generation})");
    }

    /// Take the handle registered under `token`
    ///
    /// Lookup and removal are one step: of two concurrent resumes with the
    /// same token, at most one gets the handle.
    pub fn resume(&self, token: &CursorToken) -> Option<H> {
        let entry = lock(&self.inner).entries.remove(token)?;
        entry.eviction.abort();
        debug!("Resumed cursor {token}");
        Some(entry.handle)
    }

    /// Drop the entry for `token` if it is still registered
    pub fn evict(&self, token: &CursorToken) {
        if let Some(entry) = lock(&self.inner).entries.remove(token) {
            entry.eviction.abort();
            debug!("Evicted cursor {token}");
        }
    }

    /// Number of registered cursors
    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    /// Whether no cursor is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: Send + 'static> Default for CursorStore<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Clone for CursorStore<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            ttl: self.ttl,
        }
    }
}

impl<H> fmt::Debug for CursorStore<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorStore")
            .field("entries", &lock(&self.inner).entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Eviction timer for one entry
async fn expire<H>(
    inner: Weak<Mutex<Inner<H>>>,
    token: CursorToken,
    generation: u64,
    ttl: Duration,
) {
    tokio::time::sleep(ttl).await;

    let Some(inner) = inner.upgrade() else {
        return;
    };

    let mut inner = lock(&inner);
    if inner
        .entries
        .get(&token)
        .is_some_and(|entry| entry.generation == generation)
    {
        inner.entries.remove(&token);
        debug!("Cursor {token} expired");
    }
}
