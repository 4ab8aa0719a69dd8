//! Render cache for live preview regions
//!
//! Rendering a region is expensive and the editor rebuilds widgets often, so
//! finished regions are kept keyed by note path and raw region text.
//!
//! # Lifecycle
//! - `get` returns whatever is stored, however old: presence means reusable
//! - `put` stores with the current time, replacing any previous entry
//! - `evict` drops entries that are detached from the view and older than
//!   the grace period. It runs at the start of each widget construction
//!   rather than on a timer, so the cache only shrinks while regions are
//!   being built.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use log::debug;

/// How long a detached entry is kept before eviction.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(120);

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator Traits
// ─────────────────────────────────────────────────────────────────────────────

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Something the host can show or hide; detached values are eviction candidates.
pub trait Attachable {
    fn is_attached(&self) -> bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Types
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a rendered region: the note it lives in and its raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    source_path: String,
    content: String,
}

impl CacheKey {
    pub fn new(source_path: &Path, content: &str) -> Self {
        Self {
            source_path: source_path.to_string_lossy().into_owned(),
            content: content.to_string(),
        }
    }
}

/// A stored value with the time it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub timestamp: Instant,
    pub element: T,
}

/// Owned cache of rendered regions.
#[derive(Debug)]
pub struct RenderCache<T, C = SystemClock> {
    entries: HashMap<CacheKey, CacheEntry<T>>,
    clock: C,
    grace_period: Duration,
}

impl<T: Attachable> RenderCache<T, SystemClock> {
    pub fn new(grace_period: Duration) -> Self {
        Self::with_clock(SystemClock, grace_period)
    }
}

impl<T: Attachable> Default for RenderCache<T, SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl<T: Attachable, C: Clock> RenderCache<T, C> {
    pub fn with_clock(clock: C, grace_period: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
            grace_period,
        }
    }

    /// The stored value for `key`, regardless of age.
    pub fn get(&self, key: &CacheKey) -> Option<&T> {
        self.entries.get(key).map(|entry| &entry.element)
    }

    /// Store `element` under `key` with the current time, replacing any previous entry.
    pub fn put(&mut self, key: CacheKey, element: T) {
        let timestamp = self.clock.now();
        self.entries.insert(key, CacheEntry { timestamp, element });
    }

    /// Drop detached entries older than the grace period, never touching `skip`.
    ///
    /// Returns the number of entries removed.
    pub fn evict(&mut self, skip: Option<&CacheKey>) -> usize {
        let now = self.clock.now();
        let grace_period = self.grace_period;
        let before = self.entries.len();

        self.entries.retain(|key, entry| {
            if skip == Some(key) || entry.element.is_attached() {
                return true;
            }
            now.saturating_duration_since(entry.timestamp) <= grace_period
        });

        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("Evicted {} detached region(s) from the render cache", removed);
        }
        removed
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
