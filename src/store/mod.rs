//! Feed registry and watermark persistence.
//!
//! The [`WatermarkStore`] trait is the only place cross-cycle state lives.
//! [`SqliteStore`] is the production implementation; tests in other modules
//! provide their own in-memory fakes.
//!
//! ## Invariants
//!
//! * A feed URL is registered at most once.
//! * A watermark exists only for a registered feed, and is absent until the
//!   first successful check.

mod sqlite;

pub use sqlite::SqliteStore;

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Identifier of a registered feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedId(pub i64);

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A feed the monitor polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRegistration {
    pub id: FeedId,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("feed `{0}` is already registered")]
    DuplicateFeed(String),

    #[error("invalid feed URL `{0}`: expected an http(s) URL")]
    InvalidUrl(String),

    #[error("stored watermark `{raw}` for feed {feed_id} is unreadable")]
    CorruptWatermark { feed_id: FeedId, raw: String },

    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

/// Persistent per-feed state.
///
/// The poller may call this from several worker threads, but never for the
/// same feed id concurrently.
pub trait WatermarkStore: Send + Sync {
    /// The last processed timestamp for `id`, or `None` if never checked.
    fn get_watermark(&self, id: FeedId) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Record `ts` as the last processed timestamp for `id`.
    fn set_watermark(&self, id: FeedId, ts: DateTime<Utc>) -> Result<(), StoreError>;

    /// All registered feeds, ordered by id.
    fn list_feeds(&self) -> Result<Vec<FeedRegistration>, StoreError>;

    /// Register a new feed URL.  Fails with [`StoreError::DuplicateFeed`] if
    /// the URL is already known.
    fn register_feed(&self, url: &str) -> Result<FeedId, StoreError>;

    /// Look up the id a URL was registered under.
    fn find_feed(&self, url: &str) -> Result<Option<FeedId>, StoreError>;
}
