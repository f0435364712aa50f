//! The item type every feed format is normalised into.
//!
//! `RawItem` is what the change detector sees: a title, a link and up to two
//! timestamps.  It is produced fresh on every poll and never persisted.
//!
//! ## For contributors
//!
//! If you add a new feed format you do **not** need to touch this file.
//! Convert your native entries into `RawItem`s inside your parser and keep
//! the document order intact (feeds conventionally list newest first, and the
//! detector relies on that).

use chrono::{DateTime, Utc};

/// A single feed entry, normalised from RSS or Atom.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RawItem {
    /// Human-readable headline.
    pub title: String,

    /// URL of the entry.  Empty when the feed did not provide one.
    pub link: String,

    /// When the entry was first published, if the feed says so.
    pub published: Option<DateTime<Utc>>,

    /// When the entry was last updated, if the feed says so.
    pub updated: Option<DateTime<Utc>>,
}

impl RawItem {
    /// The timestamp used to compare this item against a watermark.
    ///
    /// Prefers `published` and falls back to `updated`.  `None` means the
    /// item cannot be placed in time at all.
    pub fn effective_timestamp(&self) -> Option<DateTime<Utc>> {
        self.published.or(self.updated)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
