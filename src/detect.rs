//! Incremental change detection.
//!
//! Given the items of one feed (newest first, as feed documents list them)
//! and that feed's watermark, work out which items are new and where the
//! watermark moves to.  This module does no I/O at all.
//!
//! ## Rules
//!
//! * An item's *effective timestamp* is its published time, else its
//!   updated time ([`RawItem::effective_timestamp`]).
//! * Iteration stops at the first item that has no effective timestamp, or
//!   whose effective timestamp is at or before the watermark.  Feeds are
//!   reverse-chronological, so everything after that point is old or
//!   unusable.
//! * Equal timestamps count as already seen.
//! * The returned watermark never moves backwards.

use chrono::{DateTime, Duration, Utc};

use crate::source::RawItem;

/// How many days back the first poll of a never-checked feed looks.
pub const DEFAULT_SEED_DAYS: i64 = 1;

/// The result of one detection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// New items, oldest first.
    pub new_items: Vec<RawItem>,
    /// The watermark to persist for the next pass.
    pub next_watermark: DateTime<Utc>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.new_items.is_empty()
    }
}

/// The watermark to use for a feed that has none stored yet.
pub fn default_seed(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(DEFAULT_SEED_DAYS)
}

/// Find the items newer than `watermark`.
///
/// `items` must be in document order (newest first).  The returned
/// [`ChangeSet::new_items`] are reversed into oldest-first order so callers
/// can notify in the order things happened.
pub fn detect(items: &[RawItem], watermark: DateTime<Utc>) -> ChangeSet {
    let mut latest = watermark;
    let mut new_items = Vec::new();

    for item in items {
        let Some(ts) = item.effective_timestamp() else {
            break;
        };
        if ts <= watermark {
            break;
        }
        latest = latest.max(ts);
        new_items.push(item.clone());
    }

    new_items.reverse();
    ChangeSet {
        new_items,
        next_watermark: latest,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
