//! Atom (and anything else `feed-rs` understands) parsing.
//!
//! Used for every document whose root element is not `<rss>`.  `feed-rs`
//! already normalises dates to UTC, so the mapping is direct.

use feed_rs::model::{Entry, Feed};

use super::RawItem;

/// Convert a parsed [`Feed`] into [`RawItem`]s, keeping the document order.
pub fn parse_feed(feed: &Feed) -> Vec<RawItem> {
    feed.entries.iter().map(entry_to_item).collect()
}

fn entry_to_item(entry: &Entry) -> RawItem {
    // Prefer the alternate link; Atom entries often carry self/edit links too.
    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone())
        .unwrap_or_default();

    RawItem {
        title: entry
            .title
            .as_ref()
            .map_or_else(|| "(untitled)".to_string(), |t| t.content.clone()),
        link,
        published: entry.published,
        updated: entry.updated,
    }
}
