//! Feed source abstraction layer.
//!
//! This module defines the [`FeedSource`] trait, the common [`RawItem`] type
//! and the error a fetch can fail with.  The concrete HTTP implementation
//! lives in [`http`]; per-format parsing lives in [`rss`] and [`atom`].
//!
//! ## For contributors - adding a new feed format
//!
//! 1. Create a new file in this directory (e.g. `jsonfeed.rs`) with a pure
//!    function that turns the parsed document into `Vec<RawItem>`.
//! 2. Add `mod jsonfeed;` below.
//! 3. Teach [`http::parse_document`] to recognise the format.
//!
//! The poller, detector and store are all format-agnostic.

mod atom;
mod http;
mod raw_item;
mod rss;

pub use http::{HttpFeedSource, USER_AGENT};
pub use raw_item::RawItem;

use thiserror::Error;

/// Why a feed could not be turned into items.
///
/// A feed that downloads and parses fine but has no entries is **not** an
/// error; it is `Ok(vec![])`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure, including the per-fetch timeout.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP error: {0}")]
    Status(u16),

    /// The body is neither a readable RSS nor Atom document.
    #[error("failed to parse feed: {0}")]
    Parse(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Trait that every feed source must implement.
///
/// The poller may call [`fetch_and_parse()`](FeedSource::fetch_and_parse)
/// from several worker threads at once, so implementations must be
/// [`Send`] + [`Sync`].
pub trait FeedSource: Send + Sync {
    /// Retrieve the document at `url` and return its items in document order.
    fn fetch_and_parse(&self, url: &str) -> Result<Vec<RawItem>, FetchError>;
}
