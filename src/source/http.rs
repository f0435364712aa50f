//! HTTP feed source.
//!
//! Downloads a feed with a blocking [`reqwest`] client and hands the body to
//! [`parse_document`], which picks the right format parser.
//!
//! Every request is bounded by the client timeout, so one hung server cannot
//! stall a worker forever.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use super::{atom, rss as rss_format, FeedSource, FetchError, RawItem};

/// User-Agent sent with every request.
pub const USER_AGENT: &str = "feedmonitor";

/// A [`FeedSource`] that fetches documents over HTTP(S).
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    /// Create a source whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl FeedSource for HttpFeedSource {
    fn fetch_and_parse(&self, url: &str) -> Result<Vec<RawItem>, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes()?;
        debug!(url, bytes = body.len(), "fetched feed document");
        parse_document(body.as_ref())
    }
}

/// Parse a feed document of either format.
///
/// RSS 2.0 is tried first.  If the root element is not `<rss>` the body is
/// handed to `feed-rs`, which covers Atom (and RSS 1.0).
pub fn parse_document(body: &[u8]) -> Result<Vec<RawItem>, FetchError> {
    match ::rss::Channel::read_from(body) {
        Ok(channel) => Ok(rss_format::parse_channel(&channel)),
        Err(::rss::Error::InvalidStartTag) => {
            let feed =
                feed_rs::parser::parse(body).map_err(|err| FetchError::Parse(Box::new(err)))?;
            Ok(atom::parse_feed(&feed))
        }
        Err(err) => Err(FetchError::Parse(Box::new(err))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
