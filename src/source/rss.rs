//! RSS 2.0 parsing.
//!
//! Converts an [`rss::Channel`] into [`RawItem`]s.  This is a pure function
//! so tests can exercise it without touching the network.
//!
//! Timestamp mapping:
//!
//! * `published` comes from `<pubDate>` (RFC 2822, with an RFC 3339 fallback
//!   for feeds that get it wrong), else from the first `<dc:date>`.
//! * `updated` comes from the first `<dc:date>`.

use chrono::{DateTime, Utc};

use super::RawItem;

/// Parse an already-read [`rss::Channel`] into [`RawItem`]s, keeping the
/// document order.
pub fn parse_channel(channel: &rss::Channel) -> Vec<RawItem> {
    channel
        .items()
        .iter()
        .map(|item| {
            let dc_date = item
                .dublin_core_ext()
                .and_then(|dc| dc.dates().first())
                .and_then(|d| parse_timestamp(d));

            let published = item.pub_date().and_then(parse_timestamp).or(dc_date);

            // A permalink guid is a usable link when <link> is missing.
            let link = item
                .link()
                .map(String::from)
                .or_else(|| {
                    item.guid()
                        .filter(|g| g.is_permalink())
                        .map(|g| g.value().to_string())
                })
                .unwrap_or_default();

            RawItem {
                title: item.title().unwrap_or("(untitled)").to_string(),
                link,
                published,
                updated: dc_date,
            }
        })
        .collect()
}

/// Parse a feed date, degrading to `None` on anything unrecognised.
pub(super) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn read(xml: &str) -> Vec<RawItem> {
        let channel = rss::Channel::read_from(xml.as_bytes()).unwrap();
        parse_channel(&channel)
    }

    #[test]
    fn parse_channel_extracts_items_in_document_order() {
        let items = read(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <item>
      <title>Second Post</title>
      <link>https://example.com/2</link>
      <pubDate>Tue, 02 Jan 2024 12:00:00 +0000</pubDate>
    </item>
    <item>
      <title>First Post</title>
      <link>https://example.com/1</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#,
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Second Post");
        assert_eq!(items[0].link, "https://example.com/2");
        assert_eq!(
            items[0].published,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap())
        );
        assert_eq!(items[0].updated, None);
        assert_eq!(items[1].title, "First Post");
    }

    #[test]
    fn dc_date_fills_updated_and_missing_pub_date() {
        let items = read(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Test</title>
    <item>
      <title>Only DC</title>
      <link>https://example.com/dc</link>
      <dc:date>2024-03-04T05:06:07Z</dc:date>
    </item>
  </channel>
</rss>"#,
        );

        let expected = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(items[0].published, Some(expected));
        assert_eq!(items[0].updated, Some(expected));
    }

    #[test]
    fn falls_back_to_permalink_guid_when_no_link() {
        let items = read(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <item>
      <title>No Link</title>
      <guid isPermaLink="true">https://example.com/from-guid</guid>
    </item>
    <item>
      <title>Opaque Guid</title>
      <guid isPermaLink="false">tag-1234</guid>
    </item>
  </channel>
</rss>"#,
        );

        assert_eq!(items[0].link, "https://example.com/from-guid");
        assert_eq!(items[1].link, "");
    }

    #[test]
    fn handles_missing_title() {
        let items = read(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <item>
      <link>https://example.com/x</link>
    </item>
  </channel>
</rss>"#,
        );

        assert_eq!(items[0].title, "(untitled)");
    }

    #[test]
    fn handles_invalid_date() {
        let items = read(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <item>
      <title>Bad Date</title>
      <pubDate>not-a-real-date</pubDate>
    </item>
  </channel>
</rss>"#,
        );

        assert!(items[0].published.is_none());
        assert!(items[0].effective_timestamp().is_none());
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339_in_pub_date() {
        assert_eq!(
            parse_timestamp(" 2024-01-01T10:00:00+02:00 "),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap())
        );
    }
}
