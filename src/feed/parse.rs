// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset};

use crate::error::FeedError;

/// A feed document read back from RSS XML
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: String,
    pub description: String,
    pub link: String,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub explicit: Option<String>,
    /// Every `<item>` in document order, with or without an enclosure
    pub items: Vec<ParsedItem>,
}

/// A single `<item>` of a parsed feed
#[derive(Debug, Clone)]
pub struct ParsedItem {
    pub title: Option<String>,
    pub guid: Option<String>,
    pub guid_is_permalink: bool,
    pub pub_date: Option<DateTime<FixedOffset>>,
    pub enclosure: Option<ParsedEnclosure>,
    pub duration: Option<String>,
    pub episode_number: Option<u32>,
}

/// The `<enclosure>` of a parsed item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEnclosure {
    pub url: String,
    pub length: Option<u64>,
    pub mime_type: String,
}

/// Parse RSS feed XML bytes
pub fn parse_feed(xml_bytes: &[u8]) -> Result<ParsedFeed, FeedError> {
    let channel = rss::Channel::read_from(xml_bytes)?;

    let image_url = channel
        .image()
        .map(|img| img.url().to_string())
        .or_else(|| {
            channel
                .itunes_ext()
                .and_then(|ext| ext.image())
                .map(String::from)
        });

    let itunes = channel.itunes_ext();

    Ok(ParsedFeed {
        title: channel.title().to_string(),
        description: channel.description().to_string(),
        link: channel.link().to_string(),
        image_url,
        author: itunes.and_then(|ext| ext.author().map(String::from)),
        explicit: itunes.and_then(|ext| ext.explicit().map(String::from)),
        items: channel.items().iter().map(parse_item).collect(),
    })
}

fn parse_item(item: &rss::Item) -> ParsedItem {
    let itunes = item.itunes_ext();

    ParsedItem {
        title: item.title().map(String::from),
        guid: item.guid().map(|g| g.value().to_string()),
        guid_is_permalink: item.guid().is_some_and(|g| g.is_permalink()),
        pub_date: item
            .pub_date()
            .and_then(|date| DateTime::parse_from_rfc2822(date).ok()),
        enclosure: item.enclosure().map(|enclosure| ParsedEnclosure {
            url: enclosure.url().to_string(),
            length: enclosure.length().parse().ok(),
            mime_type: enclosure.mime_type().to_string(),
        }),
        duration: itunes.and_then(|ext| ext.duration().map(String::from)),
        episode_number: itunes.and_then(|ext| ext.episode().and_then(|e| e.parse().ok())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>Test Podcast</title>
    <description>A test podcast for unit testing</description>
    <link>https://example.com</link>
    <itunes:author>Test Author</itunes:author>
    <itunes:explicit>false</itunes:explicit>
    <itunes:image href="https://example.com/image.jpg"/>
    <item>
      <title>Episode 1</title>
      <pubDate>Mon, 01 Jan 2024 12:00:00 +0000</pubDate>
      <guid isPermaLink="false">https://example.com/ep1.mp3</guid>
      <enclosure url="https://example.com/ep1.mp3" length="1234567" type="audio/mpeg"/>
      <itunes:duration>00:30:00</itunes:duration>
      <itunes:episode>1</itunes:episode>
    </item>
    <item>
      <title>No Audio</title>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parse_feed_extracts_channel() {
        let feed = parse_feed(SAMPLE_FEED.as_bytes()).unwrap();

        assert_eq!(feed.title, "Test Podcast");
        assert_eq!(feed.description, "A test podcast for unit testing");
        assert_eq!(feed.link, "https://example.com");
        assert_eq!(feed.author.as_deref(), Some("Test Author"));
        assert_eq!(feed.explicit.as_deref(), Some("false"));
        assert_eq!(
            feed.image_url.as_deref(),
            Some("https://example.com/image.jpg")
        );
    }

    #[test]
    fn parse_feed_extracts_items() {
        let feed = parse_feed(SAMPLE_FEED.as_bytes()).unwrap();

        let ep1 = &feed.items[0];
        assert_eq!(ep1.title.as_deref(), Some("Episode 1"));
        assert_eq!(ep1.guid.as_deref(), Some("https://example.com/ep1.mp3"));
        assert!(!ep1.guid_is_permalink);
        assert_eq!(ep1.duration.as_deref(), Some("00:30:00"));
        assert_eq!(ep1.episode_number, Some(1));
        assert!(ep1.pub_date.is_some());
        assert_eq!(
            ep1.enclosure,
            Some(ParsedEnclosure {
                url: "https://example.com/ep1.mp3".to_string(),
                length: Some(1234567),
                mime_type: "audio/mpeg".to_string(),
            })
        );
    }

    #[test]
    fn parse_feed_keeps_items_without_enclosure() {
        let feed = parse_feed(SAMPLE_FEED.as_bytes()).unwrap();

        assert_eq!(feed.items.len(), 2);
        let ep2 = &feed.items[1];
        assert!(ep2.enclosure.is_none());
        assert!(ep2.pub_date.is_none());
        assert!(ep2.duration.is_none());
        assert!(ep2.episode_number.is_none());
    }

    #[test]
    fn parse_feed_rejects_malformed_xml() {
        let result = parse_feed(b"<rss><channel><title>oops");
        assert!(matches!(result, Err(FeedError::ParseFailed(_))));
    }
}
