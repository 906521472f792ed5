// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use rss::extension::itunes::{
    self, ITunesCategoryBuilder, ITunesChannelExtension, ITunesChannelExtensionBuilder,
    ITunesItemExtensionBuilder, ITunesOwnerBuilder,
};
use rss::{Channel, ChannelBuilder, EnclosureBuilder, GuidBuilder, ImageBuilder, Item, ItemBuilder};

use crate::episode::Episode;
use crate::error::SerializationError;

use super::assemble::Feed;
use super::parse::parse_feed;

/// File name of the feed written into each folder
pub const FEED_FILENAME: &str = "podcast.rss";

/// Written first, then renamed over [`FEED_FILENAME`]
const PARTIAL_FILENAME: &str = "podcast.rss.partial";

const GENERATOR: &str = concat!("podfold ", env!("CARGO_PKG_VERSION"));

/// Render a feed as an RSS 2.0 document with iTunes extensions
pub fn render_feed(feed: &Feed) -> Result<String, SerializationError> {
    let bytes = to_channel(feed)
        .pretty_write_to(Vec::new(), b' ', 2)
        .map_err(|e| SerializationError::RenderFailed {
            feed: feed.title.clone(),
            source: e,
        })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Render `feed`, check it reads back, and write it into `folder`.
///
/// The document is written to a partial file that is renamed over the
/// previous feed, so readers never see a half-written file.
pub fn write_feed(feed: &Feed, folder: &Path) -> Result<PathBuf, SerializationError> {
    let xml = render_feed(feed)?;
    verify(feed, &xml)?;

    let path = folder.join(FEED_FILENAME);
    let partial = folder.join(PARTIAL_FILENAME);

    std::fs::write(&partial, &xml).map_err(|e| SerializationError::WriteFailed {
        path: partial.clone(),
        source: e,
    })?;
    if let Err(e) = std::fs::rename(&partial, &path) {
        std::fs::remove_file(&partial).ok();
        return Err(SerializationError::WriteFailed {
            path: path.clone(),
            source: e,
        });
    }

    tracing::info!(
        feed = %feed.title,
        path = %path.display(),
        episodes = feed.episodes.len(),
        "Wrote feed"
    );

    Ok(path)
}

/// Format a duration as `HH:MM:SS`, rounded to whole seconds
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs_f64().round() as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Drop characters that XML 1.0 does not allow in documents
pub fn xml_text(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
        })
        .collect()
}

fn verify(feed: &Feed, xml: &str) -> Result<(), SerializationError> {
    let parsed = parse_feed(xml.as_bytes()).map_err(|e| SerializationError::VerifyFailed {
        feed: feed.title.clone(),
        source: e,
    })?;

    if parsed.items.len() != feed.episodes.len() {
        return Err(SerializationError::ItemCountMismatch {
            feed: feed.title.clone(),
            expected: feed.episodes.len(),
            found: parsed.items.len(),
        });
    }

    Ok(())
}

fn to_channel(feed: &Feed) -> Channel {
    let image = feed.image_url.as_ref().map(|url| {
        ImageBuilder::default()
            .url(url.as_str())
            .title(xml_text(&feed.title))
            .link(feed.website.as_str())
            .build()
    });

    let mut namespaces = BTreeMap::new();
    namespaces.insert("itunes".to_string(), itunes::NAMESPACE.to_string());

    ChannelBuilder::default()
        .title(xml_text(&feed.title))
        .link(feed.website.as_str())
        .description(xml_text(&feed.description))
        .language(feed.language.as_deref().map(xml_text))
        .copyright(feed.copyright.as_deref().map(xml_text))
        .generator(Some(GENERATOR.to_string()))
        .last_build_date(Some(Utc::now().to_rfc2822()))
        .pub_date(feed.episodes.last().map(|e| e.pub_date.to_rfc2822()))
        .image(image)
        .namespaces(namespaces)
        .itunes_ext(Some(channel_extension(feed)))
        .items(feed.episodes.iter().map(to_item).collect::<Vec<_>>())
        .build()
}

fn channel_extension(feed: &Feed) -> ITunesChannelExtension {
    let categories = feed
        .category
        .as_deref()
        .map(|category| {
            let subcategory = feed.subcategory.as_deref().map(|sub| {
                Box::new(ITunesCategoryBuilder::default().text(xml_text(sub)).build())
            });
            ITunesCategoryBuilder::default()
                .text(xml_text(category))
                .subcategory(subcategory)
                .build()
        })
        .into_iter()
        .collect::<Vec<_>>();

    let owner = feed.owner.as_ref().map(|owner| {
        ITunesOwnerBuilder::default()
            .name(owner.name.as_deref().map(xml_text))
            .email(owner.email.as_deref().map(xml_text))
            .build()
    });

    ITunesChannelExtensionBuilder::default()
        .author(feed.author.as_deref().map(xml_text))
        .image(feed.image_url.as_ref().map(|url| url.to_string()))
        .explicit(Some(feed.explicit.to_string()))
        .complete(feed.complete.then(|| "Yes".to_string()))
        .categories(categories)
        .owner(owner)
        .subtitle(feed.subtitle.as_deref().map(xml_text))
        .summary(feed.summary.as_deref().map(xml_text))
        .build()
}

fn to_item(episode: &Episode) -> Item {
    let enclosure = EnclosureBuilder::default()
        .url(episode.enclosure.url.as_str())
        .length(episode.enclosure.length.to_string())
        .mime_type(episode.enclosure.mime_type.as_str())
        .build();

    let guid = GuidBuilder::default()
        .value(episode.guid.as_str())
        .permalink(false)
        .build();

    let itunes = ITunesItemExtensionBuilder::default()
        .duration(episode.duration.map(format_duration))
        .episode(episode.episode_number.map(|n| n.to_string()))
        .build();

    ItemBuilder::default()
        .title(Some(xml_text(&episode.title)))
        .link(Some(episode.enclosure.url.to_string()))
        .pub_date(Some(episode.pub_date.to_rfc2822()))
        .guid(Some(guid))
        .enclosure(Some(enclosure))
        .itunes_ext(Some(itunes))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::Config;
    use crate::episode::{DateSource, Enclosure};
    use crate::feed::Owner;
    use chrono::TimeZone;
    use tempfile::tempdir;
    use url::Url;

    fn episode(name: &str, day: u32, number: u32, duration: Option<Duration>) -> Episode {
        let url = Url::parse(&format!("https://x/ShowA/{name}")).unwrap();
        Episode {
            guid: url.to_string(),
            title: name.trim_end_matches(".mp3").replace("%20", " "),
            pub_date: Utc.with_ymd_and_hms(2021, 1, day, 0, 0, 0).unwrap(),
            date_source: DateSource::Filename,
            enclosure: Enclosure {
                url,
                length: 1000 + u64::from(number),
                mime_type: "audio/mpeg".to_string(),
            },
            duration,
            episode_number: Some(number),
        }
    }

    fn show_a() -> Feed {
        let config = Config::new("https://x/").unwrap();
        let mut feed = Feed::for_folder(Path::new("/srv/ShowA"), &config).unwrap();
        feed.episodes = vec![
            episode("2021-01-10%20Pilot.mp3", 10, 1, Some(Duration::from_secs(60))),
            episode("Unnamed.mp3", 31, 2, None),
        ];
        feed
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::from_secs(60)), "00:01:00");
        assert_eq!(format_duration(Duration::from_secs_f64(3725.4)), "01:02:05");
        assert_eq!(format_duration(Duration::from_secs_f64(59.6)), "00:01:00");
        assert_eq!(format_duration(Duration::from_secs(36_000)), "10:00:00");
    }

    #[test]
    fn strips_xml_invalid_characters() {
        assert_eq!(xml_text("a\u{0001}b\u{001F}c"), "abc");
        assert_eq!(xml_text("tab\there\nnew"), "tab\there\nnew");
        assert_eq!(xml_text("Café <Live> & more"), "Café <Live> & more");
        assert_eq!(xml_text("x\u{FFFF}y"), "xy");
    }

    #[test]
    fn renders_channel_fields() {
        let xml = render_feed(&show_a()).unwrap();
        let parsed = parse_feed(xml.as_bytes()).unwrap();

        assert_eq!(parsed.title, "ShowA");
        assert_eq!(parsed.description, "ShowA");
        assert_eq!(parsed.link, "https://x/");
        assert_eq!(parsed.explicit.as_deref(), Some("false"));
        assert!(parsed.image_url.is_none());
        assert!(xml.contains(GENERATOR));
    }

    #[test]
    fn renders_items_in_feed_order() {
        let xml = render_feed(&show_a()).unwrap();
        let parsed = parse_feed(xml.as_bytes()).unwrap();

        assert_eq!(parsed.items.len(), 2);

        let pilot = &parsed.items[0];
        assert_eq!(pilot.title.as_deref(), Some("2021-01-10 Pilot"));
        assert_eq!(
            pilot.guid.as_deref(),
            Some("https://x/ShowA/2021-01-10%20Pilot.mp3")
        );
        assert!(!pilot.guid_is_permalink);
        assert_eq!(pilot.duration.as_deref(), Some("00:01:00"));
        assert_eq!(pilot.episode_number, Some(1));
        assert_eq!(
            pilot.pub_date.unwrap().with_timezone(&Utc),
            Utc.with_ymd_and_hms(2021, 1, 10, 0, 0, 0).unwrap()
        );
        let enclosure = pilot.enclosure.as_ref().unwrap();
        assert_eq!(enclosure.url, "https://x/ShowA/2021-01-10%20Pilot.mp3");
        assert_eq!(enclosure.length, Some(1001));
        assert_eq!(enclosure.mime_type, "audio/mpeg");

        let unnamed = &parsed.items[1];
        assert_eq!(unnamed.title.as_deref(), Some("Unnamed"));
        assert_eq!(unnamed.episode_number, Some(2));
        assert!(unnamed.duration.is_none());
    }

    #[test]
    fn renders_overrides_and_escapes_text() {
        let mut feed = show_a();
        feed.title = "Show A <Live> & \u{0007}More".to_string();
        feed.explicit = true;
        feed.author = Some("Ann".to_string());
        feed.category = Some("Technology".to_string());
        feed.subcategory = Some("Podcasting".to_string());
        feed.owner = Some(Owner {
            name: Some("Ann".to_string()),
            email: Some("ann@x.org".to_string()),
        });
        feed.image_url = Some(Url::parse("https://x/ShowA/image.jpg").unwrap());

        let xml = render_feed(&feed).unwrap();
        let parsed = parse_feed(xml.as_bytes()).unwrap();

        assert_eq!(parsed.title, "Show A <Live> & More");
        assert_eq!(parsed.explicit.as_deref(), Some("true"));
        assert_eq!(parsed.author.as_deref(), Some("Ann"));
        assert_eq!(
            parsed.image_url.as_deref(),
            Some("https://x/ShowA/image.jpg")
        );
        assert!(xml.contains("Technology"));
        assert!(xml.contains("Podcasting"));
        assert!(xml.contains("ann@x.org"));
    }

    #[test]
    fn renders_empty_feed() {
        let mut feed = show_a();
        feed.episodes.clear();

        let xml = render_feed(&feed).unwrap();
        let parsed = parse_feed(xml.as_bytes()).unwrap();

        assert!(parsed.items.is_empty());
    }

    #[test]
    fn write_feed_creates_podcast_rss() {
        let dir = tempdir().unwrap();

        let path = write_feed(&show_a(), dir.path()).unwrap();

        assert_eq!(path, dir.path().join(FEED_FILENAME));
        assert!(!dir.path().join(PARTIAL_FILENAME).exists());
        let parsed = parse_feed(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed.items.len(), 2);
    }

    #[test]
    fn write_feed_replaces_previous_feed() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(FEED_FILENAME), "stale").unwrap();

        let mut feed = show_a();
        feed.episodes.truncate(1);
        write_feed(&feed, dir.path()).unwrap();

        let parsed =
            parse_feed(&std::fs::read(dir.path().join(FEED_FILENAME)).unwrap()).unwrap();
        assert_eq!(parsed.items.len(), 1);
    }

    #[test]
    fn item_titles_with_markup_characters_read_back() {
        let mut feed = show_a();
        feed.episodes[0].title = "Q&A <Live> \"Tom & Jerry\" \u{0001}special".to_string();

        let xml = render_feed(&feed).unwrap();
        let parsed = parse_feed(xml.as_bytes()).unwrap();

        assert_eq!(
            parsed.items[0].title.as_deref(),
            Some("Q&A <Live> \"Tom & Jerry\" special")
        );
        assert!(xml.contains("Q&amp;A &lt;Live"));
    }

    #[test]
    fn failed_rename_removes_partial_file() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join(FEED_FILENAME)).unwrap();
        std::fs::write(dir.path().join(FEED_FILENAME).join("keep.txt"), b"x").unwrap();

        let result = write_feed(&show_a(), dir.path());

        assert!(matches!(
            result,
            Err(SerializationError::WriteFailed { .. })
        ));
        assert!(!dir.path().join(PARTIAL_FILENAME).exists());
    }

    #[test]
    fn write_feed_fails_for_missing_folder() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");

        let result = write_feed(&show_a(), &missing);

        assert!(matches!(
            result,
            Err(SerializationError::WriteFailed { .. })
        ));
    }
}
