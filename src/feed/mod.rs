mod assemble;
mod parse;
mod render;

pub use assemble::{
    ExcludedFile, Feed, FeedOptions, IMAGE_FILENAME, Owner, UnreadablePolicy, assemble_feed,
    number_episodes,
};
pub use parse::{ParsedEnclosure, ParsedFeed, ParsedItem, parse_feed};
pub use render::{FEED_FILENAME, format_duration, render_feed, write_feed, xml_text};
