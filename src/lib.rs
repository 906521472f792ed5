pub mod audio;
pub mod config;
pub mod episode;
pub mod error;
pub mod feed;
pub mod generate;
pub mod progress;

// Re-export main types for convenience
pub use audio::{AudioFile, DurationProbe, ExtractedMetadata, MetadataExtractor, find_audio_files};
pub use config::{CONFIG_FILENAME, Config, FeedOverrides};
pub use episode::{Enclosure, Episode, build_episode, infer_title, parse_fuzzy};
pub use error::{
    BuildError, ConfigError, DecoderError, EpisodeError, ExtractionError, FeedError, FolderError,
    SerializationError,
};
pub use feed::{
    FEED_FILENAME, Feed, FeedOptions, ParsedFeed, UnreadablePolicy, assemble_feed, parse_feed,
    render_feed, write_feed,
};
pub use generate::{GenerateSummary, WrittenFeed, generate_feeds};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
