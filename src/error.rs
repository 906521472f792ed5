use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading root or per-folder configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON in {path}: {source}")]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid base_url '{base_url}': {source}")]
    InvalidBaseUrl {
        base_url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Config file {0} does not name a root_folder")]
    MissingRootFolder(PathBuf),
}

/// A single decoder's failure to read a file
#[derive(Error, Debug)]
pub enum DecoderError {
    #[error("{0}")]
    Lofty(#[from] lofty::error::LoftyError),

    #[error("{0}")]
    Symphonia(#[from] symphonia::core::errors::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when extracting audio metadata
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("No decoder could read {path} ({})", .attempts.join("; "))]
    Undecodable {
        path: PathBuf,
        /// One "decoder: reason" entry per attempt, in chain order
        attempts: Vec<String>,
    },
}

/// Errors that can occur while building a single episode
#[derive(Error, Debug)]
pub enum EpisodeError {
    #[error("Failed to stat audio file {path}: {source}")]
    StatFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Episode URL '{url}' is invalid: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Audio file {path} is not inside folder {folder}")]
    OutsideFolder { path: PathBuf, folder: PathBuf },
}

/// Errors that can occur when scanning a folder or reading a feed
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to scan folder {path}: {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Invalid feed URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to parse RSS feed: {0}")]
    ParseFailed(#[from] rss::Error),
}

/// Errors that can occur when rendering or writing a feed
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("Failed to render RSS for '{feed}': {source}")]
    RenderFailed {
        feed: String,
        #[source]
        source: rss::Error,
    },

    #[error("Rendered RSS for '{feed}' does not read back: {source}")]
    VerifyFailed {
        feed: String,
        #[source]
        source: FeedError,
    },

    #[error("Rendered RSS for '{feed}' has {found} items, expected {expected}")]
    ItemCountMismatch {
        feed: String,
        expected: usize,
        found: usize,
    },

    #[error("Failed to write feed file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that fail a single folder
#[derive(Error, Debug)]
pub enum FolderError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

/// Top-level errors for a build run
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Root folder does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("Failed to read root folder {path}: {source}")]
    ReadRootFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
