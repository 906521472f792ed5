use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use crate::error::FeedError;

/// Extensions accepted as episodes, matched case-sensitively.
///
/// This is the set podcast directories accept; video containers are
/// included for audio-only playback.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "aac", "ogg", "m4a", "wav", "mp4", "aiff", "m4v", "mov",
];

/// An audio file found while scanning a folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub path: PathBuf,
    pub extension: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl AudioFile {
    /// Stat a file and describe it as an audio file
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let modified: DateTime<Utc> = metadata.modified()?.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            extension,
            size: metadata.len(),
            modified,
        })
    }

    /// File name without its final extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Check whether a path carries one of the recognized audio extensions
pub fn is_audio_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext))
}

/// Recursively collect audio file paths under `folder`.
///
/// The walk is sorted by file name so discovery order is the same on every run.
pub fn find_audio_files(folder: &Path) -> Result<Vec<PathBuf>, FeedError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder).sort_by_file_name() {
        let entry = entry.map_err(|e| FeedError::ScanFailed {
            path: folder.to_path_buf(),
            source: e,
        })?;

        if entry.file_type().is_file() && is_audio_path(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
