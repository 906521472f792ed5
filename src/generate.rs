// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use crate::audio::MetadataExtractor;
use crate::config::Config;
use crate::episode::folder_name;
use crate::error::{BuildError, FolderError};
use crate::feed::{Feed, FeedOptions, assemble_feed, write_feed};
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// A feed file written for one folder
#[derive(Debug, Clone)]
pub struct WrittenFeed {
    pub folder: PathBuf,
    pub path: PathBuf,
    pub episodes: usize,
    pub excluded: usize,
}

/// Result of a generation run
#[derive(Debug, Clone, Default)]
pub struct GenerateSummary {
    pub written: Vec<WrittenFeed>,
    /// Folders without audio files
    pub skipped: Vec<PathBuf>,
    /// Folders that failed (folder, error message)
    pub failed: Vec<(PathBuf, String)>,
}

impl GenerateSummary {
    /// Audio files left out across all written feeds
    pub fn files_excluded(&self) -> usize {
        self.written.iter().map(|w| w.excluded).sum()
    }

    /// True when folders were attempted and none of them produced a feed
    pub fn all_failed(&self) -> bool {
        self.written.is_empty() && !self.failed.is_empty()
    }
}

/// Generate a feed for every podcast folder under the configured root.
///
/// Each immediate subdirectory of the root is one podcast. When none of
/// them yields a feed, the root itself is treated as a single podcast.
/// Failures are recorded per folder and never stop the remaining folders.
pub fn generate_feeds(
    config: &Config,
    options: &FeedOptions,
    reporter: SharedProgressReporter,
) -> Result<GenerateSummary, BuildError> {
    let root = config.root()?;
    if !root.is_dir() {
        return Err(BuildError::RootNotFound(root.to_path_buf()));
    }

    reporter.report(ProgressEvent::ScanningRoot {
        root: root.to_path_buf(),
    });

    let extractor = MetadataExtractor::new();
    tracing::debug!(probes = ?extractor.probe_names(), "Using decoder chain");

    let mut summary = GenerateSummary::default();

    for folder in list_subfolders(root)? {
        process_folder(&folder, config, &extractor, options, &reporter, &mut summary);
    }

    if summary.written.is_empty() && summary.failed.is_empty() {
        tracing::info!(root = %root.display(), "No podcast subfolders, using root as podcast folder");
        summary.skipped.clear();
        process_folder(root, config, &extractor, options, &reporter, &mut summary);
    }

    reporter.report(ProgressEvent::RunCompleted {
        feeds_written: summary.written.len(),
        folders_skipped: summary.skipped.len(),
        folders_failed: summary.failed.len(),
        files_excluded: summary.files_excluded(),
    });

    Ok(summary)
}

/// Immediate subdirectories of `root`, sorted by name
fn list_subfolders(root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let entries = std::fs::read_dir(root).map_err(|e| BuildError::ReadRootFailed {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut folders: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    folders.sort();

    Ok(folders)
}

fn process_folder(
    folder: &Path,
    config: &Config,
    extractor: &MetadataExtractor,
    options: &FeedOptions,
    reporter: &SharedProgressReporter,
    summary: &mut GenerateSummary,
) {
    let name = folder_name(folder);

    match generate_folder(folder, config, extractor, options, reporter) {
        Ok(Some((feed, path))) => {
            reporter.report(ProgressEvent::FeedWritten {
                folder: name,
                path: path.clone(),
                episodes: feed.episodes.len(),
            });
            summary.written.push(WrittenFeed {
                folder: folder.to_path_buf(),
                path,
                episodes: feed.episodes.len(),
                excluded: feed.excluded.len(),
            });
        }
        Ok(None) => {
            tracing::debug!(folder = %folder.display(), "No audio files, skipping");
            reporter.report(ProgressEvent::FolderSkipped { folder: name });
            summary.skipped.push(folder.to_path_buf());
        }
        Err(e) => {
            tracing::error!(folder = %folder.display(), error = %e, "Failed to generate feed");
            reporter.report(ProgressEvent::FolderFailed {
                folder: name,
                error: e.to_string(),
            });
            summary.failed.push((folder.to_path_buf(), e.to_string()));
        }
    }
}

fn generate_folder(
    folder: &Path,
    config: &Config,
    extractor: &MetadataExtractor,
    options: &FeedOptions,
    reporter: &SharedProgressReporter,
) -> Result<Option<(Feed, PathBuf)>, FolderError> {
    let Some(feed) = assemble_feed(folder, config, extractor, options, reporter)? else {
        return Ok(None);
    };
    let path = write_feed(&feed, folder)?;
    Ok(Some((feed, path)))
}
