// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use url::Url;

use crate::audio::{AudioFile, MetadataExtractor, find_audio_files};
use crate::config::{CONFIG_FILENAME, Config, FeedOverrides};
use crate::episode::{
    Episode, build_episode, build_episode_with_duration, encode_segment, folder_file_url,
    folder_name,
};
use crate::error::{EpisodeError, FeedError};
use crate::progress::{ProgressEvent, SharedProgressReporter};

use super::render::FEED_FILENAME;

/// Cover image picked up automatically when present in a folder
pub const IMAGE_FILENAME: &str = "image.jpg";

/// What to do with audio files no decoder can read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnreadablePolicy {
    /// Leave the file out of the feed
    #[default]
    Skip,
    /// Keep the file as an episode with unknown duration
    Keep,
}

/// Options for feed generation
#[derive(Debug, Clone, Default)]
pub struct FeedOptions {
    pub unreadable: UnreadablePolicy,
}

/// Owner contact announced to podcast directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// An audio file that did not make it into the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// A podcast feed for one folder
#[derive(Debug, Clone)]
pub struct Feed {
    pub title: String,
    pub description: String,
    pub feed_url: Url,
    pub website: Url,
    pub image_url: Option<Url>,
    pub explicit: bool,
    pub author: Option<String>,
    pub language: Option<String>,
    pub copyright: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub owner: Option<Owner>,
    pub subtitle: Option<String>,
    pub summary: Option<String>,
    pub complete: bool,
    /// Config attributes with no dedicated field
    pub extra: BTreeMap<String, serde_json::Value>,
    /// Ordered by publication date, numbered from 1
    pub episodes: Vec<Episode>,
    pub excluded: Vec<ExcludedFile>,
}

impl Feed {
    /// Feed for `folder` with the default attributes and no episodes
    pub fn for_folder(folder: &Path, config: &Config) -> Result<Self, FeedError> {
        let name = folder_name(folder);
        let feed_url = parse_url(folder_file_url(config, folder, FEED_FILENAME))?;
        let website = parse_url(config.base_url.clone())?;

        let image_url = if folder.join(IMAGE_FILENAME).is_file() {
            Some(parse_url(folder_file_url(config, folder, IMAGE_FILENAME))?)
        } else {
            None
        };

        Ok(Self {
            title: name.clone(),
            description: name,
            feed_url,
            website,
            image_url,
            explicit: false,
            author: None,
            language: None,
            copyright: None,
            category: None,
            subcategory: None,
            owner: None,
            subtitle: None,
            summary: None,
            complete: false,
            extra: BTreeMap::new(),
            episodes: Vec::new(),
            excluded: Vec::new(),
        })
    }

    /// Apply config overrides on top of the current attributes.
    ///
    /// `website` and relative `image` values are resolved against
    /// `folder_url`; values that do not form a URL are logged and ignored.
    pub fn apply_overrides(&mut self, overrides: &FeedOverrides, folder_url: &Url) {
        if let Some(title) = &overrides.title {
            self.title.clone_from(title);
        }
        if let Some(description) = &overrides.description {
            self.description.clone_from(description);
        }
        if let Some(website) = &overrides.website {
            match folder_url.join(website) {
                Ok(url) => self.website = url,
                Err(e) => {
                    tracing::warn!(feed = %self.title, %website, error = %e, "Ignoring invalid website override");
                }
            }
        }
        if let Some(image) = &overrides.image {
            match folder_url.join(image) {
                Ok(url) => self.image_url = Some(url),
                Err(e) => {
                    tracing::warn!(feed = %self.title, %image, error = %e, "Ignoring invalid image override");
                }
            }
        }
        if let Some(explicit) = overrides.explicit {
            self.explicit = explicit;
        }
        if let Some(complete) = overrides.complete {
            self.complete = complete;
        }

        let optional = [
            (&mut self.author, &overrides.author),
            (&mut self.language, &overrides.language),
            (&mut self.copyright, &overrides.copyright),
            (&mut self.category, &overrides.category),
            (&mut self.subcategory, &overrides.subcategory),
            (&mut self.subtitle, &overrides.subtitle),
            (&mut self.summary, &overrides.summary),
        ];
        for (slot, value) in optional {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        if overrides.owner_name.is_some() || overrides.owner_email.is_some() {
            let owner = self.owner.get_or_insert(Owner {
                name: None,
                email: None,
            });
            if overrides.owner_name.is_some() {
                owner.name.clone_from(&overrides.owner_name);
            }
            if overrides.owner_email.is_some() {
                owner.email.clone_from(&overrides.owner_email);
            }
        }

        for (key, value) in &overrides.extra {
            tracing::debug!(feed = %self.title, %key, "Keeping attribute without a feed field");
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// Assemble the feed for `folder`.
///
/// Returns `Ok(None)` when the folder holds no audio files. Files that fail
/// to build are excluded (or, for decode failures under
/// [`UnreadablePolicy::Keep`], kept without a duration) and never abort the
/// folder.
pub fn assemble_feed(
    folder: &Path,
    config: &Config,
    extractor: &MetadataExtractor,
    options: &FeedOptions,
    reporter: &SharedProgressReporter,
) -> Result<Option<Feed>, FeedError> {
    let files = find_audio_files(folder)?;
    if files.is_empty() {
        return Ok(None);
    }

    let name = folder_name(folder);
    let total = files.len();
    reporter.report(ProgressEvent::FolderStarted {
        folder: name.clone(),
        audio_files: total,
    });

    let mut feed = Feed::for_folder(folder, config)?;

    for (index, path) in files.into_iter().enumerate() {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match build_one(&path, folder, config, extractor, options, &name, reporter) {
            Ok(episode) => feed.episodes.push(episode),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Excluding file from feed");
                reporter.report(ProgressEvent::FileExcluded {
                    folder: name.clone(),
                    path: path.clone(),
                    reason: e.to_string(),
                });
                feed.excluded.push(ExcludedFile {
                    path,
                    reason: e.to_string(),
                });
            }
        }

        reporter.report(ProgressEvent::EpisodeProcessed {
            folder: name.clone(),
            file_name,
            index,
            total,
        });
    }

    number_episodes(&mut feed.episodes);

    let folder_url = parse_url(format!("{}/{}/", config.base(), encode_segment(&name)))?;
    feed.apply_overrides(&folder_overrides(folder, config), &folder_url);

    Ok(Some(feed))
}

/// Sort episodes by publication date (stable on ties) and number them from 1
pub fn number_episodes(episodes: &mut [Episode]) {
    episodes.sort_by_key(|e| e.pub_date);
    for (number, episode) in (1..).zip(episodes.iter_mut()) {
        episode.episode_number = Some(number);
    }
}

fn build_one(
    path: &Path,
    folder: &Path,
    config: &Config,
    extractor: &MetadataExtractor,
    options: &FeedOptions,
    folder_label: &str,
    reporter: &SharedProgressReporter,
) -> Result<Episode, EpisodeError> {
    let audio = AudioFile::from_path(path).map_err(|e| EpisodeError::StatFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    match build_episode(&audio, folder, config, extractor) {
        Err(EpisodeError::Extraction(e)) if options.unreadable == UnreadablePolicy::Keep => {
            tracing::warn!(file = %path.display(), error = %e, "Keeping file with unknown duration");
            reporter.report(ProgressEvent::DurationUnknown {
                folder: folder_label.to_string(),
                path: path.to_path_buf(),
            });
            build_episode_with_duration(&audio, folder, config, None)
        }
        result => result,
    }
}

/// Root defaults overlaid with the folder's own `config.json`
fn folder_overrides(folder: &Path, config: &Config) -> FeedOverrides {
    let mut overrides = config.defaults.clone();

    let own_config = folder.join(CONFIG_FILENAME);
    if config.source.as_deref() == Some(own_config.as_path()) {
        return overrides;
    }

    match FeedOverrides::load_for_folder(folder) {
        Ok(Some(folder_config)) => overrides.overlay(&folder_config),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(folder = %folder.display(), error = %e, "Ignoring folder config");
        }
    }

    overrides
}

fn parse_url(url: String) -> Result<Url, FeedError> {
    Url::parse(&url).map_err(|e| FeedError::InvalidUrl { url, source: e })
}
