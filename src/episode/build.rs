// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Component, Path};
use std::time::Duration;

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::audio::{AudioFile, MetadataExtractor, mime_for_extension};
use crate::config::Config;
use crate::error::EpisodeError;

use super::title::{DateSource, infer};

/// Bytes left unescaped in URL path segments; everything else is percent-encoded
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A single podcast episode built from an audio file
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    /// Stable identifier; equal to the enclosure URL
    pub guid: String,
    pub title: String,
    pub pub_date: DateTime<Utc>,
    pub date_source: DateSource,
    pub enclosure: Enclosure,
    /// Unknown when no decoder could read the file
    pub duration: Option<Duration>,
    /// Assigned once all episodes of a feed are ordered
    pub episode_number: Option<u32>,
}

/// The media file attached to an episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enclosure {
    pub url: Url,
    pub length: u64,
    pub mime_type: String,
}

/// Percent-encode one URL path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Name of a folder as used in titles and URLs
pub fn folder_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// URL of a file directly inside `folder`, such as the feed or its cover image
pub fn folder_file_url(config: &Config, folder: &Path, file_name: &str) -> String {
    format!(
        "{}/{}/{}",
        config.base(),
        encode_segment(&folder_name(folder)),
        encode_segment(file_name)
    )
}

/// Build the public URL of an audio file.
///
/// `base_url/<folder name>/<relative path>`, with every path segment
/// percent-encoded on its own so the separators stay literal.
pub fn episode_url(config: &Config, folder: &Path, path: &Path) -> Result<Url, EpisodeError> {
    let relative = path
        .strip_prefix(folder)
        .map_err(|_| EpisodeError::OutsideFolder {
            path: path.to_path_buf(),
            folder: folder.to_path_buf(),
        })?;

    let mut url = format!("{}/{}", config.base(), encode_segment(&folder_name(folder)));
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            url.push('/');
            url.push_str(&encode_segment(&segment.to_string_lossy()));
        }
    }

    Url::parse(&url).map_err(|e| EpisodeError::InvalidUrl { url, source: e })
}

/// Build an episode for `audio`, which lives somewhere under `folder`.
///
/// Extraction failures are returned as errors; callers that want to keep
/// undecodable files use [`build_episode_with_duration`] instead.
pub fn build_episode(
    audio: &AudioFile,
    folder: &Path,
    config: &Config,
    extractor: &MetadataExtractor,
) -> Result<Episode, EpisodeError> {
    let metadata = extractor.extract(&audio.path)?;
    build_episode_with_duration(audio, folder, config, Some(metadata.duration))
}

/// Build an episode with an already known (or unknown) duration
pub fn build_episode_with_duration(
    audio: &AudioFile,
    folder: &Path,
    config: &Config,
    duration: Option<Duration>,
) -> Result<Episode, EpisodeError> {
    let url = episode_url(config, folder, &audio.path)?;
    let inferred = infer(&audio.stem(), audio.modified);

    tracing::debug!(
        file = %audio.path.display(),
        title = %inferred.title,
        pub_date = %inferred.published,
        from_filename = inferred.derived_from_filename(),
        "Built episode"
    );

    Ok(Episode {
        guid: url.to_string(),
        title: inferred.title,
        pub_date: inferred.published,
        date_source: inferred.source,
        enclosure: Enclosure {
            url,
            length: audio.size,
            mime_type: mime_for_extension(&audio.extension).to_string(),
        },
        duration,
        episode_number: None,
    })
}
