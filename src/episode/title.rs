use std::path::Path;

use chrono::{DateTime, Utc};

use super::date::parse_fuzzy;

/// Secondary extensions of this many characters are stripped from titles
const SPURIOUS_SUFFIX_LEN: std::ops::RangeInclusive<usize> = 1..=5;

/// Where an episode's publication timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// A date embedded in the file name
    Filename,
    /// The file's last modification time
    ModifiedTime,
}

/// Title and publication timestamp inferred from a file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredTitle {
    pub title: String,
    pub published: DateTime<Utc>,
    pub source: DateSource,
}

impl InferredTitle {
    /// Whether the publication timestamp was read from the file name
    pub fn derived_from_filename(&self) -> bool {
        self.source == DateSource::Filename
    }
}

/// Derive a display title from a file stem (the name without its extension).
///
/// Names like `episode.mp3.wav` leave a stem of `episode.mp3`; a trailing
/// pseudo-extension of 1 to 5 characters is removed as well.
pub fn infer_title(stem: &str) -> String {
    let inner = Path::new(stem);

    let has_spurious_suffix = inner
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SPURIOUS_SUFFIX_LEN.contains(&ext.chars().count()));

    if has_spurious_suffix && let Some(inner_stem) = inner.file_stem() {
        return inner_stem.to_string_lossy().into_owned();
    }

    stem.to_string()
}

/// Pick the publication timestamp for an episode titled `title`.
///
/// A date found in the title is taken as UTC; otherwise `modified` is used.
pub fn infer_publication_date(
    title: &str,
    modified: DateTime<Utc>,
) -> (DateTime<Utc>, DateSource) {
    match parse_fuzzy(title) {
        Some(naive) => (naive.and_utc(), DateSource::Filename),
        None => (modified, DateSource::ModifiedTime),
    }
}

/// Infer both title and publication timestamp from a file stem
pub fn infer(stem: &str, modified: DateTime<Utc>) -> InferredTitle {
    let title = infer_title(stem);
    let (published, source) = infer_publication_date(&title, modified);

    InferredTitle {
        title,
        published,
        source,
    }
}
