use std::path::PathBuf;
use std::sync::Arc;

/// Events emitted while generating feeds, for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The root folder is being scanned for podcast folders
    ScanningRoot { root: PathBuf },

    /// A folder with audio files is being turned into a feed
    FolderStarted {
        folder: String,
        /// Number of audio files found in the folder
        audio_files: usize,
    },

    /// An audio file has been processed (included or excluded)
    EpisodeProcessed {
        folder: String,
        /// Name of the audio file, without its folder
        file_name: String,
        /// Index of this file in discovery order
        index: usize,
        total: usize,
    },

    /// An audio file could not be decoded but was kept with unknown duration
    DurationUnknown { folder: String, path: PathBuf },

    /// An audio file was left out of the feed
    FileExcluded {
        folder: String,
        path: PathBuf,
        reason: String,
    },

    /// A folder had no audio files; no feed was written
    FolderSkipped { folder: String },

    /// A feed file was written
    FeedWritten {
        folder: String,
        path: PathBuf,
        episodes: usize,
    },

    /// A folder failed; other folders are still processed
    FolderFailed { folder: String, error: String },

    /// Every folder has been processed
    RunCompleted {
        feeds_written: usize,
        folders_skipped: usize,
        folders_failed: usize,
        files_excluded: usize,
    },
}

/// Trait for reporting progress events during feed generation.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

/// Records every event; used by tests to check what was reported
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    pub events: std::sync::Mutex<Vec<ProgressEvent>>,
}

#[cfg(test)]
impl ProgressReporter for RecordingReporter {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_reporter_handles_all_events() {
        let reporter = NoopReporter;

        reporter.report(ProgressEvent::ScanningRoot {
            root: PathBuf::from("/srv/podcasts"),
        });

        reporter.report(ProgressEvent::FolderStarted {
            folder: "Show".to_string(),
            audio_files: 3,
        });

        reporter.report(ProgressEvent::EpisodeProcessed {
            folder: "Show".to_string(),
            file_name: "2021-01-10 Pilot.mp3".to_string(),
            index: 0,
            total: 3,
        });

        reporter.report(ProgressEvent::DurationUnknown {
            folder: "Show".to_string(),
            path: PathBuf::from("/srv/podcasts/Show/odd.mp3"),
        });

        reporter.report(ProgressEvent::FileExcluded {
            folder: "Show".to_string(),
            path: PathBuf::from("/srv/podcasts/Show/bad.mp3"),
            reason: "No decoder could read it".to_string(),
        });

        reporter.report(ProgressEvent::FolderSkipped {
            folder: "Empty".to_string(),
        });

        reporter.report(ProgressEvent::FeedWritten {
            folder: "Show".to_string(),
            path: PathBuf::from("/srv/podcasts/Show/podcast.rss"),
            episodes: 2,
        });

        reporter.report(ProgressEvent::FolderFailed {
            folder: "Broken".to_string(),
            error: "Permission denied".to_string(),
        });

        reporter.report(ProgressEvent::RunCompleted {
            feeds_written: 1,
            folders_skipped: 1,
            folders_failed: 1,
            files_excluded: 1,
        });
    }

    #[test]
    fn recording_reporter_keeps_order() {
        let reporter = RecordingReporter::default();

        reporter.report(ProgressEvent::FolderSkipped {
            folder: "A".to_string(),
        });
        reporter.report(ProgressEvent::FolderSkipped {
            folder: "B".to_string(),
        });

        let events = reporter.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], ProgressEvent::FolderSkipped { folder } if folder == "B"));
    }
}
