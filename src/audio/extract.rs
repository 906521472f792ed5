// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;
use std::time::Duration;

use lofty::file::{AudioFile as _, FileType};
use lofty::probe::Probe;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{DecoderError, ExtractionError};

/// Metadata read from an audio file
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMetadata {
    /// Playback length, always non-zero
    pub duration: Duration,
    /// Name of the decoder that produced the duration
    pub decoder: &'static str,
}

/// One way of reading the duration of an audio file.
///
/// `Ok(None)` means the decoder understood the file but found no duration.
pub trait DurationProbe: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Try to read the duration of the file at `path`
    fn probe(&self, path: &Path) -> Result<Option<Duration>, DecoderError>;
}

/// lofty with the container detected from file content, ignoring the extension
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyAutoDetect;

impl DurationProbe for LoftyAutoDetect {
    fn name(&self) -> &'static str {
        "lofty(auto)"
    }

    fn probe(&self, path: &Path) -> Result<Option<Duration>, DecoderError> {
        let tagged = Probe::open(path)?.guess_file_type()?.read()?;
        Ok(Some(tagged.properties().duration()))
    }
}

/// lofty forced to read the file as one specific container
#[derive(Debug, Clone, Copy)]
pub struct LoftyFormat {
    name: &'static str,
    file_type: FileType,
}

impl LoftyFormat {
    pub fn new(name: &'static str, file_type: FileType) -> Self {
        Self { name, file_type }
    }
}

impl DurationProbe for LoftyFormat {
    fn name(&self) -> &'static str {
        self.name
    }

    fn probe(&self, path: &Path) -> Result<Option<Duration>, DecoderError> {
        let tagged = Probe::open(path)?.set_file_type(self.file_type).read()?;
        Ok(Some(tagged.properties().duration()))
    }
}

/// symphonia's content-sniffing probe, computing duration from the default track
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaProbe;

impl DurationProbe for SymphoniaProbe {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn probe(&self, path: &Path) -> Result<Option<Duration>, DecoderError> {
        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Probe by content only; extensions may lie.
        let probed = symphonia::default::get_probe().format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let Some(track) = probed.format.default_track() else {
            return Ok(None);
        };
        let params = &track.codec_params;

        if let (Some(n_frames), Some(sample_rate)) = (params.n_frames, params.sample_rate)
            && sample_rate > 0
        {
            return Ok(Some(Duration::from_secs_f64(
                n_frames as f64 / sample_rate as f64,
            )));
        }

        if let (Some(time_base), Some(n_frames)) = (params.time_base, params.n_frames) {
            let time = time_base.calc_time(n_frames);
            return Ok(Some(
                Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac),
            ));
        }

        Ok(None)
    }
}

/// Reads audio durations by trying an ordered chain of decoders
pub struct MetadataExtractor {
    probes: Vec<Box<dyn DurationProbe>>,
}

impl MetadataExtractor {
    /// Create an extractor with the default chain: generic decoders first,
    /// then lofty forced to each common container.
    pub fn new() -> Self {
        Self::with_probes(vec![
            Box::new(LoftyAutoDetect),
            Box::new(SymphoniaProbe),
            Box::new(LoftyFormat::new("lofty(mp3)", FileType::Mpeg)),
            Box::new(LoftyFormat::new("lofty(mp4)", FileType::Mp4)),
            Box::new(LoftyFormat::new("lofty(aac)", FileType::Aac)),
            Box::new(LoftyFormat::new("lofty(vorbis)", FileType::Vorbis)),
            Box::new(LoftyFormat::new("lofty(wav)", FileType::Wav)),
            Box::new(LoftyFormat::new("lofty(aiff)", FileType::Aiff)),
        ])
    }

    /// Create an extractor with a custom chain
    pub fn with_probes(probes: Vec<Box<dyn DurationProbe>>) -> Self {
        Self { probes }
    }

    /// Names of the decoders in the order they are tried
    pub fn probe_names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Read the duration of `path`.
    ///
    /// The first decoder that reports a non-zero duration wins.
    pub fn extract(&self, path: &Path) -> Result<ExtractedMetadata, ExtractionError> {
        let mut attempts = Vec::with_capacity(self.probes.len());

        for probe in &self.probes {
            match probe.probe(path) {
                Ok(Some(duration)) if !duration.is_zero() => {
                    tracing::debug!(
                        file = %path.display(),
                        decoder = probe.name(),
                        duration_s = duration.as_secs_f64(),
                        "Extracted duration"
                    );
                    return Ok(ExtractedMetadata {
                        duration,
                        decoder: probe.name(),
                    });
                }
                Ok(_) => attempts.push(format!("{}: no duration", probe.name())),
                Err(e) => attempts.push(format!("{}: {}", probe.name(), e)),
            }
        }

        Err(ExtractionError::Undecodable {
            path: path.to_path_buf(),
            attempts,
        })
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a minimal PCM WAV file: 8-bit mono at `sample_rate`.
#[cfg(test)]
pub(crate) fn wav_bytes(sample_rate: u32, seconds: u32) -> Vec<u8> {
    let data_len = sample_rate * seconds;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);

    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // channels
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes()); // byte rate
    bytes.extend_from_slice(&1u16.to_le_bytes()); // block align
    bytes.extend_from_slice(&8u16.to_le_bytes()); // bits per sample

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0x80);

    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    struct Fixed {
        name: &'static str,
        result: Option<Duration>,
    }

    impl Fixed {
        fn new(name: &'static str, result: Option<Duration>) -> Self {
            Self { name, result }
        }
    }

    impl DurationProbe for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn probe(&self, _path: &Path) -> Result<Option<Duration>, DecoderError> {
            Ok(self.result)
        }
    }

    struct Unreachable;

    impl DurationProbe for Unreachable {
        fn name(&self) -> &'static str {
            "unreachable"
        }

        fn probe(&self, _path: &Path) -> Result<Option<Duration>, DecoderError> {
            panic!("probe called after an earlier decoder succeeded");
        }
    }

    struct Failing;

    impl DurationProbe for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn probe(&self, _path: &Path) -> Result<Option<Duration>, DecoderError> {
            Err(DecoderError::Io(std::io::Error::other("boom")))
        }
    }

    fn assert_close(duration: Duration, secs: f64) {
        assert!(
            (duration.as_secs_f64() - secs).abs() < 0.05,
            "expected ~{secs}s, got {duration:?}"
        );
    }

    #[test]
    fn default_chain_starts_with_generic_decoders() {
        let names = MetadataExtractor::new().probe_names();
        assert_eq!(names[0], "lofty(auto)");
        assert_eq!(names[1], "symphonia");
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn first_successful_probe_wins() {
        let extractor = MetadataExtractor::with_probes(vec![
            Box::new(Failing),
            Box::new(Fixed::new("second", Some(Duration::from_secs(60)))),
            Box::new(Fixed::new("third", Some(Duration::from_secs(99)))),
        ]);

        let meta = extractor.extract(Path::new("ignored.mp3")).unwrap();

        assert_eq!(meta.duration, Duration::from_secs(60));
        assert_eq!(meta.decoder, "second");
    }

    #[test]
    fn zero_and_missing_durations_fall_through() {
        let extractor = MetadataExtractor::with_probes(vec![
            Box::new(Fixed::new("none", None)),
            Box::new(Fixed::new("zero", Some(Duration::ZERO))),
            Box::new(Fixed::new("real", Some(Duration::from_secs(30)))),
        ]);

        let meta = extractor.extract(Path::new("ignored.mp3")).unwrap();

        assert_eq!(meta.decoder, "real");
    }

    #[test]
    fn all_failures_are_collected() {
        let extractor = MetadataExtractor::with_probes(vec![
            Box::new(Failing),
            Box::new(Fixed::new("none", None)),
        ]);

        let err = extractor.extract(Path::new("bad.mp3")).unwrap_err();

        let ExtractionError::Undecodable { path, attempts } = err;
        assert_eq!(path, Path::new("bad.mp3"));
        assert_eq!(attempts.len(), 2);
        assert!(attempts[0].starts_with("failing: "));
        assert_eq!(attempts[1], "none: no duration");
    }

    #[test]
    fn later_probes_are_not_called_after_success() {
        let extractor = MetadataExtractor::with_probes(vec![
            Box::new(Fixed::new("first", Some(Duration::from_secs(1)))),
            Box::new(Unreachable),
        ]);

        let meta = extractor.extract(Path::new("x.mp3")).unwrap();
        assert_eq!(meta.decoder, "first");
    }

    #[test]
    fn reads_wav_duration() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        std::fs::write(&path, wav_bytes(8000, 2)).unwrap();

        let meta = MetadataExtractor::new().extract(&path).unwrap();

        assert_close(meta.duration, 2.0);
    }

    #[test]
    fn reads_wav_with_misleading_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("actually-a-wav.mp3");
        std::fs::write(&path, wav_bytes(8000, 1)).unwrap();

        let meta = MetadataExtractor::new().extract(&path).unwrap();

        assert_close(meta.duration, 1.0);
    }

    #[test]
    fn symphonia_reads_wav_without_hint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.bin");
        std::fs::write(&path, wav_bytes(8000, 3)).unwrap();

        let duration = SymphoniaProbe.probe(&path).unwrap().unwrap();

        assert_close(duration, 3.0);
    }

    #[test]
    fn garbage_is_undecodable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"this is definitely not audio").unwrap();

        let result = MetadataExtractor::new().extract(&path);

        assert!(matches!(result, Err(ExtractionError::Undecodable { .. })));
    }

    #[test]
    fn missing_file_is_undecodable() {
        let dir = tempdir().unwrap();
        let result = MetadataExtractor::new().extract(&dir.path().join("gone.mp3"));
        assert!(result.is_err());
    }
}
