mod extract;
mod mime;
mod scan;

#[cfg(test)]
pub(crate) use extract::wav_bytes;
pub use extract::{
    DurationProbe, ExtractedMetadata, LoftyAutoDetect, LoftyFormat, MetadataExtractor,
    SymphoniaProbe,
};
pub use mime::mime_for_extension;
pub use scan::{AUDIO_EXTENSIONS, AudioFile, find_audio_files, is_audio_path};
