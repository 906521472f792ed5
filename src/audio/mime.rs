/// MIME type used when an extension is not in the table
const FALLBACK_MIME: &str = "application/octet-stream";

/// Map an audio file extension to the MIME type announced in the enclosure
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "mp3" => "audio/mpeg",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "m4a" => "audio/x-m4a",
        "wav" => "audio/wav",
        "aiff" => "audio/aiff",
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "mov" => "video/quicktime",
        _ => FALLBACK_MIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AUDIO_EXTENSIONS;

    #[test]
    fn mp3_maps_to_mpeg() {
        assert_eq!(mime_for_extension("mp3"), "audio/mpeg");
    }

    #[test]
    fn m4a_maps_to_x_m4a() {
        assert_eq!(mime_for_extension("m4a"), "audio/x-m4a");
    }

    #[test]
    fn video_containers_keep_video_types() {
        assert_eq!(mime_for_extension("mp4"), "video/mp4");
        assert_eq!(mime_for_extension("mov"), "video/quicktime");
    }

    #[test]
    fn every_allowed_extension_has_a_type() {
        for ext in AUDIO_EXTENSIONS {
            assert_ne!(mime_for_extension(ext), FALLBACK_MIME, "{ext}");
        }
    }

    #[test]
    fn unknown_extension_falls_back() {
        assert_eq!(mime_for_extension("flac"), FALLBACK_MIME);
        assert_eq!(mime_for_extension(""), FALLBACK_MIME);
    }
}
