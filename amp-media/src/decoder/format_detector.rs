//! # Format Detection Module
//!
//! Provides format detection helpers around Symphonia's probe system.

use crate::error::{MediaError, Result};
use crate::traits::AudioCodec;
use std::path::Path;
use symphonia::core::codecs::CodecType;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Format detector for audio streams.
///
/// Utilities for deriving probe hints from file extensions and codec hints,
/// and for mapping Symphonia's codec types onto the engine's
/// [`AudioCodec`] enum. Hints significantly improve probe accuracy and
/// speed but are never required.
pub struct FormatDetector;

impl FormatDetector {
    /// Create a probe hint from a file path.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amp_media::FormatDetector;
    /// use std::path::Path;
    ///
    /// let hint = FormatDetector::hint_from_path(Path::new("/music/song.mp3"));
    /// // Hint will contain extension "mp3"
    /// ```
    pub fn hint_from_path(path: &Path) -> Hint {
        let mut hint = Hint::new();

        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            debug!("Setting probe hint extension: {}", extension);
            hint.with_extension(extension);
        } else {
            debug!("No file extension found, probe will auto-detect");
        }

        hint
    }

    /// Create a probe hint from a codec hint.
    pub fn hint_from_codec(codec: &AudioCodec) -> Hint {
        let mut hint = Hint::new();
        hint.with_extension(Self::codec_extension(codec));
        hint
    }

    /// Create a probe hint from an extension string (e.g., from a URL path).
    pub fn hint_from_extension(extension: &str) -> Hint {
        let mut hint = Hint::new();
        hint.with_extension(extension);
        hint
    }

    /// Detect audio codec from Symphonia codec type.
    pub fn detect_codec(codec_type: CodecType) -> AudioCodec {
        use symphonia::core::codecs::*;

        if codec_type == CODEC_TYPE_MP3 {
            AudioCodec::Mp3
        } else if codec_type == CODEC_TYPE_AAC {
            AudioCodec::Aac
        } else if codec_type == CODEC_TYPE_FLAC {
            AudioCodec::Flac
        } else if codec_type == CODEC_TYPE_VORBIS {
            AudioCodec::Vorbis
        } else if codec_type == CODEC_TYPE_OPUS {
            AudioCodec::Opus
        } else if codec_type == CODEC_TYPE_ALAC {
            AudioCodec::Alac
        } else if codec_type == CODEC_TYPE_PCM_S16LE
            || codec_type == CODEC_TYPE_PCM_S16BE
            || codec_type == CODEC_TYPE_PCM_S24LE
            || codec_type == CODEC_TYPE_PCM_S24BE
            || codec_type == CODEC_TYPE_PCM_S32LE
            || codec_type == CODEC_TYPE_PCM_S32BE
            || codec_type == CODEC_TYPE_PCM_F32LE
            || codec_type == CODEC_TYPE_PCM_F32BE
            || codec_type == CODEC_TYPE_PCM_F64LE
            || codec_type == CODEC_TYPE_PCM_F64BE
        {
            AudioCodec::Wav
        } else {
            warn!("Unknown codec type: {:?}", codec_type);
            AudioCodec::Unknown
        }
    }

    /// Reject codecs the decoder cannot handle.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Codec is supported
    /// - `Err(MediaError::UnsupportedCodec)` - Codec unknown or proprietary
    pub fn ensure_supported(codec: &AudioCodec) -> Result<()> {
        match codec {
            AudioCodec::Unknown => Err(MediaError::UnsupportedCodec(
                "Unknown audio codec".to_string(),
            )),
            AudioCodec::Other(name) => Err(MediaError::UnsupportedCodec(format!(
                "Unsupported codec: {}",
                name
            ))),
            _ => Ok(()),
        }
    }

    /// Map a file extension to a codec, for hint purposes.
    pub fn codec_from_extension(extension: &str) -> Option<AudioCodec> {
        match extension.to_ascii_lowercase().as_str() {
            "mp3" => Some(AudioCodec::Mp3),
            "aac" | "m4a" | "mp4" => Some(AudioCodec::Aac),
            "flac" => Some(AudioCodec::Flac),
            "ogg" | "oga" => Some(AudioCodec::Vorbis),
            "opus" => Some(AudioCodec::Opus),
            "wav" | "wave" => Some(AudioCodec::Wav),
            _ => None,
        }
    }

    /// Get the common file extension for a codec.
    pub fn codec_extension(codec: &AudioCodec) -> &'static str {
        match codec {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Aac => "m4a",
            AudioCodec::Flac => "flac",
            AudioCodec::Vorbis => "ogg",
            AudioCodec::Opus => "opus",
            AudioCodec::Wav => "wav",
            AudioCodec::Alac => "m4a",
            AudioCodec::Unknown => "bin",
            AudioCodec::Other(_) => "bin",
        }
    }

    /// Get the MIME type for a codec.
    pub fn codec_mime_type(codec: &AudioCodec) -> &'static str {
        match codec {
            AudioCodec::Mp3 => "audio/mpeg",
            AudioCodec::Aac => "audio/mp4",
            AudioCodec::Flac => "audio/flac",
            AudioCodec::Vorbis => "audio/ogg",
            AudioCodec::Opus => "audio/opus",
            AudioCodec::Wav => "audio/wav",
            AudioCodec::Alac => "audio/mp4",
            AudioCodec::Unknown => "application/octet-stream",
            AudioCodec::Other(_) => "application/octet-stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_from_path_does_not_panic() {
        let path = Path::new("/music/song.mp3");
        let _hint = FormatDetector::hint_from_path(path);

        let bare = Path::new("/music/song");
        let _hint = FormatDetector::hint_from_path(bare);
    }

    #[test]
    fn codec_extension_mapping() {
        assert_eq!(FormatDetector::codec_extension(&AudioCodec::Mp3), "mp3");
        assert_eq!(FormatDetector::codec_extension(&AudioCodec::Flac), "flac");
        assert_eq!(FormatDetector::codec_extension(&AudioCodec::Vorbis), "ogg");
        assert_eq!(FormatDetector::codec_extension(&AudioCodec::Wav), "wav");
    }

    #[test]
    fn codec_mime_type_mapping() {
        assert_eq!(
            FormatDetector::codec_mime_type(&AudioCodec::Mp3),
            "audio/mpeg"
        );
        assert_eq!(
            FormatDetector::codec_mime_type(&AudioCodec::Flac),
            "audio/flac"
        );
    }

    #[test]
    fn codec_from_extension_round_trip() {
        assert_eq!(
            FormatDetector::codec_from_extension("mp3"),
            Some(AudioCodec::Mp3)
        );
        assert_eq!(
            FormatDetector::codec_from_extension("FLAC"),
            Some(AudioCodec::Flac)
        );
        assert_eq!(FormatDetector::codec_from_extension("xyz"), None);
    }

    #[test]
    fn unsupported_codecs_rejected() {
        assert!(FormatDetector::ensure_supported(&AudioCodec::Mp3).is_ok());
        assert!(FormatDetector::ensure_supported(&AudioCodec::Unknown).is_err());
        assert!(
            FormatDetector::ensure_supported(&AudioCodec::Other("custom".to_string())).is_err()
        );
    }
}
