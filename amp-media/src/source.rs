//! # Media Sources
//!
//! Descriptors for where a clip's encoded audio comes from. The three
//! variants mirror the construction surface exposed to hosts: a local file
//! path, an in-memory buffer, or a remote URL.

use crate::traits::AudioCodec;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;

/// Source of encoded audio data for a managed player.
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// Audio file stored locally on the filesystem.
    LocalFile {
        /// Absolute path to the audio file
        path: PathBuf,
    },

    /// Audio data supplied by the caller, already in memory.
    MemoryBuffer {
        /// Raw audio data (encoded format, not PCM)
        data: Bytes,
        /// Optional hint about the source codec
        codec_hint: Option<AudioCodec>,
    },

    /// Audio fetched from a remote HTTP(S) endpoint before decoding.
    RemoteUrl {
        /// Full URL to the audio resource
        url: String,
        /// HTTP headers to include in the request (e.g., Authorization)
        headers: HashMap<String, String>,
    },
}

impl MediaSource {
    /// Construct a local file source.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        MediaSource::LocalFile { path: path.into() }
    }

    /// Construct an in-memory source without a codec hint.
    pub fn memory(data: impl Into<Bytes>) -> Self {
        MediaSource::MemoryBuffer {
            data: data.into(),
            codec_hint: None,
        }
    }

    /// Construct an in-memory source with a codec hint.
    pub fn memory_with_hint(data: impl Into<Bytes>, codec: AudioCodec) -> Self {
        MediaSource::MemoryBuffer {
            data: data.into(),
            codec_hint: Some(codec),
        }
    }

    /// Construct a remote source without extra headers.
    pub fn remote(url: impl Into<String>) -> Self {
        MediaSource::RemoteUrl {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Returns `true` if this source requires network access.
    pub fn is_remote(&self) -> bool {
        matches!(self, MediaSource::RemoteUrl { .. })
    }

    /// Returns the estimated size in bytes, if known.
    pub fn estimated_size(&self) -> Option<usize> {
        match self {
            MediaSource::MemoryBuffer { data, .. } => Some(data.len()),
            _ => None,
        }
    }

    /// Short description used in logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            MediaSource::LocalFile { path } => path.display().to_string(),
            MediaSource::MemoryBuffer { data, .. } => {
                format!("memory buffer ({} bytes)", data.len())
            }
            MediaSource::RemoteUrl { url, .. } => url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_classification() {
        let local = MediaSource::local("/path/to/file.mp3");
        assert!(!local.is_remote());
        assert_eq!(local.estimated_size(), None);

        let remote = MediaSource::remote("https://example.com/stream.mp3");
        assert!(remote.is_remote());

        let memory = MediaSource::memory_with_hint(vec![1u8, 2, 3, 4], AudioCodec::Mp3);
        assert!(!memory.is_remote());
        assert_eq!(memory.estimated_size(), Some(4));
    }

    #[test]
    fn describe_mentions_origin() {
        assert!(MediaSource::local("/music/a.flac")
            .describe()
            .contains("a.flac"));
        assert!(MediaSource::memory(vec![0u8; 16]).describe().contains("16"));
        assert!(MediaSource::remote("https://cdn.example.com/x.ogg")
            .describe()
            .contains("x.ogg"));
    }
}
