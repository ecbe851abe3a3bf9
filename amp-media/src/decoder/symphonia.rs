//! # Symphonia Decoder Implementation
//!
//! Audio decoder built on the Symphonia library.

use crate::decoder::format_detector::FormatDetector;
use crate::decoder::sample_converter::SampleConverter;
use crate::error::{MediaError, Result};
use crate::source::MediaSource as ClipSource;
use crate::traits::{AudioDecoder, AudioFormat, AudioFrameChunk, ProbeResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Cursor;
use std::time::Duration;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::Hint;
use symphonia::core::units::Time;
use tracing::{debug, error, info, instrument, warn};

/// Maximum number of consecutive bad packets tolerated before the stream is
/// declared corrupted.
const MAX_CONSECUTIVE_ERRORS: usize = 10;

/// Symphonia-backed implementation of the [`AudioDecoder`] trait.
///
/// Manages the full decode pipeline:
/// - Media source abstraction (file or memory buffer)
/// - Format detection and probing
/// - Container demultiplexing
/// - Codec decoding
/// - Sample format conversion
///
/// Packets often carry more frames than a caller asks for; the surplus is
/// retained in an internal buffer and served by subsequent
/// `decode_frames()` calls, so no decoded audio is ever dropped.
pub struct SymphoniaDecoder {
    /// Format reader (demuxer) - owns the media source stream
    format_reader: Box<dyn FormatReader>,

    /// Codec decoder
    decoder: Box<dyn Decoder>,

    /// Selected track ID
    track_id: u32,

    /// Audio format information
    format: AudioFormat,

    /// Track duration (if known)
    duration: Option<Duration>,

    /// Metadata tags
    tags: HashMap<String, String>,

    /// Decoded samples not yet handed out
    pending: Vec<f32>,

    /// Presentation frame index of the next sample to deliver
    next_frame: u64,

    sample_rate: u32,
    channels: u16,

    /// End-of-stream flag
    eof: bool,

    /// Source description (for error reporting)
    source_info: String,
}

impl SymphoniaDecoder {
    /// Create a new decoder from a media source.
    ///
    /// Remote sources must be fetched to a memory buffer before reaching
    /// the decoder; passing [`ClipSource::RemoteUrl`] is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The source cannot be opened
    /// - The format is not recognized
    /// - No decodable audio track is found
    #[instrument(skip(source))]
    pub fn new(source: ClipSource) -> Result<Self> {
        let (media_source, hint, source_info) = Self::open_media_source(source)?;

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                media_source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                error!("Format probe failed: {}", e);
                MediaError::InvalidFormat(format!("Failed to probe format: {}", e))
            })?;

        let mut format_reader = probed.format;

        // First audio track with a recognized codec
        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                error!("No supported audio tracks found in {}", source_info);
                MediaError::FormatNotDecodable("No supported audio tracks".to_string())
            })?;

        let track_id = track.id;
        debug!("Selected track ID: {}", track_id);

        let codec_type = track.codec_params.codec;
        let codec = FormatDetector::detect_codec(codec_type);
        FormatDetector::ensure_supported(&codec)?;
        info!("Detected codec: {:?}", codec);

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| MediaError::InvalidFormat("Missing sample rate".to_string()))?;

        // Channels might not be known until the first decode (notably AAC);
        // assume stereo and correct after the first packet.
        let channels = track
            .codec_params
            .channels
            .map(|ch| ch.count() as u16)
            .unwrap_or(2);

        let bits_per_sample = track.codec_params.bits_per_sample.map(|b| b as u16);

        let duration = track
            .codec_params
            .n_frames
            .map(|frames| Duration::from_secs_f64(frames as f64 / sample_rate as f64));

        debug!(
            "Audio params: {}Hz, {} channels, {:?} bits, duration {:?}",
            sample_rate, channels, bits_per_sample, duration
        );

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| {
                error!("Failed to create decoder: {}", e);
                MediaError::DecoderError(format!("Failed to create codec decoder: {}", e))
            })?;

        let tags = Self::collect_tags(format_reader.as_mut());

        info!("Decoder initialized for {}", source_info);

        Ok(Self {
            format_reader,
            decoder,
            track_id,
            format: AudioFormat::new(codec, sample_rate, channels, bits_per_sample, None),
            duration,
            tags,
            pending: Vec::new(),
            next_frame: 0,
            sample_rate,
            channels,
            eof: false,
            source_info,
        })
    }

    /// Open a media source from the clip source enum.
    fn open_media_source(
        source: ClipSource,
    ) -> Result<(MediaSourceStream, Hint, String)> {
        match source {
            ClipSource::LocalFile { path } => {
                let file = std::fs::File::open(&path).map_err(|e| {
                    error!("Failed to open file {:?}: {}", path, e);
                    MediaError::SourceError(format!("Failed to open file: {}", e))
                })?;

                let hint = FormatDetector::hint_from_path(&path);
                let media_source = Box::new(file) as Box<dyn MediaSource>;
                let mss = MediaSourceStream::new(media_source, Default::default());

                Ok((mss, hint, path.display().to_string()))
            }
            ClipSource::MemoryBuffer { data, codec_hint } => {
                let hint = match &codec_hint {
                    Some(codec) => FormatDetector::hint_from_codec(codec),
                    None => Hint::new(),
                };

                let info = format!("memory buffer ({} bytes)", data.len());
                let cursor = Cursor::new(data.to_vec());
                let media_source = Box::new(cursor) as Box<dyn MediaSource>;
                let mss = MediaSourceStream::new(media_source, Default::default());

                Ok((mss, hint, info))
            }
            ClipSource::RemoteUrl { url, .. } => Err(MediaError::SourceError(format!(
                "Remote source {} must be fetched before decoding",
                url
            ))),
        }
    }

    /// Pull container tags from the format reader.
    fn collect_tags(format_reader: &mut dyn FormatReader) -> HashMap<String, String> {
        let mut tags = HashMap::new();
        if let Some(revision) = format_reader.metadata().current() {
            Self::insert_revision_tags(&mut tags, revision);
        }
        tags
    }

    fn insert_revision_tags(tags: &mut HashMap<String, String>, revision: &MetadataRevision) {
        for tag in revision.tags() {
            let key = match tag.std_key {
                Some(StandardTagKey::TrackTitle) => "title".to_string(),
                Some(StandardTagKey::Artist) => "artist".to_string(),
                Some(StandardTagKey::Album) => "album".to_string(),
                Some(StandardTagKey::Genre) => "genre".to_string(),
                Some(StandardTagKey::Date) => "date".to_string(),
                Some(StandardTagKey::TrackNumber) => "track".to_string(),
                _ => tag.key.to_lowercase(),
            };
            tags.insert(key, tag.value.to_string());
        }
    }

    /// Read and decode the next packet of the selected track.
    ///
    /// Handles packet reading, filtering, and decoding with error recovery:
    /// corrupted packets are skipped up to a consecutive-error budget, and
    /// only unrecoverable errors propagate.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(samples))` - Owned interleaved f32 samples
    /// - `Ok(None)` - End of stream reached
    /// - `Err(MediaError)` - Unrecoverable error
    fn decode_next_packet(&mut self) -> Result<Option<Vec<f32>>> {
        if self.eof {
            return Ok(None);
        }

        let mut consecutive_errors = 0;

        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => {
                    consecutive_errors = 0;
                    packet
                }
                Err(SymphoniaError::ResetRequired) => {
                    // Track list changed (rare, e.g., chained OGG streams)
                    warn!("Decoder reset required for track list change");
                    return Err(MediaError::DecoderError(
                        "Track list changed, reset required".to_string(),
                    ));
                }
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    // Normal end of stream
                    debug!("Reached end of stream at frame {}", self.next_frame);
                    self.eof = true;
                    return Ok(None);
                }
                Err(SymphoniaError::IoError(e)) => {
                    consecutive_errors += 1;
                    warn!(
                        "I/O error reading packet (attempt {}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, e
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("Too many consecutive I/O errors, giving up");
                        return Err(MediaError::SourceError(format!(
                            "Stream I/O failure after {} attempts: {}",
                            MAX_CONSECUTIVE_ERRORS, e
                        )));
                    }

                    continue;
                }
                Err(e) => {
                    error!("Fatal format reader error: {}", e);
                    return Err(MediaError::DecodingError(format!(
                        "Failed to read packet: {}",
                        e
                    )));
                }
            };

            // Consume any new metadata that was read with this packet
            while !self.format_reader.metadata().is_latest() {
                self.format_reader.metadata().pop();
            }

            // Skip packets not belonging to our selected track
            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    // Correct the channel count if it was unknown at probe time
                    let decoded_channels = decoded.spec().channels.count() as u16;
                    if self.channels != decoded_channels {
                        debug!(
                            "Updating channel count from {} to {}",
                            self.channels, decoded_channels
                        );
                        self.channels = decoded_channels;
                        self.format.channels = decoded_channels;
                    }

                    let samples = SampleConverter::to_interleaved_f32(&decoded);
                    return Ok(Some(samples));
                }
                Err(SymphoniaError::IoError(err)) => {
                    consecutive_errors += 1;
                    warn!(
                        "Skipping corrupted packet (I/O error, attempt {}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, err
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("Too many consecutive decode errors in {}", self.source_info);
                        return Err(MediaError::CorruptedStream(format!(
                            "Stream corruption after {} failed packets",
                            MAX_CONSECUTIVE_ERRORS
                        )));
                    }

                    continue;
                }
                Err(SymphoniaError::DecodeError(err)) => {
                    consecutive_errors += 1;
                    warn!(
                        "Skipping packet with decode error (attempt {}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, err
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("Decoder kept failing in {}", self.source_info);
                        return Err(MediaError::DecoderError(format!(
                            "Decoder failure after {} failed packets: {}",
                            MAX_CONSECUTIVE_ERRORS, err
                        )));
                    }

                    continue;
                }
                Err(e) => {
                    error!("Fatal decode error: {}", e);
                    return Err(MediaError::DecoderError(format!(
                        "Failed to decode packet: {}",
                        e
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl AudioDecoder for SymphoniaDecoder {
    async fn probe(&mut self) -> Result<ProbeResult> {
        debug!("Probing audio format");

        Ok(ProbeResult::new(self.format.clone())
            .with_duration(self.duration)
            .with_tags(self.tags.clone()))
    }

    async fn decode_frames(&mut self, max_frames: usize) -> Result<Option<AudioFrameChunk>> {
        if max_frames == 0 {
            return Ok(Some(AudioFrameChunk::new(
                Vec::new(),
                0,
                Duration::from_secs_f64(self.next_frame as f64 / self.sample_rate as f64),
            )));
        }

        if self.pending.is_empty() {
            match self.decode_next_packet()? {
                Some(samples) => self.pending = samples,
                None => return Ok(None),
            }
        }

        let channels = self.channels.max(1) as usize;
        let pending_frames = self.pending.len() / channels;
        let frames = pending_frames.min(max_frames);
        let sample_count = frames * channels;

        let chunk_samples: Vec<f32> = self.pending.drain(..sample_count).collect();
        let timestamp =
            Duration::from_secs_f64(self.next_frame as f64 / self.sample_rate as f64);
        self.next_frame += frames as u64;

        Ok(Some(AudioFrameChunk::new(chunk_samples, frames, timestamp)))
    }

    async fn seek(&mut self, position: Duration) -> Result<()> {
        if let Some(duration) = self.duration {
            if position > duration {
                return Err(MediaError::SeekOutOfBounds(position));
            }
        }

        debug!("Seeking to {:?}", position);

        let time = Time::from(position.as_secs_f64());

        self.format_reader
            .seek(
                SeekMode::Accurate,
                SeekTo::Time {
                    time,
                    track_id: None,
                },
            )
            .map_err(|e| {
                error!("Seek failed: {}", e);
                MediaError::SeekNotSupported
            })?;

        // Reset decoder state and drop stale samples
        self.decoder.reset();
        self.pending.clear();

        self.next_frame = (position.as_secs_f64() * self.sample_rate as f64) as u64;
        self.eof = false;

        debug!("Seek completed to {:?}", position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn decoder_rejects_garbage_buffer() {
        let source = ClipSource::MemoryBuffer {
            data: Bytes::from_static(&[0xFF, 0xFB, 0x90, 0x00]),
            codec_hint: None,
        };

        // Incomplete data cannot be probed
        let result = SymphoniaDecoder::new(source);
        assert!(result.is_err());
    }

    #[test]
    fn decoder_rejects_remote_source() {
        let source = ClipSource::remote("https://example.com/a.mp3");

        let result = SymphoniaDecoder::new(source);
        assert!(matches!(result, Err(MediaError::SourceError(_))));
    }
}
