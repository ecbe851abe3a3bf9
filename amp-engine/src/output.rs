//! # Bundled Audio Outputs
//!
//! Ready-made [`AudioOutput`] implementations shipped with the engine:
//!
//! - [`NullOutput`] discards samples. Useful for headless hosts and tests
//!   where timing and events matter but no device exists.
//! - [`RingOutput`] writes samples into a shared [`RingBuffer`] that the
//!   host's audio callback drains (the usual wiring for cpal-style device
//!   callbacks). Intended for hosts that play one clip at a time; mixing
//!   concurrent clips is the host's concern.
//!
//! Platform device outputs (CoreAudio, WASAPI, ALSA, ...) are host
//! adapters implementing the same trait.

use amp_media::error::Result;
use amp_media::ring_buffer::RingBuffer;
use amp_media::traits::{AudioFormat, AudioOutput, AudioSink};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

// ============================================================================
// Null Output
// ============================================================================

/// Output that accepts and discards all samples.
#[derive(Debug, Default)]
pub struct NullOutput {
    consumed: Arc<AtomicUsize>,
}

impl NullOutput {
    /// Create a new null output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of samples accepted across all sinks.
    pub fn samples_consumed(&self) -> usize {
        self.consumed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AudioOutput for NullOutput {
    async fn open(&self, format: AudioFormat) -> Result<Box<dyn AudioSink>> {
        debug!(
            "Opening null sink: {}Hz, {} channels",
            format.sample_rate, format.channels
        );
        Ok(Box::new(NullSink {
            consumed: Arc::clone(&self.consumed),
        }))
    }
}

struct NullSink {
    consumed: Arc<AtomicUsize>,
}

#[async_trait]
impl AudioSink for NullSink {
    async fn write(&mut self, samples: &[f32]) -> Result<()> {
        self.consumed.fetch_add(samples.len(), Ordering::Relaxed);
        // Cede the runtime so decode loops never monopolize a worker
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    async fn discard(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Ring Buffer Output
// ============================================================================

/// How long a ring sink sleeps while waiting for the consumer to free
/// buffer space.
const BACKPRESSURE_POLL: Duration = Duration::from_millis(5);

/// Output backed by a shared PCM ring buffer.
///
/// The host creates the buffer, hands it to the output, and drains it from
/// its audio callback with [`RingBuffer::read`]. Sink writes apply
/// backpressure: they wait for free space instead of overwriting unplayed
/// samples.
#[derive(Debug, Clone)]
pub struct RingOutput {
    buffer: RingBuffer,
}

impl RingOutput {
    /// Create an output writing into `buffer`.
    pub fn new(buffer: RingBuffer) -> Self {
        Self { buffer }
    }

    /// Handle to the shared buffer, for the host's consumer side.
    pub fn buffer(&self) -> RingBuffer {
        self.buffer.clone()
    }
}

#[async_trait]
impl AudioOutput for RingOutput {
    async fn open(&self, format: AudioFormat) -> Result<Box<dyn AudioSink>> {
        debug!(
            "Opening ring sink: {}Hz, {} channels, capacity {} samples",
            format.sample_rate,
            format.channels,
            self.buffer.capacity()
        );
        Ok(Box::new(RingSink {
            buffer: self.buffer.clone(),
        }))
    }
}

struct RingSink {
    buffer: RingBuffer,
}

#[async_trait]
impl AudioSink for RingSink {
    async fn write(&mut self, samples: &[f32]) -> Result<()> {
        let mut offset = 0;
        while offset < samples.len() {
            let free = self.buffer.free_space();
            if free == 0 {
                sleep(BACKPRESSURE_POLL).await;
                continue;
            }

            let n = free.min(samples.len() - offset);
            self.buffer.write(&samples[offset..offset + n]);
            offset += n;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        // Wait for the consumer to drain what we wrote. The host must keep
        // reading from the buffer while a clip is finishing.
        while !self.buffer.is_empty() {
            sleep(BACKPRESSURE_POLL).await;
        }
        Ok(())
    }

    async fn discard(&mut self) -> Result<()> {
        self.buffer.clear();
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.buffer.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_output_counts_samples() {
        let output = NullOutput::new();
        let mut sink = output.open(AudioFormat::cd_quality()).await.unwrap();

        sink.write(&[0.0; 128]).await.unwrap();
        sink.write(&[0.0; 64]).await.unwrap();
        sink.flush().await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(output.samples_consumed(), 192);
    }

    #[tokio::test]
    async fn ring_output_passes_samples_through() {
        let output = RingOutput::new(RingBuffer::new(1024));
        let mut sink = output.open(AudioFormat::cd_quality()).await.unwrap();

        let samples = vec![0.25f32; 256];
        sink.write(&samples).await.unwrap();

        let buffer = output.buffer();
        let mut drained = vec![0.0f32; 256];
        assert_eq!(buffer.read(&mut drained), 256);
        assert_eq!(drained, samples);
    }

    #[tokio::test]
    async fn ring_output_applies_backpressure() {
        let output = RingOutput::new(RingBuffer::new(64));
        let mut sink = output.open(AudioFormat::cd_quality()).await.unwrap();
        let buffer = output.buffer();

        // Consumer drains in the background so the oversized write can finish
        let reader = tokio::spawn({
            let buffer = buffer.clone();
            async move {
                let mut total = 0;
                let mut scratch = vec![0.0f32; 32];
                while total < 256 {
                    total += buffer.read(&mut scratch);
                    sleep(Duration::from_millis(1)).await;
                }
                total
            }
        });

        sink.write(&vec![0.5f32; 256]).await.unwrap();
        sink.flush().await.unwrap();

        let drained = reader.await.unwrap();
        assert!(drained >= 256);
    }

    #[tokio::test]
    async fn ring_sink_discard_clears_buffer() {
        let output = RingOutput::new(RingBuffer::new(1024));
        let mut sink = output.open(AudioFormat::cd_quality()).await.unwrap();

        sink.write(&[0.5f32; 100]).await.unwrap();
        assert_eq!(output.buffer().available(), 100);

        sink.discard().await.unwrap();
        assert!(output.buffer().is_empty());
    }
}
