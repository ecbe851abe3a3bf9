//! # Ring Buffer for PCM Audio Samples
//!
//! Circular buffer for passing PCM samples between the player's decode task
//! (producer) and a host audio callback (consumer).
//!
//! ## Design
//!
//! - **Capacity**: Fixed size determined at creation
//! - **Overwrite Policy**: Old samples are overwritten when buffer is full;
//!   producers that must not overwrite check [`RingBuffer::free_space`]
//!   before writing
//!
//! ## Usage
//!
//! ```rust
//! use amp_media::ring_buffer::RingBuffer;
//!
//! // Create a buffer for 1 second of stereo audio at 44.1kHz
//! let buffer = RingBuffer::new(44100 * 2);
//!
//! // Producer: Write samples
//! let samples = vec![0.1f32, -0.1, 0.2, -0.2];
//! buffer.write(&samples);
//!
//! // Consumer: Read samples
//! let mut output = vec![0.0f32; 1024];
//! let read = buffer.read(&mut output);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct RingBuffer {
    inner: Arc<RingBufferInner>,
}

struct RingBufferInner {
    buffer: parking_lot::Mutex<Vec<f32>>,
    capacity: usize,
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
}

impl RingBuffer {
    /// Create a new ring buffer with the specified capacity in samples.
    ///
    /// For stereo audio at 44.1 kHz with 1 second buffer: `capacity = 44100 * 2`
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RingBufferInner {
                buffer: parking_lot::Mutex::new(vec![0.0; capacity]),
                capacity,
                write_pos: AtomicUsize::new(0),
                read_pos: AtomicUsize::new(0),
            }),
        }
    }

    /// Write samples to the ring buffer.
    ///
    /// Returns the number of samples actually written. If the buffer is
    /// full, old samples will be overwritten.
    pub fn write(&self, samples: &[f32]) -> usize {
        if samples.is_empty() {
            return 0;
        }

        let mut buffer = self.inner.buffer.lock();
        let write_pos = self.inner.write_pos.load(Ordering::Acquire);
        let mut written = 0;

        for &sample in samples {
            let pos = (write_pos + written) % self.inner.capacity;
            buffer[pos] = sample;
            written += 1;
        }

        self.inner
            .write_pos
            .store((write_pos + written) % self.inner.capacity, Ordering::Release);

        written
    }

    /// Read samples from the ring buffer.
    ///
    /// Fills `output` with as many samples as available, up to
    /// `output.len()`. Returns the number of samples actually read.
    pub fn read(&self, output: &mut [f32]) -> usize {
        if output.is_empty() {
            return 0;
        }

        let buffer = self.inner.buffer.lock();
        let read_pos = self.inner.read_pos.load(Ordering::Acquire);
        let write_pos = self.inner.write_pos.load(Ordering::Acquire);

        let available = self.available_samples_internal(read_pos, write_pos);
        let to_read = available.min(output.len());

        for (i, slot) in output.iter_mut().enumerate().take(to_read) {
            let pos = (read_pos + i) % self.inner.capacity;
            *slot = buffer[pos];
        }

        self.inner
            .read_pos
            .store((read_pos + to_read) % self.inner.capacity, Ordering::Release);

        to_read
    }

    /// Returns the number of samples currently available to read.
    pub fn available(&self) -> usize {
        let read_pos = self.inner.read_pos.load(Ordering::Acquire);
        let write_pos = self.inner.write_pos.load(Ordering::Acquire);
        self.available_samples_internal(read_pos, write_pos)
    }

    fn available_samples_internal(&self, read_pos: usize, write_pos: usize) -> usize {
        if write_pos >= read_pos {
            write_pos - read_pos
        } else {
            self.inner.capacity - read_pos + write_pos
        }
    }

    /// Returns the number of samples that can be written before overwriting.
    pub fn free_space(&self) -> usize {
        self.inner.capacity - self.available()
    }

    /// Returns the total capacity of the buffer in samples.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Returns the buffer fill percentage (0.0 to 1.0).
    pub fn fill_level(&self) -> f32 {
        self.available() as f32 / self.inner.capacity as f32
    }

    /// Clear all samples from the buffer.
    pub fn clear(&self) {
        let mut buffer = self.inner.buffer.lock();
        buffer.fill(0.0);
        self.inner.write_pos.store(0, Ordering::Release);
        self.inner.read_pos.store(0, Ordering::Release);
    }

    /// Returns `true` if the buffer has no samples available.
    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    /// Returns `true` if the buffer is full.
    pub fn is_full(&self) -> bool {
        self.available() >= self.inner.capacity - 1
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("available", &self.available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_creation() {
        let buffer = RingBuffer::new(1024);
        assert_eq!(buffer.capacity(), 1024);
        assert_eq!(buffer.available(), 0);
        assert!(buffer.is_empty());
        assert!(!buffer.is_full());
    }

    #[test]
    fn ring_buffer_write_read() {
        let buffer = RingBuffer::new(1024);

        let samples = vec![0.1, 0.2, 0.3, 0.4];
        let written = buffer.write(&samples);
        assert_eq!(written, 4);
        assert_eq!(buffer.available(), 4);

        let mut output = vec![0.0; 4];
        let read = buffer.read(&mut output);
        assert_eq!(read, 4);
        assert_eq!(output, samples);
        assert_eq!(buffer.available(), 0);
    }

    #[test]
    fn ring_buffer_wrap_around() {
        let buffer = RingBuffer::new(8);

        let samples1 = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        buffer.write(&samples1);

        let mut output = vec![0.0; 4];
        buffer.read(&mut output);
        assert_eq!(output, vec![1.0, 2.0, 3.0, 4.0]);

        // Write more (should wrap)
        let samples2 = vec![9.0, 10.0, 11.0, 12.0];
        buffer.write(&samples2);

        let mut output = vec![0.0; 8];
        let read = buffer.read(&mut output);
        assert_eq!(read, 8);
        assert_eq!(&output[..8], &[5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn ring_buffer_partial_read() {
        let buffer = RingBuffer::new(1024);

        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        buffer.write(&samples);

        let mut output = vec![0.0; 5];
        let read = buffer.read(&mut output);
        assert_eq!(read, 5);
        assert_eq!(output, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(buffer.available(), 5);
    }

    #[test]
    fn ring_buffer_fill_level() {
        let buffer = RingBuffer::new(100);

        let samples = vec![1.0; 50];
        buffer.write(&samples);

        let fill = buffer.fill_level();
        assert!((fill - 0.5).abs() < 0.01); // ~50%
    }

    #[test]
    fn ring_buffer_clear() {
        let buffer = RingBuffer::new(1024);

        let samples = vec![1.0, 2.0, 3.0, 4.0];
        buffer.write(&samples);
        assert_eq!(buffer.available(), 4);

        buffer.clear();
        assert_eq!(buffer.available(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn ring_buffer_free_space() {
        let buffer = RingBuffer::new(100);

        let samples = vec![1.0; 30];
        buffer.write(&samples);

        assert_eq!(buffer.free_space(), 70);
    }
}
