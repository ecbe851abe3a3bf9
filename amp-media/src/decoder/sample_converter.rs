//! # Sample Format Converter
//!
//! Converts audio samples between different formats and layouts.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Sample converter that normalizes audio to f32 interleaved format.
///
/// Symphonia outputs audio in various formats (u8 through f64) and in
/// planar layout. This converter normalizes everything to interleaved f32
/// samples in the range [-1.0, 1.0].
pub struct SampleConverter;

impl SampleConverter {
    /// Convert a Symphonia `AudioBufferRef` to interleaved f32 samples.
    ///
    /// The output is always:
    /// - Format: f32
    /// - Range: [-1.0, 1.0]
    /// - Layout: Interleaved (LRLRLR... for stereo)
    pub fn to_interleaved_f32(buffer: &AudioBufferRef<'_>) -> Vec<f32> {
        match buffer {
            AudioBufferRef::F32(buf) => Self::interleave_f32_planes(buf),
            AudioBufferRef::F64(buf) => {
                Self::convert_and_interleave(buf, |sample: f64| sample.into_sample())
            }
            AudioBufferRef::S32(buf) => {
                Self::convert_and_interleave(buf, |sample: i32| sample.into_sample())
            }
            AudioBufferRef::S16(buf) => {
                Self::convert_and_interleave(buf, |sample: i16| sample.into_sample())
            }
            AudioBufferRef::S24(buf) => {
                Self::convert_and_interleave(buf, |sample| IntoSample::into_sample(sample))
            }
            AudioBufferRef::S8(buf) => {
                Self::convert_and_interleave(buf, |sample: i8| sample.into_sample())
            }
            AudioBufferRef::U32(buf) => {
                Self::convert_and_interleave(buf, |sample: u32| sample.into_sample())
            }
            AudioBufferRef::U16(buf) => {
                Self::convert_and_interleave(buf, |sample: u16| sample.into_sample())
            }
            AudioBufferRef::U24(buf) => {
                Self::convert_and_interleave(buf, |sample| IntoSample::into_sample(sample))
            }
            AudioBufferRef::U8(buf) => {
                Self::convert_and_interleave(buf, |sample: u8| sample.into_sample())
            }
        }
    }

    /// Interleave an f32 planar audio buffer.
    ///
    /// Converts from planar format (LLLL...RRRR...) to interleaved
    /// (LRLRLR...).
    fn interleave_f32_planes(buf: &AudioBuffer<f32>) -> Vec<f32> {
        let num_channels = buf.spec().channels.count();
        let num_frames = buf.frames();
        let mut interleaved = Vec::with_capacity(num_frames * num_channels);

        for frame_idx in 0..num_frames {
            for chan_idx in 0..num_channels {
                let plane = buf.chan(chan_idx);
                interleaved.push(plane[frame_idx]);
            }
        }

        interleaved
    }

    /// Convert and interleave samples of any type.
    fn convert_and_interleave<T>(buf: &AudioBuffer<T>, convert: fn(T) -> f32) -> Vec<f32>
    where
        T: Sample + Copy,
    {
        let num_channels = buf.spec().channels.count();
        let num_frames = buf.frames();
        let mut interleaved = Vec::with_capacity(num_frames * num_channels);

        for frame_idx in 0..num_frames {
            for chan_idx in 0..num_channels {
                let plane = buf.chan(chan_idx);
                interleaved.push(convert(plane[frame_idx]));
            }
        }

        interleaved
    }
}
