//! PCM buffer shared between the renderer, encoders and decoders.

use crate::error::{Error, Result};

/// Planar float PCM: one sample array per audio channel, all the same
/// length, samples nominally in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    sample_rate: u32,
    channel_data: Vec<Vec<f32>>,
}

impl PcmBuffer {
    pub fn new(sample_rate: u32, channel_data: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidBuffer("sample rate must be non-zero".into()));
        }
        if channel_data.is_empty() {
            return Err(Error::InvalidBuffer("no channels".into()));
        }
        if channel_data.len() > u16::MAX as usize {
            return Err(Error::InvalidBuffer(format!(
                "{} channels exceeds the container limit",
                channel_data.len()
            )));
        }
        let frames = channel_data[0].len();
        if let Some(i) = channel_data.iter().position(|ch| ch.len() != frames) {
            return Err(Error::InvalidBuffer(format!(
                "channel {i} has {} frames, expected {frames}",
                channel_data[i].len()
            )));
        }
        Ok(PcmBuffer {
            sample_rate,
            channel_data,
        })
    }

    /// Zero-filled buffer.
    pub fn silent(sample_rate: u32, channels: usize, frames: usize) -> Result<Self> {
        PcmBuffer::new(sample_rate, vec![vec![0.0; frames]; channels])
    }

    /// Split interleaved samples into planar channels. A trailing partial
    /// frame is dropped.
    pub fn from_interleaved(sample_rate: u32, channels: usize, samples: &[f32]) -> Result<Self> {
        if channels == 0 {
            return Err(Error::InvalidBuffer("no channels".into()));
        }
        let frames = samples.len() / channels;
        let mut data = vec![Vec::with_capacity(frames); channels];
        for frame in samples.chunks_exact(channels) {
            for (ch, &s) in data.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        PcmBuffer::new(sample_rate, data)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channel_data.len()
    }

    pub fn frame_count(&self) -> usize {
        self.channel_data[0].len()
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channel_data[index]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channel_data
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Frame-interleaved copy (`L R L R ...` for stereo).
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.frame_count() * self.channel_count());
        for i in 0..self.frame_count() {
            out.extend(self.channel_data.iter().map(|ch| ch[i]));
        }
        out
    }

    /// Average of all channels at frame `index`.
    pub fn mono_at(&self, index: usize) -> f32 {
        let sum: f32 = self.channel_data.iter().map(|ch| ch[index]).sum();
        sum / self.channel_count() as f32
    }

    /// Frames `[start, end)` as a new buffer.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        let end = end.min(self.frame_count());
        let start = start.min(end);
        PcmBuffer::new(
            self.sample_rate,
            self.channel_data.iter().map(|ch| ch[start..end].to_vec()).collect(),
        )
    }
}

/// Convert a float sample to int16: clamp to [-1, 1], scale positives by
/// 32767 and negatives by 32768, truncate toward zero.
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Inverse of [`sample_to_i16`], using the same asymmetric scale.
pub fn i16_to_sample(sample: i16) -> f32 {
    if sample < 0 {
        sample as f32 / 32768.0
    } else {
        sample as f32 / 32767.0
    }
}
