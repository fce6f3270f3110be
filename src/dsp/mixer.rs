//! Mixer — sums voice outputs into every audio channel with master gain.

/// A summing mixer that accumulates mono voice samples into a fixed-length
/// multichannel buffer.
///
/// Mixing is plain addition; the only bound on the result is the hard clamp
/// applied by [`Mixer::into_channels`].
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    channels: Vec<Vec<f64>>,
}

impl Mixer {
    /// Zero-filled mixer with `channels` outputs of `frames` samples each.
    pub fn new(channels: usize, frames: usize) -> Self {
        Mixer {
            master_gain: 1.0,
            channels: vec![vec![0.0; frames]; channels],
        }
    }

    /// Add a sample at the given frame to every channel.
    ///
    /// Frames past the end are dropped.
    pub fn add(&mut self, index: usize, sample: f64) {
        for ch in &mut self.channels {
            if let Some(slot) = ch.get_mut(index) {
                *slot += sample;
            }
        }
    }

    /// Frames per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finish the mix: apply master gain and clamp each sample to [-1, 1].
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        let gain = self.master_gain;
        self.channels
            .into_iter()
            .map(|ch| ch.into_iter().map(|s| hard_clip(s * gain)).collect())
            .collect()
    }
}

/// Clamp to [-1, 1]; NaN and infinities become silence.
fn hard_clip(x: f64) -> f32 {
    if x.is_finite() {
        x.clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}
