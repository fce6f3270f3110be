//! Render configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest `data` chunk a RIFF/WAVE file can describe.
pub const MAX_WAV_DATA_BYTES: u64 = u32::MAX as u64 - 36;

/// Parameters for turning a pattern into PCM.
///
/// Deserializes from camelCase JSON; missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Tempo in beats per minute; must be positive.
    pub bpm: f64,
    pub sample_rate: u32,
    /// Output channel count, 1 or 2.
    pub audio_channels: u16,
    /// Hard cap on rendered length in seconds.
    pub seconds_limit: f64,
    /// Pattern steps per beat (4 = sixteenth-note rows).
    pub steps_per_beat: u32,
    /// How long each note rings; the render also extends this far past the
    /// final step.
    pub tail_seconds: f64,
    /// Peak gain of a full-velocity note before mixing.
    pub master_gain: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            bpm: 125.0,
            sample_rate: 44100,
            audio_channels: 2,
            seconds_limit: 60.0,
            steps_per_beat: 4,
            tail_seconds: 0.5,
            master_gain: 0.25,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(Error::InvalidConfig(format!("bpm must be positive, got {}", self.bpm)));
        }
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfig("sample rate must be non-zero".into()));
        }
        if self.steps_per_beat == 0 {
            return Err(Error::InvalidConfig("steps per beat must be non-zero".into()));
        }
        if !matches!(self.audio_channels, 1 | 2) {
            return Err(Error::InvalidConfig(format!(
                "audio channels must be 1 or 2, got {}",
                self.audio_channels
            )));
        }
        if self.seconds_limit.is_nan() || self.seconds_limit < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "seconds limit must be non-negative, got {}",
                self.seconds_limit
            )));
        }
        if !self.tail_seconds.is_finite() || self.tail_seconds < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "tail must be non-negative, got {}",
                self.tail_seconds
            )));
        }
        if !self.master_gain.is_finite() {
            return Err(Error::InvalidConfig("master gain must be finite".into()));
        }
        // 16-bit frames at the cap must still fit a single WAV file.
        let max_bytes = (self.sample_rate as f64 * self.seconds_limit).ceil()
            * self.audio_channels as f64
            * 2.0;
        if max_bytes > MAX_WAV_DATA_BYTES as f64 {
            return Err(Error::InvalidConfig(format!(
                "seconds limit {} exceeds the 4 GiB WAV size at {} Hz x {}",
                self.seconds_limit, self.sample_rate, self.audio_channels
            )));
        }
        Ok(())
    }

    /// Seconds per pattern step.
    pub fn row_duration(&self) -> f64 {
        60.0 / self.bpm / self.steps_per_beat as f64
    }

    /// `min(seconds_limit, steps * row_duration + tail_seconds)`.
    pub fn rendered_duration(&self, steps: usize) -> f64 {
        let natural = steps as f64 * self.row_duration() + self.tail_seconds;
        natural.min(self.seconds_limit)
    }

    /// Frames per channel for a pattern of `steps` steps.
    pub fn frame_count(&self, steps: usize) -> usize {
        (self.sample_rate as f64 * self.rendered_duration(steps)).ceil() as usize
    }
}
