//! Pattern renderer — turns a step pattern into a PCM buffer.
//!
//! Rendering is a pure function of `(pattern, config)`: no shared state,
//! no randomness, so identical input always gives bit-identical output
//! and separate renders can run on separate threads without coordination.

use tracing::debug;

use crate::config::RenderConfig;
use crate::error::Result;
use crate::pattern::Pattern;
use crate::pcm::PcmBuffer;

use super::envelope::Envelope;
use super::mixer::Mixer;
use super::voice::Voice;

/// Render `pattern` to a PCM buffer of `config.audio_channels` channels.
///
/// Every sounding cell becomes one sawtooth voice at the cell's pitch,
/// starting at `step * row_duration` and ringing for `tail_seconds`. Voices
/// are summed into every output channel, scaled by `master_gain`, then
/// clamped to [-1, 1]. Audio past `seconds_limit` is dropped without error.
pub fn render(pattern: &Pattern, config: &RenderConfig) -> Result<PcmBuffer> {
    config.validate()?;

    let sample_rate = config.sample_rate as f64;
    let row_duration = config.row_duration();
    let frames = config.frame_count(pattern.steps());

    debug!(
        channels = pattern.channels(),
        steps = pattern.steps(),
        bpm = config.bpm,
        sample_rate = config.sample_rate,
        frames,
        "rendering pattern"
    );

    let mut mixer = Mixer::new(config.audio_channels as usize, frames);
    mixer.master_gain = config.master_gain;

    let mut voices = 0usize;
    let mut truncated = 0usize;
    if config.tail_seconds > 0.0 {
        for (_, step, event) in pattern.notes() {
            let Some(pitch) = event.pitch else { continue };
            let onset = (step as f64 * row_duration * sample_rate) as usize;
            if onset >= frames {
                truncated += 1;
                continue;
            }
            let envelope = Envelope::note(event.velocity as f64, config.tail_seconds)?;
            let mut voice = Voice::new(pitch.frequency(), envelope, onset, sample_rate);
            if voice.mix_into(&mut mixer) < voice.length() {
                truncated += 1;
            }
            voices += 1;
        }
    }

    debug!(voices, truncated, "pattern rendered");
    PcmBuffer::new(config.sample_rate, mixer.into_channels())
}
