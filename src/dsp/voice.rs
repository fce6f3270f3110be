//! Voice — one note event rendered as oscillator × envelope.

use super::envelope::Envelope;
use super::mixer::Mixer;
use super::oscillator::Oscillator;

/// A single scheduled note: one sawtooth oscillator shaped by the note
/// envelope, starting at a fixed frame.
#[derive(Debug, Clone)]
pub struct Voice {
    pub oscillator: Oscillator,
    pub envelope: Envelope,
    /// Frame offset of the note onset.
    pub start_frame: usize,
    sample_rate: f64,
}

impl Voice {
    pub fn new(frequency: f64, envelope: Envelope, start_frame: usize, sample_rate: f64) -> Self {
        Voice {
            oscillator: Oscillator::new(frequency, sample_rate),
            envelope,
            start_frame,
            sample_rate,
        }
    }

    /// Frames from onset until the envelope reaches its final breakpoint.
    pub fn length(&self) -> usize {
        (self.envelope.duration() * self.sample_rate).ceil() as usize
    }

    /// Generate sample `i` frames after onset. Must be called with
    /// consecutive `i` starting at 0.
    fn sample(&mut self, i: usize) -> f64 {
        let t = i as f64 / self.sample_rate;
        self.oscillator.next_sample() * self.envelope.gain_at(t)
    }

    /// Add this voice into `mixer`, stopping at the mixer's end.
    ///
    /// Returns the number of frames written.
    pub fn mix_into(&mut self, mixer: &mut Mixer) -> usize {
        let end = (self.start_frame + self.length()).min(mixer.len());
        if self.start_frame >= end {
            return 0;
        }
        for (i, frame) in (self.start_frame..end).enumerate() {
            let s = self.sample(i);
            mixer.add(frame, s);
        }
        end - self.start_frame
    }
}
