//! Band-limited sawtooth oscillator using PolyBLEP.

/// A sawtooth oscillator with PolyBLEP anti-aliasing at the wrap point.
///
/// Phase starts at 0 on construction, so two oscillators built with the
/// same frequency and sample rate produce identical sample streams.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub frequency: f64,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(frequency: f64, sample_rate: f64) -> Self {
        Oscillator {
            frequency,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Phase increment per sample.
    fn phase_inc(&self) -> f64 {
        self.frequency / self.sample_rate
    }

    /// Generate the next sample.
    pub fn next_sample(&mut self) -> f64 {
        let inc = self.phase_inc();
        // Naive ramp from -1 to +1; PolyBLEP smooths the drop at the wrap.
        let sample = 2.0 * self.phase - 1.0 - poly_blep(self.phase, inc);

        self.phase += inc;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        sample
    }

    /// Reset oscillator phase.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// PolyBLEP (Polynomial Band-Limited Step) correction.
///
/// `t` is the phase [0, 1), `dt` is the phase increment per sample.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        // Just after the discontinuity
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        // Just before the next discontinuity
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sawtooth_range() {
        let mut osc = Oscillator::new(440.0, 44100.0);
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!((-1.0..=1.0).contains(&s), "Saw out of range: {s}");
        }
    }

    #[test]
    fn ramps_upward_between_wraps() {
        let mut osc = Oscillator::new(100.0, 44100.0);
        // Skip the first samples where the BLEP correction is active.
        for _ in 0..4 {
            osc.next_sample();
        }
        let a = osc.next_sample();
        let b = osc.next_sample();
        assert!(b > a, "sawtooth should rise: {a} then {b}");
    }

    #[test]
    fn period_matches_frequency() {
        let sr = 44100.0;
        let mut osc = Oscillator::new(441.0, sr);
        // 441 Hz at 44.1 kHz has a period of exactly 100 samples.
        let first: Vec<f64> = (0..100).map(|_| osc.next_sample()).collect();
        let second: Vec<f64> = (0..100).map(|_| osc.next_sample()).collect();
        for (a, b) in first.iter().zip(&second) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn reset_restarts_phase() {
        let mut osc = Oscillator::new(330.0, 48000.0);
        let start = osc.next_sample();
        for _ in 0..123 {
            osc.next_sample();
        }
        osc.reset();
        assert_eq!(osc.next_sample(), start);
    }
}
