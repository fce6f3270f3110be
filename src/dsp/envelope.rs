//! Piecewise-linear envelope generator.

use crate::error::{Error, Result};

/// Time from note onset to peak gain, in seconds.
pub const ATTACK_SECONDS: f64 = 0.005;
/// Fraction of peak reached at the note's half-duration.
pub const DECAY_LEVEL: f64 = 0.25;

/// Gain curve defined by `(time_offset_seconds, gain)` breakpoints.
///
/// Times are strictly increasing and the first breakpoint has gain 0.
/// Gain is 0 before the first breakpoint, interpolated linearly between
/// breakpoints and held at the last breakpoint's value afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    points: Vec<(f64, f64)>,
}

impl Envelope {
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self> {
        let Some(&(_, first_gain)) = points.first() else {
            return Err(Error::InvalidEnvelope("no breakpoints".into()));
        };
        if first_gain != 0.0 {
            return Err(Error::InvalidEnvelope(format!(
                "first breakpoint must have gain 0, got {first_gain}"
            )));
        }
        if let Some((t, _)) = points.iter().find(|(t, g)| !t.is_finite() || !g.is_finite()) {
            return Err(Error::InvalidEnvelope(format!("non-finite breakpoint at {t}")));
        }
        for pair in points.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(Error::InvalidEnvelope(format!(
                    "breakpoint times must strictly increase ({} then {})",
                    pair[0].0, pair[1].0
                )));
            }
        }
        Ok(Envelope { points })
    }

    /// Shape used for every synthesized note: attack to `peak` by 5 ms,
    /// decay to a quarter of `peak` by half the duration, release to 0 at
    /// `duration`.
    ///
    /// Notes shorter than 10 ms compress the attack to a quarter of the
    /// duration so the breakpoints stay ordered.
    pub fn note(peak: f64, duration: f64) -> Result<Self> {
        if !(duration > 0.0) || !duration.is_finite() {
            return Err(Error::InvalidEnvelope(format!(
                "note duration must be positive, got {duration}"
            )));
        }
        let half = duration / 2.0;
        let attack = if ATTACK_SECONDS < half {
            ATTACK_SECONDS
        } else {
            duration / 4.0
        };
        Envelope::new(vec![
            (0.0, 0.0),
            (attack, peak),
            (half, peak * DECAY_LEVEL),
            (duration, 0.0),
        ])
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Time of the final breakpoint.
    pub fn duration(&self) -> f64 {
        self.points.last().map_or(0.0, |&(t, _)| t)
    }

    pub fn gain_at(&self, t: f64) -> f64 {
        let (t0, _) = self.points[0];
        if t < t0 {
            return 0.0;
        }
        // Index of the first breakpoint strictly after `t`.
        let next = self.points.partition_point(|&(pt, _)| pt <= t);
        if next == self.points.len() {
            return self.points[next - 1].1;
        }
        let (ta, ga) = self.points[next - 1];
        let (tb, gb) = self.points[next];
        ga + (gb - ga) * (t - ta) / (tb - ta)
    }
}
