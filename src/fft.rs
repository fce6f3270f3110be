//! FFT capability used by the live analyzer.
//!
//! The analyzer only needs magnitudes; [`SpectrumSource`] is the seam, and
//! [`RealFftSpectrum`] is the default implementation on top of `realfft`.

use std::f32::consts::PI;
use std::sync::Arc;

use realfft::num_complex::Complex32;
use realfft::{RealFftPlanner, RealToComplex};

use crate::error::{Error, Result};

/// Turns a time-domain frame of `fft_size` samples into `fft_size / 2`
/// magnitude bins.
pub trait SpectrumSource {
    fn fft_size(&self) -> usize;

    /// Magnitudes of the most recent `fft_size` samples of `frame`.
    /// Shorter frames are zero-padded at the front.
    fn magnitudes(&mut self, frame: &[f32]) -> Vec<f32>;
}

/// Hann-windowed real FFT, magnitudes scaled by `2 / fft_size` so a
/// full-scale sinusoid centred on a bin reads about 0.5.
pub struct RealFftSpectrum {
    fft_size: usize,
    r2c: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    input: Vec<f32>,
    spectrum: Vec<Complex32>,
}

impl RealFftSpectrum {
    pub fn new(fft_size: usize) -> Result<Self> {
        if fft_size < 2 || fft_size % 2 != 0 {
            return Err(Error::InvalidConfig(format!(
                "FFT size must be even and at least 2, got {fft_size}"
            )));
        }
        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let window = (0..fft_size)
            .map(|i| {
                let phase = 2.0 * PI * i as f32 / fft_size as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();
        let spectrum = r2c.make_output_vec();
        Ok(RealFftSpectrum {
            fft_size,
            input: vec![0.0; fft_size],
            r2c,
            window,
            spectrum,
        })
    }
}

impl SpectrumSource for RealFftSpectrum {
    fn fft_size(&self) -> usize {
        self.fft_size
    }

    fn magnitudes(&mut self, frame: &[f32]) -> Vec<f32> {
        let n = self.fft_size;
        let take = frame.len().min(n);
        let pad = n - take;
        self.input[..pad].fill(0.0);
        for ((dst, &src), &w) in self.input[pad..]
            .iter_mut()
            .zip(&frame[frame.len() - take..])
            .zip(&self.window[pad..])
        {
            *dst = src * w;
        }

        if self.r2c.process(&mut self.input, &mut self.spectrum).is_err() {
            // Buffer lengths come from the planner, so this is unreachable in
            // practice; a silent frame keeps the analyzer infallible.
            return vec![0.0; n / 2];
        }

        let scale = 2.0 / n as f32;
        self.spectrum[..n / 2].iter().map(|c| c.norm() * scale).collect()
    }
}
