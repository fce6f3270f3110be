//! Spectral analyzer — per-tick metrics for visual feedback.
//!
//! Each tick takes one magnitude spectrum and produces band energies, a
//! smoothed volume level and one note reading per logical channel. The only
//! memory between ticks is [`AnalyzerState`], which the caller owns and
//! passes in; separate sessions keep separate states and never interfere.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::dsp::pitch::{NoteName, frequency_to_note};
use crate::fft::SpectrumSource;

/// Weight kept from the previous volume level each tick.
pub const VOLUME_SMOOTHING: f32 = 0.8;
/// Weight kept from the previous per-channel frequency each tick.
///
/// A channel with no history (frequency 0, after construction or
/// [`AnalyzerState::reset`]) takes its first reading unblended, so a fresh
/// session does not report a note several octaves low.
pub const FREQUENCY_SMOOTHING: f64 = 0.7;
/// Peak magnitude a slice must exceed before a note is reported.
pub const NOISE_FLOOR: f32 = 0.01;

/// One analysis tick's spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFrame {
    magnitudes: Vec<f32>,
    bin_width_hz: f32,
}

impl SpectralFrame {
    /// Magnitudes from an FFT of `fft_size` samples at `sample_rate`.
    pub fn new(magnitudes: Vec<f32>, sample_rate: u32, fft_size: usize) -> Self {
        SpectralFrame {
            magnitudes,
            bin_width_hz: sample_rate as f32 / fft_size.max(1) as f32,
        }
    }

    /// Run `samples` through `source` and wrap the result.
    pub fn from_samples<S: SpectrumSource + ?Sized>(
        source: &mut S,
        samples: &[f32],
        sample_rate: u32,
    ) -> Self {
        let fft_size = source.fft_size();
        SpectralFrame::new(source.magnitudes(samples), sample_rate, fft_size)
    }

    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    pub fn bin_width_hz(&self) -> f32 {
        self.bin_width_hz
    }

    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_width_hz
    }
}

/// Named frequency ranges, as fractions of the bin count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Band {
    Bass,
    Mid,
    High,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Bass, Band::Mid, Band::High];

    pub fn name(self) -> &'static str {
        match self {
            Band::Bass => "BASS",
            Band::Mid => "MID",
            Band::High => "HIGH",
        }
    }

    /// Bin range for a spectrum of `bins` bins. For 1024 bins (FFT size
    /// 2048): BASS 0..64, MID 64..256, HIGH 256..1024.
    pub fn bins(self, bins: usize) -> Range<usize> {
        match self {
            Band::Bass => 0..bins / 16,
            Band::Mid => bins / 16..bins / 4,
            Band::High => bins / 4..bins,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandEnergy {
    pub band: Band,
    /// Mean magnitude across the band's bins.
    pub energy: f32,
}

/// Note reading for one logical channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetection {
    pub channel: usize,
    /// Smoothed peak frequency.
    pub frequency_hz: f32,
    pub note_name: NoteName,
    /// False when the slice's peak stayed under [`NOISE_FLOOR`].
    pub confidence: bool,
}

/// Everything a visual consumer gets per tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetrics {
    pub bands: [BandEnergy; 3],
    /// Smoothed volume level.
    pub volume: f32,
    pub notes: Vec<NoteDetection>,
}

impl AnalysisMetrics {
    pub fn band(&self, band: Band) -> f32 {
        self.bands
            .iter()
            .find(|b| b.band == band)
            .map_or(0.0, |b| b.energy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    pub sample_rate: u32,
    pub fft_size: usize,
    /// Number of equal spectrum slices, one per logical channel.
    pub channels: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            sample_rate: 44100,
            fft_size: 2048,
            channels: 8,
        }
    }
}

/// Smoothed values carried from one tick to the next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzerState {
    volume: f32,
    /// Per-channel smoothed frequency; 0 means no reading yet.
    frequencies: Vec<f64>,
}

impl AnalyzerState {
    pub fn new(channels: usize) -> Self {
        AnalyzerState {
            volume: 0.0,
            frequencies: vec![0.0; channels],
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn frequency(&self, channel: usize) -> f64 {
        self.frequencies.get(channel).copied().unwrap_or(0.0)
    }

    /// Forget all history, e.g. when playback stops.
    pub fn reset(&mut self) {
        self.volume = 0.0;
        self.frequencies.fill(0.0);
    }
}

#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    config: AnalyzerConfig,
}

impl SpectralAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        SpectralAnalyzer { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Fresh state sized for this analyzer's channel count.
    pub fn new_state(&self) -> AnalyzerState {
        AnalyzerState::new(self.config.channels)
    }

    /// Wrap magnitudes from an external FFT using this analyzer's rate and size.
    pub fn frame(&self, magnitudes: Vec<f32>) -> SpectralFrame {
        SpectralFrame::new(magnitudes, self.config.sample_rate, self.config.fft_size)
    }

    /// Transform and analyze one time-domain frame.
    pub fn analyze_samples<S: SpectrumSource + ?Sized>(
        &self,
        source: &mut S,
        samples: &[f32],
        state: &mut AnalyzerState,
    ) -> AnalysisMetrics {
        let frame = SpectralFrame::from_samples(source, samples, self.config.sample_rate);
        self.analyze(&frame, state)
    }

    /// Compute one tick's metrics and advance `state`.
    pub fn analyze(&self, frame: &SpectralFrame, state: &mut AnalyzerState) -> AnalysisMetrics {
        let mags = frame.magnitudes();
        let bins = mags.len();

        let bands = Band::ALL.map(|band| BandEnergy {
            band,
            energy: mean(&mags[band.bins(bins)]),
        });

        state.volume = state.volume * VOLUME_SMOOTHING + mean(mags) * (1.0 - VOLUME_SMOOTHING);

        let channels = self.config.channels;
        state.frequencies.resize(channels, 0.0);
        let notes = (0..channels)
            .map(|channel| {
                let slice = channel * bins / channels..(channel + 1) * bins / channels;
                let peak = peak_bin(&mags[slice.clone()]).map(|(i, m)| (slice.start + i, m));
                let smoothed = &mut state.frequencies[channel];
                match peak {
                    Some((bin, magnitude)) if magnitude > NOISE_FLOOR => {
                        let hz = frame.bin_frequency(bin) as f64;
                        *smoothed = if *smoothed > 0.0 {
                            *smoothed * FREQUENCY_SMOOTHING + hz * (1.0 - FREQUENCY_SMOOTHING)
                        } else {
                            hz
                        };
                        let note_name = frequency_to_note(*smoothed);
                        NoteDetection {
                            channel,
                            frequency_hz: *smoothed as f32,
                            note_name,
                            confidence: note_name.is_note(),
                        }
                    }
                    _ => NoteDetection {
                        channel,
                        frequency_hz: *smoothed as f32,
                        note_name: NoteName::NoNote,
                        confidence: false,
                    },
                }
            })
            .collect();

        AnalysisMetrics {
            bands,
            volume: state.volume,
            notes,
        }
    }
}

/// Mean of the finite values; NaN and infinite bins are skipped.
fn mean(values: &[f32]) -> f32 {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0f32, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0.0;
    }
    sum / count as f32
}

/// Index and value of the largest finite magnitude; the lowest bin wins ties.
fn peak_bin(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, m)| m.is_finite())
        .fold(None, |best, (i, m)| match best {
            Some((_, bm)) if bm >= m => best,
            _ => Some((i, m)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::RealFftSpectrum;

    fn analyzer(fft_size: usize, channels: usize) -> SpectralAnalyzer {
        SpectralAnalyzer::new(AnalyzerConfig {
            sample_rate: 44100,
            fft_size,
            channels,
        })
    }

    #[test]
    fn band_ranges_for_2048() {
        assert_eq!(Band::Bass.bins(1024), 0..64);
        assert_eq!(Band::Mid.bins(1024), 64..256);
        assert_eq!(Band::High.bins(1024), 256..1024);
    }

    #[test]
    fn energy_concentrated_in_bass() {
        // 176 bins: BASS covers exactly bins 0..=10.
        let a = analyzer(352, 1);
        let mut mags = vec![0.0; 176];
        mags[..11].fill(0.9);
        let mut state = a.new_state();
        let m = a.analyze(&a.frame(mags), &mut state);
        assert!((m.band(Band::Bass) - 0.9).abs() < 1e-6);
        assert!(m.band(Band::Mid).abs() < 1e-6);
        assert!(m.band(Band::High).abs() < 1e-6);
    }

    #[test]
    fn bass_energy_is_band_average() {
        let a = analyzer(2048, 8);
        let mut mags = vec![0.0; 1024];
        mags[..11].fill(1.0);
        let m = a.analyze(&a.frame(mags), &mut a.new_state());
        assert!((m.band(Band::Bass) - 11.0 / 64.0).abs() < 1e-6);
        assert_eq!(m.band(Band::Mid), 0.0);
        assert_eq!(m.band(Band::High), 0.0);
    }

    #[test]
    fn volume_uses_exponential_smoothing() {
        let a = analyzer(64, 1);
        let mut state = a.new_state();
        let loud = vec![1.0; 32];
        let v1 = a.analyze(&a.frame(loud.clone()), &mut state).volume;
        let v2 = a.analyze(&a.frame(loud), &mut state).volume;
        assert!((v1 - 0.2).abs() < 1e-6);
        assert!((v2 - 0.36).abs() < 1e-6);
        let v3 = a.analyze(&a.frame(vec![0.0; 32]), &mut state).volume;
        assert!((v3 - 0.288).abs() < 1e-6);
    }

    #[test]
    fn per_channel_peak_to_note() {
        let a = analyzer(2048, 8);
        let mut mags = vec![0.0; 1024];
        // Channel 0: bin 20 ≈ 430.7 Hz, nearest note A4.
        mags[20] = 0.5;
        // Channel 3 (bins 384..512): bin 394.
        mags[394] = 0.2;
        // Channel 5: present but under the noise floor.
        mags[5 * 128 + 3] = NOISE_FLOOR / 2.0;
        let m = a.analyze(&a.frame(mags), &mut a.new_state());

        assert_eq!(m.notes.len(), 8);
        assert_eq!(m.notes[0].note_name.to_string(), "A4");
        assert!(m.notes[0].confidence);
        assert!((m.notes[0].frequency_hz - 20.0 * 44100.0 / 2048.0).abs() < 1e-3);

        let hz3 = 394.0 * 44100.0 / 2048.0;
        assert_eq!(m.notes[3].note_name, frequency_to_note(hz3));
        assert!(m.notes[3].confidence);

        for ch in [1, 2, 4, 5, 6, 7] {
            assert_eq!(m.notes[ch].note_name, NoteName::NoNote, "channel {ch}");
            assert!(!m.notes[ch].confidence);
        }
    }

    #[test]
    fn frequency_smoothing_blends_ticks() {
        let a = analyzer(2048, 1);
        let mut state = a.new_state();
        let bin_hz = 44100.0 / 2048.0;

        let mut first = vec![0.0; 1024];
        first[100] = 1.0;
        a.analyze(&a.frame(first), &mut state);
        assert!((state.frequency(0) - 100.0 * bin_hz).abs() < 1e-3);

        let mut second = vec![0.0; 1024];
        second[200] = 1.0;
        let m = a.analyze(&a.frame(second), &mut state);
        let expected = 100.0 * bin_hz * 0.7 + 200.0 * bin_hz * 0.3;
        assert!((state.frequency(0) - expected).abs() < 1e-3);
        assert_eq!(m.notes[0].note_name, frequency_to_note(expected));
    }

    #[test]
    fn quiet_tick_keeps_previous_frequency() {
        let a = analyzer(2048, 1);
        let mut state = a.new_state();
        let mut loud = vec![0.0; 1024];
        loud[50] = 1.0;
        a.analyze(&a.frame(loud), &mut state);
        let before = state.frequency(0);
        let m = a.analyze(&a.frame(vec![0.0; 1024]), &mut state);
        assert_eq!(state.frequency(0), before);
        assert_eq!(m.notes[0].note_name, NoteName::NoNote);
    }

    #[test]
    fn reset_clears_history() {
        let a = analyzer(2048, 2);
        let mut state = a.new_state();
        let mut mags = vec![0.0; 1024];
        mags[30] = 1.0;
        a.analyze(&a.frame(mags.clone()), &mut state);
        state.reset();
        assert_eq!(state, a.new_state());

        // After reset the first tick matches a fresh session exactly.
        let after_reset = a.analyze(&a.frame(mags.clone()), &mut state);
        let fresh = a.analyze(&a.frame(mags), &mut a.new_state());
        assert_eq!(after_reset, fresh);
    }

    #[test]
    fn sessions_are_independent() {
        let a = analyzer(2048, 1);
        let mut s1 = a.new_state();
        let mut s2 = a.new_state();
        a.analyze(&a.frame(vec![1.0; 1024]), &mut s1);
        assert_eq!(s2, a.new_state());
        a.analyze(&a.frame(vec![0.5; 1024]), &mut s2);
        assert!((s1.volume() - 0.2).abs() < 1e-6);
        assert!((s2.volume() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn non_finite_bins_do_not_poison_state() {
        let a = analyzer(2048, 1);
        let mut state = a.new_state();
        let mut mags = vec![0.0f32; 1024];
        mags[0] = f32::NAN;
        mags[1] = f32::INFINITY;
        mags[20] = 0.5;
        let m = a.analyze(&a.frame(mags), &mut state);
        assert!(m.volume.is_finite());
        assert!(m.bands.iter().all(|b| b.energy.is_finite()));
        assert!((m.notes[0].frequency_hz - 20.0 * 44100.0 / 2048.0).abs() < 1e-3);

        let m = a.analyze(&a.frame(vec![0.1; 1024]), &mut state);
        assert!(m.volume.is_finite() && m.volume > 0.0);
    }

    #[test]
    fn empty_spectrum_never_fails() {
        let a = analyzer(2048, 4);
        let m = a.analyze(&a.frame(vec![]), &mut a.new_state());
        assert_eq!(m.volume, 0.0);
        assert!(m.notes.iter().all(|n| !n.confidence));
    }

    #[test]
    fn detects_sine_through_fft() {
        let a = analyzer(2048, 8);
        let mut fft = RealFftSpectrum::new(2048).unwrap();
        let samples: Vec<f32> = (0..2048)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let m = a.analyze_samples(&mut fft, &samples, &mut a.new_state());
        assert_eq!(m.notes[0].note_name.to_string(), "A4");
        assert!(m.band(Band::Bass) > m.band(Band::High));
    }

    #[test]
    fn metrics_serialize_for_consumers() {
        let a = analyzer(64, 1);
        let mut mags = vec![0.0; 32];
        mags[2] = 1.0;
        let m = a.analyze(&a.frame(mags), &mut a.new_state());
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["bands"][0]["band"], "BASS");
        assert!(json["notes"][0]["noteName"].is_string());
    }
}
