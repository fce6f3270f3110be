//! Live monitoring — the active audio source feeding the spectral analyzer.
//!
//! A [`Monitor`] owns at most one [`LiveSource`] together with the analyzer
//! state it feeds. Seeking swaps the source and resets that state inside a
//! single `&mut self` call, so metrics never mix the old source with the new.

use std::sync::Arc;

use tracing::debug;

use crate::analysis::{AnalysisMetrics, AnalyzerState, SpectralAnalyzer};
use crate::error::{Error, Result};
use crate::fft::SpectrumSource;
use crate::pcm::PcmBuffer;

/// Handle to something that is currently producing audio.
pub trait LiveSource {
    /// Playback position in seconds.
    fn offset(&self) -> f64;

    /// Begin a new handle on the same audio at `offset` seconds.
    fn start_at(&self, offset: f64) -> Self
    where
        Self: Sized;

    /// Stop producing audio. Stopping an already stopped source is a no-op.
    fn stop(&mut self);

    /// The latest time-domain frame, if a new one is ready. Never blocks.
    fn next_frame(&mut self) -> Option<Vec<f32>>;
}

/// Plays a rendered buffer from memory, advancing `hop` frames per tick and
/// handing out the `frame_len` frames ending at the playhead (mixed to mono).
#[derive(Debug, Clone)]
pub struct BufferSource {
    buffer: Arc<PcmBuffer>,
    position: usize,
    frame_len: usize,
    hop: usize,
    stopped: bool,
}

impl BufferSource {
    pub fn new(buffer: Arc<PcmBuffer>, frame_len: usize) -> Self {
        let frame_len = frame_len.max(1);
        BufferSource {
            buffer,
            position: 0,
            frame_len,
            hop: frame_len,
            stopped: false,
        }
    }

    pub fn with_hop(mut self, hop: usize) -> Self {
        self.hop = hop.max(1);
        self
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.buffer.frame_count()
    }
}

impl LiveSource for BufferSource {
    fn offset(&self) -> f64 {
        self.position as f64 / self.buffer.sample_rate() as f64
    }

    fn start_at(&self, offset: f64) -> Self {
        let frame = (offset.max(0.0) * self.buffer.sample_rate() as f64) as usize;
        BufferSource {
            buffer: Arc::clone(&self.buffer),
            position: frame.min(self.buffer.frame_count()),
            frame_len: self.frame_len,
            hop: self.hop,
            stopped: false,
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn next_frame(&mut self) -> Option<Vec<f32>> {
        if self.stopped || self.is_finished() {
            return None;
        }
        self.position = (self.position + self.hop).min(self.buffer.frame_count());
        let start = self.position.saturating_sub(self.frame_len);
        Some((start..self.position).map(|i| self.buffer.mono_at(i)).collect())
    }
}

/// Active source + spectrum transform + analyzer state for one session.
pub struct Monitor<S, F> {
    source: Option<S>,
    spectrum: F,
    analyzer: SpectralAnalyzer,
    state: AnalyzerState,
}

impl<S: LiveSource, F: SpectrumSource> Monitor<S, F> {
    pub fn new(analyzer: SpectralAnalyzer, spectrum: F) -> Result<Self> {
        if analyzer.config().fft_size != spectrum.fft_size() {
            return Err(Error::InvalidConfig(format!(
                "analyzer expects FFT size {}, spectrum source uses {}",
                analyzer.config().fft_size,
                spectrum.fft_size()
            )));
        }
        Ok(Monitor {
            source: None,
            state: analyzer.new_state(),
            spectrum,
            analyzer,
        })
    }

    /// Make `source` the active source, stopping any previous one.
    pub fn start(&mut self, source: S) {
        self.stop();
        debug!(offset = source.offset(), "monitor started");
        self.source = Some(source);
    }

    /// Jump to `offset` seconds: stop the current source, start a fresh one
    /// there and rebind the analyzer to it with cleared smoothing.
    ///
    /// Returns false when nothing is playing.
    pub fn seek(&mut self, offset: f64) -> bool {
        let Some(mut old) = self.source.take() else {
            return false;
        };
        let from = old.offset();
        old.stop();
        let next = old.start_at(offset);
        self.state.reset();
        debug!(from, to = next.offset(), "monitor seek");
        self.source = Some(next);
        true
    }

    /// Stop playback and clear smoothing. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.stop();
            debug!(offset = source.offset(), "monitor stopped");
        }
        self.state.reset();
    }

    pub fn is_playing(&self) -> bool {
        self.source.is_some()
    }

    pub fn position(&self) -> Option<f64> {
        self.source.as_ref().map(LiveSource::offset)
    }

    pub fn state(&self) -> &AnalyzerState {
        &self.state
    }

    /// Analyze the newest frame. `None` when stopped or when the source has
    /// nothing new this tick; the tick is skipped, never waited on.
    pub fn tick(&mut self) -> Option<AnalysisMetrics> {
        let frame = self.source.as_mut()?.next_frame()?;
        Some(
            self.analyzer
                .analyze_samples(&mut self.spectrum, &frame, &mut self.state),
        )
    }
}
