//! DSP — pitch mapping and the offline pattern synthesizer.
//!
//! Everything here is deterministic: the same pattern and config render to
//! bit-identical samples on every run.

pub mod envelope;
pub mod mixer;
pub mod oscillator;
pub mod pitch;
pub mod renderer;
pub mod voice;
