pub mod analysis;
pub mod codec;
pub mod config;
pub mod dsp;
pub mod error;
pub mod fft;
pub mod pattern;
pub mod pcm;
pub mod playback;

pub use crate::analysis::{AnalysisMetrics, AnalyzerConfig, AnalyzerState, SpectralAnalyzer, SpectralFrame};
pub use crate::config::RenderConfig;
pub use crate::dsp::pitch::{NoteName, Pitch, frequency_to_note};
pub use crate::dsp::renderer::render;
pub use crate::error::Error;
pub use crate::pattern::{NoteEvent, Pattern};
pub use crate::pcm::PcmBuffer;

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the stepwave-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn render_from_js(pattern: JsValue, config: JsValue) -> Result<PcmBuffer, JsValue> {
    let pattern: Pattern = serde_wasm_bindgen::from_value(pattern).map_err(js_err)?;
    let config: RenderConfig = if config.is_undefined() || config.is_null() {
        RenderConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config).map_err(js_err)?
    };
    render(&pattern, &config).map_err(js_err)
}

/// WASM-exposed: render a pattern (editor JSON shape) to WAV bytes.
#[wasm_bindgen]
pub fn render_pattern_wav(pattern: JsValue, config: JsValue) -> Result<Vec<u8>, JsValue> {
    let buffer = render_from_js(pattern, config)?;
    Ok(codec::wav::encode_wav(&buffer))
}

/// WASM-exposed: render a pattern to interleaved f32 samples for
/// AudioWorklet preview playback.
#[wasm_bindgen]
pub fn render_pattern_samples(pattern: JsValue, config: JsValue) -> Result<Vec<f32>, JsValue> {
    Ok(render_from_js(pattern, config)?.interleaved())
}

/// WASM-exposed: render a pattern to MP3 bytes at the given bitrate.
#[cfg(feature = "lame")]
#[wasm_bindgen]
pub fn render_pattern_mp3(
    pattern: JsValue,
    config: JsValue,
    bitrate_kbps: Option<u32>,
) -> Result<Vec<u8>, JsValue> {
    let buffer = render_from_js(pattern, config)?;
    codec::mp3::encode_mp3(&buffer, bitrate_kbps.unwrap_or(codec::mp3::DEFAULT_BITRATE_KBPS))
        .map_err(js_err)
}

/// WASM-exposed: nearest note name for a frequency, `"--"` when undefined.
#[wasm_bindgen]
pub fn note_for_frequency(freq_hz: f64) -> String {
    frequency_to_note(freq_hz).to_string()
}
