//! Decoding of externally supplied audio files into PCM buffers.
//!
//! A file that cannot be decoded is reported as [`Error::Decode`]; the
//! caller decides whether to retry or drop it.

use std::io::Cursor;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::pcm::{PcmBuffer, i16_to_sample};

/// Decode WAV or MP3 bytes, picking the format from the RIFF magic.
pub fn decode_audio(bytes: &[u8]) -> Result<PcmBuffer> {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        decode_wav(bytes)
    } else {
        decode_mp3(bytes)
    }
}

/// Decode an integer or float PCM WAV file.
pub fn decode_wav(bytes: &[u8]) -> Result<PcmBuffer> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, _) => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(i16_to_sample))
            .collect::<std::result::Result<_, _>>()?,
        (hound::SampleFormat::Int, bits) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    debug!(
        channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        samples = interleaved.len(),
        "decoded WAV"
    );
    PcmBuffer::from_interleaved(spec.sample_rate, channels, &interleaved)
        .map_err(|e| Error::Decode(format!("WAV: {e}")))
}

/// Decode an MPEG audio stream frame by frame.
pub fn decode_mp3(bytes: &[u8]) -> Result<PcmBuffer> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut format: Option<(u32, usize)> = None;
    let mut interleaved = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                let this = (frame.sample_rate as u32, frame.channels);
                match format {
                    None => format = Some(this),
                    Some(f) if f != this => {
                        warn!(?f, ?this, "skipping MP3 frame with mismatched format");
                        continue;
                    }
                    Some(_) => {}
                }
                interleaved.extend(frame.data.iter().map(|&s| i16_to_sample(s)));
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::SkippedData) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let Some((sample_rate, channels)) = format else {
        return Err(Error::Decode("MP3: no audio frames found".into()));
    };
    debug!(channels, sample_rate, samples = interleaved.len(), "decoded MP3");
    PcmBuffer::from_interleaved(sample_rate, channels, &interleaved)
        .map_err(|e| Error::Decode(format!("MP3: {e}")))
}
