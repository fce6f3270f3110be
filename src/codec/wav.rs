//! WAV encoder — canonical 16-bit PCM RIFF/WAVE container.

use tracing::{debug, warn};

use crate::pcm::{PcmBuffer, sample_to_i16};

const BITS_PER_SAMPLE: u16 = 16;
/// RIFF header + `fmt ` chunk + `data` chunk header.
pub const HEADER_LEN: usize = 44;

/// Encode a PCM buffer as a 16-bit little-endian WAV byte stream.
///
/// Channel count and sample rate are taken verbatim from the buffer.
/// Samples are interleaved frame by frame and converted with
/// [`sample_to_i16`].
pub fn encode_wav(buffer: &PcmBuffer) -> Vec<u8> {
    let channels = buffer.channel_count() as u16;
    let sample_rate = buffer.sample_rate();
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_len = buffer.frame_count() * block_align as usize;
    let (file_size, data_size) = riff_sizes(data_len);
    if data_size as usize != data_len {
        warn!(data_len, "PCM data exceeds the RIFF size fields; header saturated");
    }

    let mut buf = Vec::with_capacity(HEADER_LEN + data_len);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for i in 0..buffer.frame_count() {
        for ch in buffer.channels() {
            buf.extend_from_slice(&sample_to_i16(ch[i]).to_le_bytes());
        }
    }

    debug!(
        channels,
        sample_rate,
        frames = buffer.frame_count(),
        bytes = buf.len(),
        "encoded WAV"
    );
    buf
}

/// `(riff_size, data_size)` header fields, saturated at the 32-bit limit.
fn riff_sizes(data_len: usize) -> (u32, u32) {
    let data_size = u32::try_from(data_len)
        .unwrap_or(u32::MAX)
        .min(u32::MAX - 36);
    (data_size + 36, data_size)
}
