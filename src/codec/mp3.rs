//! MP3 encoder — frames PCM into codec-sized chunks and collects the stream.
//!
//! The Layer III bitstream itself comes from a [`FrameCodec`]. This module
//! owns the parts that are easy to get wrong around it: int16 conversion,
//! splitting planar channels into per-call left/right slices, strict chunk
//! ordering, and appending the codec's flush output after the last chunk.

use tracing::{debug, trace};

use crate::error::{CodecError, Result};
use crate::pcm::{PcmBuffer, sample_to_i16};

/// Samples per channel handed to the codec per call (one MPEG-1 Layer III frame).
pub const FRAME_SAMPLES: usize = 1152;
pub const DEFAULT_BITRATE_KBPS: u32 = 128;

/// Perceptual codec capability.
///
/// Implementations keep internal state across calls (bit reservoir,
/// lookahead), so calls must arrive in chunk order and `flush` must follow
/// the last chunk. Each chunk holds at most [`FRAME_SAMPLES`] samples per
/// channel.
pub trait FrameCodec {
    fn encode_mono(&mut self, pcm: &[i16]) -> std::result::Result<Vec<u8>, CodecError>;

    fn encode_stereo(
        &mut self,
        left: &[i16],
        right: &[i16],
    ) -> std::result::Result<Vec<u8>, CodecError>;

    /// Emit whatever the codec still buffers.
    fn flush(&mut self) -> std::result::Result<Vec<u8>, CodecError>;
}

impl<C: FrameCodec + ?Sized> FrameCodec for &mut C {
    fn encode_mono(&mut self, pcm: &[i16]) -> std::result::Result<Vec<u8>, CodecError> {
        (**self).encode_mono(pcm)
    }

    fn encode_stereo(
        &mut self,
        left: &[i16],
        right: &[i16],
    ) -> std::result::Result<Vec<u8>, CodecError> {
        (**self).encode_stereo(left, right)
    }

    fn flush(&mut self) -> std::result::Result<Vec<u8>, CodecError> {
        (**self).flush()
    }
}

/// One encode operation over one codec instance.
///
/// [`Mp3Encoder::encode`] consumes the encoder so a codec is never reused
/// across streams; concurrent encodes each build their own.
pub struct Mp3Encoder<C> {
    codec: C,
}

impl<C: FrameCodec> Mp3Encoder<C> {
    pub fn new(codec: C) -> Self {
        Mp3Encoder { codec }
    }

    /// Encode the whole buffer. On any codec error nothing is returned.
    pub fn encode(mut self, buffer: &PcmBuffer) -> Result<Vec<u8>> {
        let channels = buffer.channel_count();
        if channels > 2 {
            return Err(CodecError::Channels(channels).into());
        }

        let pcm: Vec<Vec<i16>> = buffer
            .channels()
            .iter()
            .map(|ch| ch.iter().map(|&s| sample_to_i16(s)).collect())
            .collect();

        let frames = buffer.frame_count();
        let mut out = Vec::new();
        let mut chunks = 0usize;
        let mut start = 0;
        while start < frames {
            let end = (start + FRAME_SAMPLES).min(frames);
            let bytes = match pcm.as_slice() {
                [mono] => self.codec.encode_mono(&mono[start..end])?,
                [left, right] => self
                    .codec
                    .encode_stereo(&left[start..end], &right[start..end])?,
                _ => unreachable!("channel count checked above"),
            };
            trace!(chunk = chunks, bytes = bytes.len(), "encoded chunk");
            out.extend_from_slice(&bytes);
            chunks += 1;
            start = end;
        }

        let tail = self.codec.flush()?;
        out.extend_from_slice(&tail);

        debug!(
            channels,
            frames,
            chunks,
            flush_bytes = tail.len(),
            bytes = out.len(),
            "encoded MP3"
        );
        Ok(out)
    }
}

#[cfg(feature = "lame")]
pub use lame::{LameCodec, encode_mp3};

#[cfg(feature = "lame")]
mod lame {
    use std::mem::MaybeUninit;

    use mp3lame_encoder::{Bitrate, Builder, DualPcm, Encoder, FlushNoGap, MonoPcm, Quality};

    use super::{FrameCodec, Mp3Encoder};
    use crate::error::{CodecError, Result};
    use crate::pcm::PcmBuffer;

    /// [`FrameCodec`] backed by libmp3lame, constant bitrate.
    pub struct LameCodec {
        encoder: Encoder,
    }

    impl LameCodec {
        pub fn new(
            sample_rate: u32,
            channels: u8,
            bitrate_kbps: u32,
        ) -> std::result::Result<Self, CodecError> {
            if !(1..=2).contains(&channels) {
                return Err(CodecError::Channels(channels as usize));
            }
            let mut builder = Builder::new()
                .ok_or_else(|| CodecError::Init("failed to allocate LAME encoder".into()))?;
            builder
                .set_num_channels(channels)
                .map_err(|e| CodecError::Init(format!("channel count: {e:?}")))?;
            builder
                .set_sample_rate(sample_rate)
                .map_err(|e| CodecError::Init(format!("sample rate: {e:?}")))?;
            builder
                .set_brate(bitrate(bitrate_kbps))
                .map_err(|e| CodecError::Init(format!("bitrate: {e:?}")))?;
            builder
                .set_quality(Quality::Best)
                .map_err(|e| CodecError::Init(format!("quality: {e:?}")))?;
            let encoder = builder
                .build()
                .map_err(|e| CodecError::Init(format!("build: {e:?}")))?;
            Ok(LameCodec { encoder })
        }
    }

    fn bitrate(kbps: u32) -> Bitrate {
        match kbps {
            0..=96 => Bitrate::Kbps96,
            97..=112 => Bitrate::Kbps112,
            113..=128 => Bitrate::Kbps128,
            129..=160 => Bitrate::Kbps160,
            161..=192 => Bitrate::Kbps192,
            193..=224 => Bitrate::Kbps224,
            225..=256 => Bitrate::Kbps256,
            _ => Bitrate::Kbps320,
        }
    }

    /// Worst case LAME output for `samples` input samples per channel.
    fn output_capacity(samples: usize) -> usize {
        (samples as f64 * 1.25) as usize + 7200
    }

    fn collect(buf: &[MaybeUninit<u8>], written: usize) -> Vec<u8> {
        // LAME initialised the first `written` bytes.
        buf[..written]
            .iter()
            .map(|b| unsafe { b.assume_init() })
            .collect()
    }

    impl FrameCodec for LameCodec {
        fn encode_mono(&mut self, pcm: &[i16]) -> std::result::Result<Vec<u8>, CodecError> {
            let mut buf = vec![MaybeUninit::uninit(); output_capacity(pcm.len())];
            let written = self
                .encoder
                .encode(MonoPcm(pcm), &mut buf)
                .map_err(|e| CodecError::Encode(format!("{e:?}")))?;
            Ok(collect(&buf, written))
        }

        fn encode_stereo(
            &mut self,
            left: &[i16],
            right: &[i16],
        ) -> std::result::Result<Vec<u8>, CodecError> {
            let mut buf = vec![MaybeUninit::uninit(); output_capacity(left.len())];
            let written = self
                .encoder
                .encode(DualPcm { left, right }, &mut buf)
                .map_err(|e| CodecError::Encode(format!("{e:?}")))?;
            Ok(collect(&buf, written))
        }

        fn flush(&mut self) -> std::result::Result<Vec<u8>, CodecError> {
            let mut buf = vec![MaybeUninit::uninit(); output_capacity(0)];
            let written = self
                .encoder
                .flush::<FlushNoGap>(&mut buf)
                .map_err(|e| CodecError::Flush(format!("{e:?}")))?;
            Ok(collect(&buf, written))
        }
    }

    /// Encode a buffer to MP3 with a fresh LAME codec.
    pub fn encode_mp3(buffer: &PcmBuffer, bitrate_kbps: u32) -> Result<Vec<u8>> {
        let channels = u8::try_from(buffer.channel_count())
            .map_err(|_| CodecError::Channels(buffer.channel_count()))?;
        let codec = LameCodec::new(buffer.sample_rate(), channels, bitrate_kbps)?;
        Mp3Encoder::new(codec).encode(buffer)
    }
}
