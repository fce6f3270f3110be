//! Container encoders and decoders.
//!
//! WAV is written directly; MP3 frames are produced by a pluggable
//! [`mp3::FrameCodec`]. Decoders accept externally supplied files.

pub mod decode;
pub mod mp3;
pub mod wav;
