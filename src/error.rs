use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Render parameters rejected before any audio is produced.
    #[error("invalid render config: {0}")]
    InvalidConfig(String),

    /// Envelope breakpoints out of order or not starting from silence.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Pattern grid with missing cells or mismatched row lengths.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// PCM buffer whose channels disagree on length, or with no channels.
    #[error("invalid PCM buffer: {0}")]
    InvalidBuffer(String),

    /// An externally supplied audio file could not be decoded.
    #[error("decode failure: {0}")]
    Decode(String),

    /// The perceptual codec failed mid-stream; partial output is discarded.
    #[error("codec failure: {0}")]
    Codec(#[from] CodecError),

    #[error("pattern JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error reported by a [`FrameCodec`](crate::codec::mp3::FrameCodec) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("codec initialisation failed: {0}")]
    Init(String),
    #[error("frame encode failed: {0}")]
    Encode(String),
    #[error("flush failed: {0}")]
    Flush(String),
    #[error("unsupported channel count {0} (MP3 carries 1 or 2)")]
    Channels(usize),
}

impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        Error::Decode(format!("WAV: {e}"))
    }
}

impl From<minimp3::Error> for Error {
    fn from(e: minimp3::Error) -> Self {
        Error::Decode(format!("MP3: {e:?}"))
    }
}
