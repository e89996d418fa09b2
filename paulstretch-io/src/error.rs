//! Errors surfaced at the WAV read/write boundary.

use thiserror::Error;

/// Failure modes specific to the WAV boundary. Deliberately separate from
/// `paulstretch_engine::EngineError`: a malformed file or truncated header
/// has nothing to do with the core's own state.
#[derive(Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("not a RIFF/WAVE file")]
    NotWav,

    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),

    #[error("unsupported audio format tag: {0}")]
    UnsupportedFormatTag(u16),

    #[error("file has no channels")]
    NoChannels,
}
