//! Error types surfaced at the `stretch()` boundary.

use paulstretch_dsp::FftError;
use thiserror::Error;

/// All errors the engine can surface. Every `stretch()` call either succeeds
/// with a complete `AudioBlock` or fails with one of these — no partial
/// output is ever returned.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("worker failure: {0}")]
    WorkerFailure(String),

    /// Parallelism was requested but unavailable. The dispatcher handles
    /// this internally by falling back to the single-threaded engine, so
    /// this variant should never actually reach a caller; it exists to
    /// document the failure mode and to keep tests honest.
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),
}

impl From<FftError> for EngineError {
    fn from(e: FftError) -> Self {
        EngineError::InvalidInput(e.to_string())
    }
}
