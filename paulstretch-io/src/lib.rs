//! 16-bit PCM WAV boundary for `paulstretch-engine`.
//!
//! Deliberately narrow: this crate reads and writes exactly the layout it
//! itself produces. Decoding arbitrary WAV variants or compressed containers
//! is out of scope.

mod error;
mod wav;

pub use error::IoError;
pub use wav::{read_wav, write_wav};
