//! FFT, window, and spectral-rephasing primitives for PaulStretch.
//!
//! This crate is pure: no I/O, no threads, no global state. Everything in
//! it is a function of its inputs plus a cached [`fft::FftPlan`] or window
//! table, so it is safe to share behind an `Arc` across worker threads.

pub mod fft;
pub mod rephaser;
pub mod window;

pub use fft::{FftError, FftPlan};
pub use rephaser::rephase;
pub use window::{generate as generate_window, WindowShape};
