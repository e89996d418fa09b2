//! The per-block spectral rephasing pipeline at the heart of PaulStretch.

use crate::fft::{FftError, FftPlan};
use rand::Rng;
use std::f32::consts::PI;

/// Replace the phase of every positive-frequency bin with a uniform random
/// value while preserving magnitude, then mirror into a Hermitian-symmetric
/// spectrum so the inverse FFT comes back real.
///
/// `block` must already be windowed and have length `plan.size()`. On
/// return it holds the rephased, re-windowed (double-windowed) result.
///
/// Calls `rng` exactly `half_size + 1` times, one draw per bin in
/// `0..=half_size`, per the contract in spec.md.
pub fn rephase(
    plan: &FftPlan,
    window: &[f32],
    block: &mut [f32],
    rng: &mut impl Rng,
) -> Result<(), FftError> {
    let size = plan.size();
    debug_assert_eq!(block.len(), size);
    debug_assert_eq!(window.len(), size);

    let half_size = size / 2;

    let mut real: Vec<f32> = block.to_vec();
    let mut imag = vec![0.0f32; size];

    plan.forward(&mut real, &mut imag)?;

    for k in 0..=half_size {
        let magnitude = (real[k] * real[k] + imag[k] * imag[k]).sqrt();
        let phase = rng.gen_range(0.0..(2.0 * PI));
        real[k] = magnitude * phase.cos();
        imag[k] = magnitude * phase.sin();
    }

    for k in 1..half_size {
        real[size - k] = real[k];
        imag[size - k] = -imag[k];
    }

    plan.inverse(&mut real, &mut imag)?;

    for i in 0..size {
        block[i] = real[i] * window[i];
    }

    Ok(())
}
