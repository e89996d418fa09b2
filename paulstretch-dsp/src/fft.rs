//! Radix-2 Cooley-Tukey FFT over parallel real/imaginary buffers.
//!
//! Zero-allocation, zero-global-state: all mutable state lives in the
//! caller's buffers, all read-only state (twiddles, bit-reversal table)
//! lives in an [`FftPlan`] built once per size and shared behind an `Arc`.

use thiserror::Error;

/// Errors that can occur while building or using an FFT plan.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FftError {
    #[error("fft size {0} is not a power of two")]
    NotPowerOfTwo(usize),
    #[error("fft size {0} must be at least 2")]
    TooSmall(usize),
    #[error("buffer length {actual} does not match fft size {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Precomputed twiddle table and bit-reversal permutation for one FFT size.
///
/// Built once per size and cached by the engine (see `paulstretch-engine`'s
/// plan cache); cheap to share across threads since every field is read-only
/// after construction.
#[derive(Debug, Clone)]
pub struct FftPlan {
    size: usize,
    log2_size: u32,
    /// cos(-2*pi*k/size) for k in 0..size/2
    twiddle_cos: Vec<f32>,
    /// sin(-2*pi*k/size) for k in 0..size/2
    twiddle_sin: Vec<f32>,
    bit_rev: Vec<usize>,
}

impl FftPlan {
    /// Build a new plan for `size`, which must be a power of two >= 2.
    pub fn new(size: usize) -> Result<Self, FftError> {
        if size < 2 {
            return Err(FftError::TooSmall(size));
        }
        if !size.is_power_of_two() {
            return Err(FftError::NotPowerOfTwo(size));
        }

        let log2_size = size.trailing_zeros();
        let half = size / 2;

        let mut twiddle_cos = Vec::with_capacity(half);
        let mut twiddle_sin = Vec::with_capacity(half);
        for k in 0..half {
            let angle = -2.0 * std::f32::consts::PI * k as f32 / size as f32;
            twiddle_cos.push(angle.cos());
            twiddle_sin.push(angle.sin());
        }

        let bit_rev = (0..size)
            .map(|i| {
                let mut rev = 0usize;
                let mut n = i;
                for _ in 0..log2_size {
                    rev = (rev << 1) | (n & 1);
                    n >>= 1;
                }
                rev
            })
            .collect();

        Ok(Self {
            size,
            log2_size,
            twiddle_cos,
            twiddle_sin,
            bit_rev,
        })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    fn check_len(&self, real: &[f32], imag: &[f32]) -> Result<(), FftError> {
        if real.len() != self.size {
            return Err(FftError::LengthMismatch {
                expected: self.size,
                actual: real.len(),
            });
        }
        if imag.len() != self.size {
            return Err(FftError::LengthMismatch {
                expected: self.size,
                actual: imag.len(),
            });
        }
        Ok(())
    }

    /// In-place forward DFT: `X[k] = sum_n x[n] * e^(-2*pi*i*k*n/N)`.
    pub fn forward(&self, real: &mut [f32], imag: &mut [f32]) -> Result<(), FftError> {
        self.check_len(real, imag)?;
        self.butterfly(real, imag);
        Ok(())
    }

    /// In-place inverse DFT with 1/N scaling, via conjugate -> forward -> conjugate.
    pub fn inverse(&self, real: &mut [f32], imag: &mut [f32]) -> Result<(), FftError> {
        self.check_len(real, imag)?;
        for v in imag.iter_mut() {
            *v = -*v;
        }
        self.butterfly(real, imag);
        let norm = 1.0 / self.size as f32;
        for i in 0..self.size {
            real[i] *= norm;
            imag[i] = -imag[i] * norm;
        }
        Ok(())
    }

    /// Bit-reversal permutation followed by log2(N) butterfly passes.
    fn butterfly(&self, real: &mut [f32], imag: &mut [f32]) {
        let n = self.size;

        for i in 0..n {
            let j = self.bit_rev[i];
            if i < j {
                real.swap(i, j);
                imag.swap(i, j);
            }
        }

        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let step = n / len;

            for start in (0..n).step_by(len) {
                let mut k = 0;
                for j in 0..half {
                    let i = start + j;
                    let (tc, ts) = (self.twiddle_cos[k], self.twiddle_sin[k]);

                    let re = real[i + half] * tc - imag[i + half] * ts;
                    let im = real[i + half] * ts + imag[i + half] * tc;

                    real[i + half] = real[i] - re;
                    imag[i + half] = imag[i] - im;
                    real[i] += re;
                    imag[i] += im;

                    k += step;
                }
            }
            len *= 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms_error(a: &[f32], b: &[f32]) -> f32 {
        let sum: f32 = a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum();
        (sum / a.len() as f32).sqrt()
    }

    #[test]
    fn round_trip_recovers_input() {
        for &n in &[64usize, 256, 1024, 4096] {
            let plan = FftPlan::new(n).unwrap();
            let original: Vec<f32> = (0..n)
                .map(|i| (i as f32 * 0.37).sin() + 0.25 * (i as f32 * 1.9).cos())
                .collect();

            let mut real = original.clone();
            let mut imag = vec![0.0; n];

            plan.forward(&mut real, &mut imag).unwrap();
            plan.inverse(&mut real, &mut imag).unwrap();

            assert!(
                rms_error(&real, &original) < 1e-4,
                "n={n} rms error too high"
            );
        }
    }

    #[test]
    fn rejects_non_power_of_two() {
        assert_eq!(FftPlan::new(100), Err(FftError::NotPowerOfTwo(100)));
    }

    #[test]
    fn rejects_too_small() {
        assert_eq!(FftPlan::new(1), Err(FftError::TooSmall(1)));
    }

    #[test]
    fn dc_bin_captures_mean() {
        let n = 256;
        let plan = FftPlan::new(n).unwrap();
        let mut real = vec![1.0f32; n];
        let mut imag = vec![0.0f32; n];
        plan.forward(&mut real, &mut imag).unwrap();
        assert!((real[0] - n as f32).abs() < 1e-2);
        assert!(real[1..].iter().all(|v| v.abs() < 1e-2));
    }
}
