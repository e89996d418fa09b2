//! Window-function generation.

/// Which raised-cosine window shape to generate.
///
/// Both are observed in PaulStretch implementations in the wild; this crate
/// defaults to `Hann` and documents the choice (see the workspace's
/// DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowShape {
    /// `0.5 * (1 - cos(2*pi*i / (N-1)))`
    #[default]
    Hann,
    /// `(1 - ((2i/(N-1)) - 1)^2)^1.25`, the legacy PaulStretch window.
    Legacy,
}

/// Generate a window of `size` samples in the given shape.
///
/// `size` must be at least 2; a size of 1 would make `N - 1` zero and divide
/// by zero below, which cannot occur in practice since `fft_size` is always
/// a power of two >= 2.
pub fn generate(size: usize, shape: WindowShape) -> Vec<f32> {
    debug_assert!(size >= 2);
    let n_minus_1 = (size - 1) as f32;

    match shape {
        WindowShape::Hann => (0..size)
            .map(|i| {
                let x = 2.0 * std::f32::consts::PI * i as f32 / n_minus_1;
                0.5 * (1.0 - x.cos())
            })
            .collect(),
        WindowShape::Legacy => (0..size)
            .map(|i| {
                let t = (2.0 * i as f32 / n_minus_1) - 1.0;
                (1.0 - t * t).max(0.0).powf(1.25)
            })
            .collect(),
    }
}
