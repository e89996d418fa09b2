//! Shared overlap-add resynthesis, used by both the single-threaded engine
//! and the parallel dispatcher's reassembly step.

/// Overlap-add a position-ordered sequence of rephased blocks into an output
/// buffer of `output_length`, then peak-normalize to `0.95 / max`.
///
/// `blocks` must already be sorted by ascending input position; the position
/// values themselves are not used for placement (spec.md: placement is a
/// fixed `half_size` hop per block, not derived from the analysis position).
pub fn overlap_add_and_normalize(
    blocks: &[Vec<f32>],
    fft_size: usize,
    half_size: usize,
    output_length: usize,
) -> Vec<f32> {
    let mut output = vec![0.0f32; output_length];
    let mut rolling_prev = vec![0.0f32; fft_size];
    let mut output_pos = 0usize;

    for block in blocks {
        debug_assert_eq!(block.len(), fft_size);

        for i in 0..half_size {
            let out_idx = output_pos + i;
            if out_idx < output_length {
                output[out_idx] += block[i] + rolling_prev[half_size + i];
            }
        }

        rolling_prev.copy_from_slice(block);
        output_pos += half_size;
    }

    normalize_peak(&mut output);
    output
}

/// Scale `samples` so the maximum absolute value becomes `0.95` (spec.md
/// Open Question 4: prefer the safe-headroom target over strict unit peak).
pub fn normalize_peak(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    if peak > 0.0 {
        let scale = 0.95 / peak;
        for s in samples.iter_mut() {
            *s *= scale;
        }
    }
}
