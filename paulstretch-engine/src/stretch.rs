//! Single-threaded reference stretch engine (spec.md §4.3).
//!
//! Used directly as the fallback path, and reused as the per-chunk unit of
//! work inside the parallel dispatcher.

use crate::overlap::overlap_add_and_normalize;
use crate::types::DerivedWindowParams;
use paulstretch_dsp::{rephase, FftPlan};
use rand::Rng;

/// Process one channel end-to-end: windowed analysis, rephasing, and
/// overlap-add resynthesis, then peak-normalization.
///
/// If `input` is shorter than `fft_size`, the analysis loop never runs and a
/// zero-filled channel of `output_length` is returned (spec.md edge case).
pub fn stretch_channel(
    input: &[f32],
    window: &[f32],
    plan: &FftPlan,
    params: &DerivedWindowParams,
    rng: &mut impl Rng,
) -> Vec<f32> {
    let fft_size = params.fft_size;
    let half_size = params.half_size;

    let mut blocks = Vec::new();
    let mut input_pos = 0.0f64;

    while (input_pos.floor() as usize) + fft_size <= input.len() {
        let start = input_pos.floor() as usize;

        let mut block: Vec<f32> = input[start..start + fft_size].to_vec();
        for (sample, w) in block.iter_mut().zip(window) {
            *sample *= w;
        }

        rephase(plan, window, &mut block, rng).expect("block length matches plan size");
        blocks.push(block);

        input_pos += params.displace_pos;
    }

    overlap_add_and_normalize(&blocks, fft_size, half_size, params.output_length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StretchConfig;
    use paulstretch_dsp::{generate_window, WindowShape};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build(config: &StretchConfig, sample_rate: u32, frames: usize) -> (DerivedWindowParams, Vec<f32>, FftPlan) {
        let params = DerivedWindowParams::derive(config, sample_rate, frames);
        let window = generate_window(params.fft_size, WindowShape::Hann);
        let plan = FftPlan::new(params.fft_size).unwrap();
        (params, window, plan)
    }

    #[test]
    fn silence_in_silence_out() {
        let config = StretchConfig {
            stretch_factor: 4.0,
            window_size_seconds: 0.1,
            worker_count: None,
        };
        let input = vec![0.0f32; 44100];
        let (params, window, plan) = build(&config, 44100, input.len());
        let mut rng = StdRng::seed_from_u64(1);

        let output = stretch_channel(&input, &window, &plan, &params, &mut rng);

        assert_eq!(output.len(), params.output_length);
        assert!(output.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn short_input_yields_zero_output() {
        let config = StretchConfig {
            stretch_factor: 50.0,
            window_size_seconds: 0.25,
            worker_count: None,
        };
        let input = vec![0.1f32; 500];
        let (params, window, plan) = build(&config, 44100, input.len());
        let mut rng = StdRng::seed_from_u64(2);

        let output = stretch_channel(&input, &window, &plan, &params, &mut rng);

        assert_eq!(output.len(), (500.0f64 * 50.0).floor() as usize);
        assert!(output.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn output_peak_never_exceeds_unity() {
        let config = StretchConfig {
            stretch_factor: 8.0,
            window_size_seconds: 0.1,
            worker_count: None,
        };
        let input: Vec<f32> = (0..44100)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let (params, window, plan) = build(&config, 44100, input.len());
        let mut rng = StdRng::seed_from_u64(3);

        let output = stretch_channel(&input, &window, &plan, &params, &mut rng);

        let peak = output.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        assert!(peak <= 1.0);
    }

    #[test]
    fn stretch_factor_one_changes_waveform_but_keeps_length() {
        let config = StretchConfig {
            stretch_factor: 1.0,
            window_size_seconds: 0.1,
            worker_count: None,
        };
        let input: Vec<f32> = (0..8820)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let (params, window, plan) = build(&config, 44100, input.len());
        let mut rng = StdRng::seed_from_u64(4);

        let output = stretch_channel(&input, &window, &plan, &params, &mut rng);

        assert_eq!(output.len(), input.len());
        // Phase randomization guarantees the waveform itself changes.
        let differs = output
            .iter()
            .zip(&input)
            .any(|(o, i)| (o - i).abs() > 1e-3);
        assert!(differs);
    }
}
