//! PaulStretch stretch engine.
//!
//! Ties the pure [`paulstretch_dsp`] primitives together with caching, a
//! single-threaded reference path, and a parallel dispatcher, behind the
//! public `construct` / `stretch` / `dispose` contract from spec.md §6.

mod cache;
mod dispatcher;
mod error;
mod overlap;
mod stretch;
mod types;

pub use error::EngineError;
pub use types::{AudioBlock, DerivedWindowParams, StretchConfig};

use cache::{FftPlanCache, WindowCache};
use dispatcher::PlanArtifacts;
use paulstretch_dsp::WindowShape;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// A constructed PaulStretch core instance.
///
/// Holds lazily-populated window/FFT-plan caches for the life of the
/// instance; dropping it clears them (`dispose`).
pub struct PaulStretch {
    config: StretchConfig,
    window_shape: WindowShape,
    seed: Option<u64>,
    window_cache: WindowCache,
    fft_plan_cache: FftPlanCache,
}

impl PaulStretch {
    /// Validate `config` and construct a new core instance. Caches are
    /// empty until the first `stretch()` call populates them.
    pub fn new(config: StretchConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            window_shape: WindowShape::Hann,
            seed: None,
            window_cache: WindowCache::new(),
            fft_plan_cache: FftPlanCache::new(),
        })
    }

    /// Choose the window shape (spec.md Open Question 3). Defaults to Hann.
    pub fn with_window_shape(mut self, shape: WindowShape) -> Self {
        self.window_shape = shape;
        self
    }

    /// Supply a base seed so per-worker RNGs (and hence phase randomization)
    /// are deterministic across runs. Without a seed, each worker draws from
    /// OS entropy and runs are intentionally non-reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Time-stretch `audio` by `config.stretch_factor`, producing a new
    /// `AudioBlock` of `floor(frame_count * stretch_factor)` frames per
    /// channel. `on_progress`, if given, is called at most once per
    /// completed chunk of work with a value in `[0, 1]`.
    pub fn stretch(
        &self,
        audio: &AudioBlock,
        mut on_progress: Option<&mut dyn FnMut(f64)>,
    ) -> Result<AudioBlock, EngineError> {
        if audio.frame_count() == 0 {
            return Err(EngineError::InvalidInput(
                "audio must have at least one frame".into(),
            ));
        }

        let params = DerivedWindowParams::derive(&self.config, audio.sample_rate(), audio.frame_count());
        let window = self.window_cache.get_or_build(params.fft_size, self.window_shape);
        let plan = self.fft_plan_cache.get_or_build(params.fft_size)?;

        let worker_count = self.config.worker_count.unwrap_or_else(dispatcher::default_worker_count);
        let channel_count = audio.channel_count();

        tracing::debug!(
            fft_size = params.fft_size,
            half_size = params.half_size,
            displace_pos = params.displace_pos,
            output_length = params.output_length,
            worker_count,
            channel_count,
            "constructed stretch plan"
        );

        let output_channels = if worker_count <= 1 || channel_count == 1 {
            self.stretch_fallback(audio, &window, &plan, &params, on_progress.as_deref_mut())?
        } else {
            let artifacts = PlanArtifacts {
                plan: Arc::clone(&plan),
                window: Arc::clone(&window),
                params,
            };
            let channels: Vec<Arc<Vec<f32>>> = audio
                .channels()
                .iter()
                .map(|c| Arc::new(c.clone()))
                .collect();

            dispatcher::stretch_parallel(&channels, &artifacts, worker_count, self.seed, on_progress)?
        };

        AudioBlock::new(audio.sample_rate(), output_channels)
    }

    /// Fallback path used when parallelism isn't worth it: single worker
    /// requested, or only one channel to process (spec.md §4.4).
    fn stretch_fallback(
        &self,
        audio: &AudioBlock,
        window: &[f32],
        plan: &paulstretch_dsp::FftPlan,
        params: &DerivedWindowParams,
        mut on_progress: Option<&mut dyn FnMut(f64)>,
    ) -> Result<Vec<Vec<f32>>, EngineError> {
        let channel_count = audio.channel_count();
        let mut rng = match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let mut outputs = Vec::with_capacity(channel_count);
        for (idx, channel) in audio.channels().iter().enumerate() {
            outputs.push(stretch::stretch_channel(channel, window, plan, params, &mut rng));
            if let Some(cb) = on_progress.as_deref_mut() {
                cb((idx + 1) as f64 / channel_count as f64);
            }
        }
        Ok(outputs)
    }

    /// Drop all cached windows and FFT plans. Called automatically on
    /// `Drop`; exposed directly for callers that want to reclaim memory
    /// without giving up the instance (e.g. between very different stretch
    /// configurations).
    pub fn dispose(&self) {
        self.window_cache.clear();
        self.fft_plan_cache.clear();
    }
}

impl Drop for PaulStretch {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frames: usize, sample_rate: u32, freq: f32) -> Vec<f32> {
        (0..frames)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = StretchConfig {
            stretch_factor: -1.0,
            ..Default::default()
        };
        assert!(PaulStretch::new(config).is_err());
    }

    #[test]
    fn silence_in_silence_out_single_threaded() {
        let config = StretchConfig {
            stretch_factor: 4.0,
            window_size_seconds: 0.1,
            worker_count: Some(1),
        };
        let core = PaulStretch::new(config).unwrap();
        let audio = AudioBlock::new(44100, vec![vec![0.0; 44100], vec![0.0; 44100]]).unwrap();

        let output = core.stretch(&audio, None).unwrap();

        assert_eq!(output.channel_count(), 2);
        assert_eq!(output.sample_rate(), 44100);
        assert!(output.channels().iter().all(|c| c.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn parallel_and_serial_output_lengths_agree() {
        let audio = AudioBlock::new(
            44100,
            vec![sine(44100, 44100, 440.0), sine(44100, 44100, 660.0)],
        )
        .unwrap();

        let serial = PaulStretch::new(StretchConfig {
            stretch_factor: 4.0,
            window_size_seconds: 0.1,
            worker_count: Some(1),
        })
        .unwrap()
        .with_seed(7)
        .stretch(&audio, None)
        .unwrap();

        let parallel = PaulStretch::new(StretchConfig {
            stretch_factor: 4.0,
            window_size_seconds: 0.1,
            worker_count: Some(4),
        })
        .unwrap()
        .with_seed(7)
        .stretch(&audio, None)
        .unwrap();

        assert_eq!(serial.frame_count(), parallel.frame_count());
        assert_eq!(serial.channel_count(), parallel.channel_count());
    }

    #[test]
    fn mono_and_stereo_channels_are_independent() {
        let audio = AudioBlock::new(
            44100,
            vec![sine(8820, 44100, 440.0), sine(8820, 44100, 220.0)],
        )
        .unwrap();

        let core = PaulStretch::new(StretchConfig {
            stretch_factor: 2.0,
            window_size_seconds: 0.1,
            worker_count: Some(1),
        })
        .unwrap();

        let output = core.stretch(&audio, None).unwrap();
        let left = &output.channels()[0];
        let right = &output.channels()[1];
        let differs = left.iter().zip(right).any(|(l, r)| (l - r).abs() > 1e-4);
        assert!(differs);
    }

    #[test]
    fn extreme_factor_completes_without_error() {
        let audio = AudioBlock::new(44100, vec![sine(4410, 44100, 220.0)]).unwrap();
        let core = PaulStretch::new(StretchConfig {
            stretch_factor: 50.0,
            window_size_seconds: 0.25,
            worker_count: Some(1),
        })
        .unwrap();

        let output = core.stretch(&audio, None).unwrap();
        assert_eq!(output.frame_count(), (4410.0f64 * 50.0).floor() as usize);
        let peak = output.channels()[0].iter().fold(0.0f32, |m, v| m.max(v.abs()));
        assert!(peak <= 1.0);
    }

    #[test]
    fn progress_callback_reaches_completion() {
        let audio = AudioBlock::new(44100, vec![sine(44100, 44100, 440.0)]).unwrap();
        let core = PaulStretch::new(StretchConfig {
            stretch_factor: 4.0,
            window_size_seconds: 0.1,
            worker_count: Some(1),
        })
        .unwrap();

        let mut last = 0.0f64;
        let mut calls = 0usize;
        {
            let mut cb = |p: f64| {
                assert!(p >= last);
                last = p;
                calls += 1;
            };
            core.stretch(&audio, Some(&mut cb)).unwrap();
        }

        assert!(calls > 0);
        assert!((last - 1.0).abs() < 1e-9);
    }
}
