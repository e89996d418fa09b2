//! Core data model: [`AudioBlock`], [`StretchConfig`], [`DerivedWindowParams`].

use crate::error::EngineError;

/// A multi-channel, finite sample sequence.
///
/// All channels share the same length. Samples are nominally in `[-1, 1]`
/// on input; the engine does not clip internally, only at the WAV-encoding
/// boundary (`paulstretch-io`).
#[derive(Debug, Clone)]
pub struct AudioBlock {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBlock {
    /// Build a new block, validating that every channel has the same length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, EngineError> {
        if sample_rate == 0 {
            return Err(EngineError::InvalidInput(
                "sample_rate must be positive".into(),
            ));
        }
        if channels.is_empty() {
            return Err(EngineError::InvalidInput(
                "audio must have at least one channel".into(),
            ));
        }
        let frame_count = channels[0].len();
        if channels.iter().any(|c| c.len() != frame_count) {
            return Err(EngineError::InvalidInput(
                "all channels must share the same length".into(),
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, |c| c.len())
    }

    #[inline]
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    #[inline]
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }
}

/// User-facing stretch configuration.
#[derive(Debug, Clone, Copy)]
pub struct StretchConfig {
    /// Stretch factor; typically >= 1.0 (values < 1.0 speed up, and are
    /// allowed but uncommon).
    pub stretch_factor: f32,
    /// Analysis window length in seconds. Default 0.25.
    pub window_size_seconds: f32,
    /// Worker thread count. `None` means "pick automatically" (hardware
    /// concurrency).
    pub worker_count: Option<usize>,
}

impl Default for StretchConfig {
    fn default() -> Self {
        Self {
            stretch_factor: 8.0,
            window_size_seconds: 0.25,
            worker_count: None,
        }
    }
}

impl StretchConfig {
    pub(crate) fn validate(&self) -> Result<(), EngineError> {
        if !self.stretch_factor.is_finite() || self.stretch_factor <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "stretch_factor must be finite and positive, got {}",
                self.stretch_factor
            )));
        }
        if !self.window_size_seconds.is_finite()
            || self.window_size_seconds <= 0.0
            || self.window_size_seconds > 0.5
        {
            return Err(EngineError::InvalidInput(format!(
                "window_size_seconds must be in (0, 0.5], got {}",
                self.window_size_seconds
            )));
        }
        if let Some(w) = self.worker_count {
            if w == 0 {
                return Err(EngineError::InvalidInput(
                    "worker_count must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Window/FFT parameters derived from a [`StretchConfig`] plus the input's
/// sample rate and frame count.
#[derive(Debug, Clone, Copy)]
pub struct DerivedWindowParams {
    pub win_samples: usize,
    pub fft_size: usize,
    pub half_size: usize,
    /// Analysis hop in input samples; may be fractional, floor-truncated at
    /// indexing time.
    pub displace_pos: f64,
    /// Output placement hop, fixed at `half_size`.
    pub output_hop: usize,
    pub output_length: usize,
}

impl DerivedWindowParams {
    pub fn derive(config: &StretchConfig, sample_rate: u32, input_frame_count: usize) -> Self {
        let win_samples = (config.window_size_seconds * sample_rate as f32).floor() as usize;
        let win_samples = win_samples.max(2);
        let fft_size = win_samples.next_power_of_two();
        let half_size = fft_size / 2;
        let displace_pos = half_size as f64 / config.stretch_factor as f64;
        let output_length = (input_frame_count as f64 * config.stretch_factor as f64).floor() as usize;

        Self {
            win_samples,
            fft_size,
            half_size,
            displace_pos,
            output_hop: half_size,
            output_length,
        }
    }
}
