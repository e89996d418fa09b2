//! Parallel work-distribution layer (spec.md §4.4).
//!
//! Modeled directly on the teacher's `ole-library::scanner` worker pool
//! (`Arc`-shared queue, `std::thread::spawn` per worker, `crossbeam_channel`
//! for progress/results, `JoinHandle` joins at the end) and on
//! `ole-gui::app`'s `std::thread::available_parallelism()` idiom for sizing
//! the pool.

use crate::error::EngineError;
use crate::overlap::overlap_add_and_normalize;
use crate::types::DerivedWindowParams;
use crossbeam_channel::{unbounded, Sender};
use paulstretch_dsp::{rephase, FftPlan};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread;

/// Shared, read-only artifacts every worker needs: the FFT plan, the
/// window, and the derived hop/size parameters. Passed behind an `Arc` so
/// dispatching a work unit never copies them.
pub struct PlanArtifacts {
    pub plan: Arc<FftPlan>,
    pub window: Arc<Vec<f32>>,
    pub params: DerivedWindowParams,
}

/// One contiguous range of analysis frames for one channel.
#[derive(Debug, Clone, Copy)]
struct WorkUnit {
    channel: usize,
    start_frame: usize,
    frame_count: usize,
}

enum DispatchMessage {
    Completed {
        channel: usize,
        blocks: Vec<(usize, Vec<f32>)>,
    },
    Failed {
        message: String,
    },
}

/// Pick a default worker count from hardware concurrency, as the teacher's
/// GUI does for its own thread-count estimate.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}

/// Total number of analysis frames available for a channel of `input_len`
/// samples, given `fft_size` and `displace_pos`. Zero if the channel is
/// shorter than one window.
fn total_frames(input_len: usize, fft_size: usize, displace_pos: f64) -> usize {
    if input_len < fft_size {
        return 0;
    }
    ((input_len - fft_size) as f64 / displace_pos).floor() as usize + 1
}

/// Build the round-robin work plan: ~3 chunks per worker per channel.
fn build_work_units(channel_count: usize, frames: usize, worker_count: usize) -> Vec<WorkUnit> {
    if frames == 0 {
        return Vec::new();
    }
    let chunk = (frames / (worker_count * 3)).max(1);

    let mut units = Vec::new();
    for channel in 0..channel_count {
        let mut start = 0;
        while start < frames {
            let frame_count = chunk.min(frames - start);
            units.push(WorkUnit {
                channel,
                start_frame: start,
                frame_count,
            });
            start += chunk;
        }
    }
    units
}

/// Run the parallel dispatcher across all channels of `channels`, returning
/// one resynthesized, peak-normalized output channel per input channel.
///
/// `on_progress` is invoked at most once per completed work unit, from this
/// (the main) thread only, with a monotonically non-decreasing fraction in
/// `[0, 1]`.
pub fn stretch_parallel(
    channels: &[Arc<Vec<f32>>],
    artifacts: &PlanArtifacts,
    worker_count: usize,
    seed: Option<u64>,
    mut on_progress: Option<&mut dyn FnMut(f64)>,
) -> Result<Vec<Vec<f32>>, EngineError> {
    let fft_size = artifacts.params.fft_size;
    let half_size = artifacts.params.half_size;
    let displace_pos = artifacts.params.displace_pos;
    let output_length = artifacts.params.output_length;
    let channel_count = channels.len();

    let input_len = channels.first().map_or(0, |c| c.len());
    let frames = total_frames(input_len, fft_size, displace_pos);
    let units = build_work_units(channel_count, frames, worker_count);
    let total_units = units.len();

    if total_units == 0 {
        return Ok(vec![vec![0.0f32; output_length]; channel_count]);
    }

    let (unit_senders, unit_receivers): (Vec<_>, Vec<_>) =
        (0..worker_count).map(|_| unbounded::<WorkUnit>()).unzip();
    let (result_tx, result_rx) = unbounded::<DispatchMessage>();

    let mut handles = Vec::with_capacity(worker_count);
    for (worker_idx, rx) in unit_receivers.into_iter().enumerate() {
        let channels = channels.to_vec();
        let plan = Arc::clone(&artifacts.plan);
        let window = Arc::clone(&artifacts.window);
        let result_tx: Sender<DispatchMessage> = result_tx.clone();
        let worker_seed = seed.map(|s| s.wrapping_add(worker_idx as u64));

        let handle = thread::spawn(move || {
            let mut rng = match worker_seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            };

            while let Ok(unit) = rx.recv() {
                let channel_data = &channels[unit.channel];
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    let mut blocks = Vec::with_capacity(unit.frame_count);
                    for f in 0..unit.frame_count {
                        let frame_idx = unit.start_frame + f;
                        let input_position = (frame_idx as f64 * displace_pos).floor() as usize;
                        if input_position + fft_size > channel_data.len() {
                            break;
                        }

                        let mut block: Vec<f32> =
                            channel_data[input_position..input_position + fft_size].to_vec();
                        for (sample, w) in block.iter_mut().zip(window.iter()) {
                            *sample *= w;
                        }
                        rephase(&plan, &window, &mut block, &mut rng)
                            .expect("block length matches plan size");
                        blocks.push((input_position, block));
                    }
                    blocks
                }));

                let message = match outcome {
                    Ok(blocks) => DispatchMessage::Completed {
                        channel: unit.channel,
                        blocks,
                    },
                    Err(payload) => DispatchMessage::Failed {
                        message: panic_message(&payload),
                    },
                };

                if result_tx.send(message).is_err() {
                    break;
                }
            }
        });
        handles.push(handle);
    }
    drop(result_tx);

    for (i, unit) in units.iter().enumerate() {
        let worker = i % worker_count;
        let _ = unit_senders[worker].send(*unit);
    }
    drop(unit_senders);

    let mut channel_blocks: Vec<Vec<(usize, Vec<f32>)>> = vec![Vec::new(); channel_count];
    let mut failure: Option<String> = None;
    let mut completed = 0usize;

    for _ in 0..total_units {
        match result_rx.recv() {
            Ok(DispatchMessage::Completed { channel, blocks }) => {
                channel_blocks[channel].extend(blocks);
            }
            Ok(DispatchMessage::Failed { message }) => {
                if failure.is_none() {
                    failure = Some(message);
                }
            }
            Err(_) => break,
        }
        completed += 1;
        if let Some(cb) = on_progress.as_deref_mut() {
            cb(completed as f64 / total_units as f64);
        }
    }

    for handle in handles {
        if let Err(payload) = handle.join() {
            if failure.is_none() {
                failure = Some(panic_message(&payload));
            }
        }
    }

    if let Some(message) = failure {
        tracing::error!(%message, "worker failure aborted stretch call");
        return Err(EngineError::WorkerFailure(message));
    }

    let mut outputs = Vec::with_capacity(channel_count);
    for mut blocks in channel_blocks {
        blocks.sort_by_key(|(position, _)| *position);
        let ordered: Vec<Vec<f32>> = blocks.into_iter().map(|(_, block)| block).collect();
        outputs.push(overlap_add_and_normalize(
            &ordered,
            fft_size,
            half_size,
            output_length,
        ));
    }

    Ok(outputs)
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_frames_zero_for_short_input() {
        assert_eq!(total_frames(100, 1024, 256.0), 0);
    }

    #[test]
    fn total_frames_matches_single_threaded_walk() {
        let input_len = 44100;
        let fft_size = 2048;
        let displace_pos = 256.0;

        let mut expected = 0usize;
        let mut pos = 0.0f64;
        while (pos.floor() as usize) + fft_size <= input_len {
            expected += 1;
            pos += displace_pos;
        }

        assert_eq!(total_frames(input_len, fft_size, displace_pos), expected);
    }

    #[test]
    fn work_units_cover_every_frame_exactly_once_per_channel() {
        let units = build_work_units(2, 100, 4);
        for channel in 0..2 {
            let mut covered = Vec::new();
            for u in units.iter().filter(|u| u.channel == channel) {
                for f in u.start_frame..u.start_frame + u.frame_count {
                    covered.push(f);
                }
            }
            covered.sort();
            let expected: Vec<usize> = (0..100).collect();
            assert_eq!(covered, expected);
        }
    }

    #[test]
    fn empty_input_returns_silent_channels() {
        let artifacts = PlanArtifacts {
            plan: Arc::new(FftPlan::new(16).unwrap()),
            window: Arc::new(paulstretch_dsp::generate_window(
                16,
                paulstretch_dsp::WindowShape::Hann,
            )),
            params: DerivedWindowParams {
                win_samples: 16,
                fft_size: 16,
                half_size: 8,
                displace_pos: 4.0,
                output_hop: 8,
                output_length: 40,
            },
        };
        let channels = vec![Arc::new(vec![0.0f32; 5]); 2];

        let result = stretch_parallel(&channels, &artifacts, 2, Some(1), None).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|c| c.len() == 40 && c.iter().all(|&v| v == 0.0)));
    }
}
