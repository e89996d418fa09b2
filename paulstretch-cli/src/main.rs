//! paulstretch-cli: batch command-line driver for the PaulStretch engine.
//!
//! `paulstretch <input.wav> <output.wav> <stretch_factor> [window_seconds] [worker_count]`

use paulstretch_engine::{PaulStretch, StretchConfig};
use std::process::ExitCode;

struct Args {
    input: String,
    output: String,
    stretch_factor: f32,
    window_size_seconds: f32,
    worker_count: Option<usize>,
}

fn parse_args() -> anyhow::Result<Args> {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    if raw.len() < 3 {
        anyhow::bail!(
            "usage: paulstretch <input.wav> <output.wav> <stretch_factor> [window_seconds] [worker_count]"
        );
    }

    let input = raw[0].clone();
    let output = raw[1].clone();
    let stretch_factor: f32 = raw[2].parse()?;
    let window_size_seconds: f32 = match raw.get(3) {
        Some(s) => s.parse()?,
        None => 0.25,
    };
    let worker_count: Option<usize> = match raw.get(4) {
        Some(s) => Some(s.parse()?),
        None => None,
    };

    Ok(Args {
        input,
        output,
        stretch_factor,
        window_size_seconds,
        worker_count,
    })
}

fn run() -> anyhow::Result<()> {
    let args = parse_args()?;

    tracing::info!(input = %args.input, "reading wav");
    let audio = paulstretch_io::read_wav(&args.input)?;
    tracing::info!(
        sample_rate = audio.sample_rate(),
        channels = audio.channel_count(),
        frames = audio.frame_count(),
        "loaded input"
    );

    let config = StretchConfig {
        stretch_factor: args.stretch_factor,
        window_size_seconds: args.window_size_seconds,
        worker_count: args.worker_count,
    };
    let core = PaulStretch::new(config)?;

    let mut last_reported = -1i32;
    let mut on_progress = |p: f64| {
        let percent = (p * 100.0) as i32;
        if percent != last_reported && percent % 10 == 0 {
            tracing::info!(percent, "stretching");
            last_reported = percent;
        }
    };

    let stretched = core.stretch(&audio, Some(&mut on_progress))?;
    tracing::info!(frames = stretched.frame_count(), "stretch complete");

    paulstretch_io::write_wav(&args.output, &stretched)?;
    tracing::info!(output = %args.output, "wrote output");

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "paulstretch failed");
            ExitCode::FAILURE
        }
    }
}
