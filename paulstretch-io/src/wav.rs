//! 16-bit PCM WAV reading and writing.
//!
//! This is a boundary utility, not part of the stretch core: it exists to
//! get samples in and out of `AudioBlock`, nothing more. Only the exact
//! layout this module writes is accepted on read back — compressed
//! container formats are out of scope.

use crate::error::IoError;
use paulstretch_engine::{AudioBlock, EngineError};
use std::io::{Read, Write};
use std::path::Path;

const FMT_PCM: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

fn read_u16<R: Read>(r: &mut R) -> std::io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i16<R: Read>(r: &mut R) -> std::io::Result<i16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(i16::from_le_bytes(buf))
}

/// Write `audio` to `path` as a 16-bit little-endian PCM WAV file.
///
/// Samples are clipped to `[-1, 1]`, then scaled: negative values by 32768,
/// non-negative by 32767 (asymmetric, matching the signed 16-bit range).
/// Channels are interleaved frame-by-frame.
pub fn write_wav<P: AsRef<Path>>(path: P, audio: &AudioBlock) -> Result<(), IoError> {
    let channel_count = audio.channel_count() as u16;
    let frame_count = audio.frame_count();
    let sample_rate = audio.sample_rate();

    let block_align = channel_count * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_size = frame_count as u32 * block_align as u32;
    let file_size = 36 + data_size;

    let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);

    out.write_all(b"RIFF")?;
    out.write_all(&file_size.to_le_bytes())?;
    out.write_all(b"WAVE")?;

    out.write_all(b"fmt ")?;
    out.write_all(&16u32.to_le_bytes())?;
    out.write_all(&FMT_PCM.to_le_bytes())?;
    out.write_all(&channel_count.to_le_bytes())?;
    out.write_all(&sample_rate.to_le_bytes())?;
    out.write_all(&byte_rate.to_le_bytes())?;
    out.write_all(&block_align.to_le_bytes())?;
    out.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

    out.write_all(b"data")?;
    out.write_all(&data_size.to_le_bytes())?;

    let channels = audio.channels();
    for frame in 0..frame_count {
        for channel in channels {
            let sample = channel[frame].clamp(-1.0, 1.0);
            let scaled = if sample < 0.0 {
                sample * 32768.0
            } else {
                sample * 32767.0
            };
            out.write_all(&(scaled.round() as i16).to_le_bytes())?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Read a 16-bit PCM WAV file into an `AudioBlock`, de-interleaving channels
/// and rescaling samples back into `[-1, 1]`.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<AudioBlock, IoError> {
    let mut input = std::io::BufReader::new(std::fs::File::open(path)?);

    let mut riff_tag = [0u8; 4];
    input.read_exact(&mut riff_tag)?;
    if &riff_tag != b"RIFF" {
        return Err(IoError::NotWav);
    }
    let _file_size = read_u32(&mut input)?;

    let mut wave_tag = [0u8; 4];
    input.read_exact(&mut wave_tag)?;
    if &wave_tag != b"WAVE" {
        return Err(IoError::NotWav);
    }

    let mut channel_count = 0u16;
    let mut sample_rate = 0u32;
    let mut bits_per_sample = 0u16;
    let mut samples: Option<Vec<i16>> = None;

    loop {
        let mut chunk_id = [0u8; 4];
        if input.read_exact(&mut chunk_id).is_err() {
            break;
        }
        let chunk_size = read_u32(&mut input)?;

        match &chunk_id {
            b"fmt " => {
                let format_tag = read_u16(&mut input)?;
                if format_tag != FMT_PCM {
                    return Err(IoError::UnsupportedFormatTag(format_tag));
                }
                channel_count = read_u16(&mut input)?;
                sample_rate = read_u32(&mut input)?;
                let _byte_rate = read_u32(&mut input)?;
                let _block_align = read_u16(&mut input)?;
                bits_per_sample = read_u16(&mut input)?;
                if bits_per_sample != BITS_PER_SAMPLE {
                    return Err(IoError::UnsupportedBitDepth(bits_per_sample));
                }
                let remaining = chunk_size.saturating_sub(16);
                skip(&mut input, remaining)?;
            }
            b"data" => {
                let sample_count = (chunk_size / 2) as usize;
                let mut data = Vec::with_capacity(sample_count);
                for _ in 0..sample_count {
                    data.push(read_i16(&mut input)?);
                }
                samples = Some(data);
                if chunk_size % 2 != 0 {
                    skip(&mut input, 1)?;
                }
            }
            _ => skip(&mut input, chunk_size)?,
        }
    }

    if channel_count == 0 {
        return Err(IoError::NoChannels);
    }
    let samples = samples.unwrap_or_default();
    let frame_count = samples.len() / channel_count as usize;

    let mut channels: Vec<Vec<f32>> = vec![Vec::with_capacity(frame_count); channel_count as usize];
    for frame in 0..frame_count {
        for (c, channel) in channels.iter_mut().enumerate() {
            let raw = samples[frame * channel_count as usize + c];
            let scaled = if raw < 0 {
                raw as f32 / 32768.0
            } else {
                raw as f32 / 32767.0
            };
            channel.push(scaled);
        }
    }

    AudioBlock::new(sample_rate, channels).map_err(engine_error_to_io)
}

fn skip<R: Read>(reader: &mut R, count: u32) -> std::io::Result<()> {
    let mut remaining = count as usize;
    let mut buf = [0u8; 1024];
    while remaining > 0 {
        let take = remaining.min(buf.len());
        reader.read_exact(&mut buf[..take])?;
        remaining -= take;
    }
    Ok(())
}

fn engine_error_to_io(e: EngineError) -> IoError {
    IoError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
}
