/*
    Copyright (C) 2020-2024  Rafal Michalski

    This file is part of RKTAPE, a Rust tool for loading software into Radio-86RK computers.

    For the full copyright notice, see the lib.rs file.
*/
//! Rendering the tape signal to WAV files.
//!
//! The signal is written as 2 channels of 32-bit floating point samples followed by
//! [PLAYBACK_MARGIN][crate::PLAYBACK_MARGIN] of silence, so it can be played back by any
//! audio player or recorded to a real tape.
use std::io::{Seek, Write};
use std::path::Path;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use crate::audio::synth::TapeSignal;
use crate::{Result, PLAYBACK_MARGIN};

/// Returns the WAV specification of the rendered signal.
pub fn wav_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    }
}

/// Returns the number of silent audio frames appended after the signal.
pub fn margin_frames(sample_rate: u32) -> u64 {
    u64::from(sample_rate) * PLAYBACK_MARGIN.as_millis() as u64 / 1000
}

/// Renders the whole `signal` to the given writer in the WAV format.
///
/// Returns the number of audio frames written, including the trailing silence.
pub fn write_wav<W, F>(wr: W, mut signal: TapeSignal<F>, sample_rate: u32) -> Result<u64>
    where W: Write + Seek, F: AsRef<[u8]>
{
    let mut writer = hound::WavWriter::new(wr, wav_spec(sample_rate))?;
    let mut frames = 0;
    while !signal.is_done() {
        let (left, right) = signal.next_frame();
        writer.write_sample(left)?;
        writer.write_sample(right)?;
        frames += 1;
    }
    debug!("signal: {} frames", frames);
    for _ in 0..margin_frames(sample_rate) {
        let (left, right) = signal.next_frame();
        writer.write_sample(left)?;
        writer.write_sample(right)?;
        frames += 1;
    }
    writer.finalize()?;
    Ok(frames)
}

/// Creates a WAV file at `path` and renders the whole `signal` to it.
///
/// Returns the number of audio frames written, including the trailing silence.
pub fn create_wav<P, F>(path: P, signal: TapeSignal<F>, sample_rate: u32) -> Result<u64>
    where P: AsRef<Path>, F: AsRef<[u8]>
{
    let file = std::fs::File::create(path).map_err(hound::Error::IoError)?;
    write_wav(std::io::BufWriter::new(file), signal, sample_rate)
}
