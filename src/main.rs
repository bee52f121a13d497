/*
    Copyright (C) 2020-2024  Rafal Michalski

    This file is part of RKTAPE, a Rust tool for loading software into Radio-86RK computers.

    For the full copyright notice, see the lib.rs file.
*/
use std::fs::File;
use std::process;
use std::time::Duration;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use rktape::audio::synth::TapeSignal;
use rktape::formats::rk::{build_frame, read_source, Frame, RkChunk};
use rktape::{playback_duration, tape_signal, wav, Result};

mod args;

use args::Options;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::from_args();

    if let Err(err) = run(options) {
        error!("{}", err);
        process::exit(1);
    }
}

fn run(options: Options) -> Result<()> {
    let Options { source, wav: wav_path, params } = options;

    let file = File::open(&source)?;
    let data = read_source(file)?;
    let frame = build_frame(&data, &params)?;
    drop(data);

    info!("{}: {} bytes, {}, {} baud", source.display(), frame.payload().len(), frame.mode(), params.baud_rate);
    info!("{}", RkChunk::from(frame.as_slice()));

    let duration = playback_duration(frame.len(), params.baud_rate);
    let signal = tape_signal(frame, &params)?;

    if let Some(path) = wav_path {
        let frames = wav::create_wav(&path, signal, params.sample_rate)?;
        info!("{}: {} frames written", path.display(), frames);
        return Ok(())
    }

    info!("playing: {:.1} s", duration.as_secs_f32());
    play(signal, params.sample_rate, duration)
}

#[cfg(feature = "cpal")]
fn play(
        signal: TapeSignal<Frame>,
        sample_rate: u32,
        duration: Duration
    ) -> Result<()>
{
    use std::thread;
    use rktape::audio::host::cpal::AudioHandle;

    let audio = AudioHandle::create_default(signal, sample_rate)?;
    audio.play()?;
    thread::sleep(duration);
    let res = audio.pause();
    audio.close();
    res.map_err(From::from)
}

#[cfg(not(feature = "cpal"))]
fn play(
        _signal: TapeSignal<Frame>,
        _sample_rate: u32,
        _duration: Duration
    ) -> Result<()>
{
    Err(rktape::audio::host::AudioHandleError::Unsupported.into())
}
