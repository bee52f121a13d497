/*
    Copyright (C) 2020-2024  Rafal Michalski

    This file is part of RKTAPE, a Rust tool for loading software into Radio-86RK computers.

    RKTAPE is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License (LGPL) as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    RKTAPE is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Lesser General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
/*! # RKTAPE

RKTAPE loads software into the Radio-86RK and compatible computers through their tape input.

A file is wrapped into a tape [frame][formats::rk::Frame] and then played as a bit-clocked,
self-clocking [signal][audio::synth::TapeSignal] through the native audio output or written to a WAV file.

```no_run
use std::fs::File;
use rktape::formats::rk::*;

let source = read_source(File::open("game.rk")?)?;
let params = EncodingParams::default();
let frame = build_frame(&source, &params)?;
let frame_len = frame.len();
let duration = rktape::playback_duration(frame_len, params.baud_rate);
let signal = rktape::tape_signal(frame, &params)?;
println!("{} bytes, {:?}", frame_len, duration);
rktape::wav::create_wav("game.wav", signal, params.sample_rate)?;
# Ok::<(), rktape::Error>(())
```
*/
use core::time::Duration;
use std::io;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

pub use rktape_audio as audio;
pub use rktape_formats as formats;

pub mod wav;

use audio::host::AudioHandleError;
use audio::synth::{BitClock, TapeSignal};
use formats::rk::{EncodingParams, Frame, FrameError};

/// The additional time the audio stream is kept open after the signal has been played.
pub const PLAYBACK_MARGIN: Duration = Duration::from_millis(1000);

/// Error types returned by the RKTAPE operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The tape frame couldn't be built.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// The audio device failed.
    #[error("audio device error: {0}")]
    AudioDevice(#[from] AudioHandleError),
    /// The WAV file couldn't be written.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Frame(FrameError::Unreadable(err))
    }
}

/// Result type for RKTAPE operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the time needed to play the frame of the given length at the given baud rate,
/// including [PLAYBACK_MARGIN].
///
/// # Panics
/// Panics if `baud_rate` is 0.
pub fn playback_duration(frame_len: usize, baud_rate: u32) -> Duration {
    let millis = frame_len as u64 * 8 * 1000 / u64::from(baud_rate);
    Duration::from_millis(millis) + PLAYBACK_MARGIN
}

/// Creates the tape signal generator playing the `frame` with the baud rate and
/// the sample rate from `params`.
pub fn tape_signal(frame: Frame, params: &EncodingParams) -> Result<TapeSignal<Frame>> {
    let clock = BitClock::new(params.sample_rate, params.baud_rate)
                .ok_or(FrameError::InvalidBaudRate {
                    rate: params.baud_rate,
                    max: params.max_baud_rate()
                })?;
    Ok(TapeSignal::new(frame, clock))
}
