/*
    Copyright (C) 2020-2024  Rafal Michalski

    This file is part of RKTAPE, a Rust tool for loading software into Radio-86RK computers.

    For the full copyright notice, see the lib.rs file.
*/
//! Audio device streaming implementation for [cpal](https://crates.io/crates/cpal).
//!
//! Requires "cpal" feature to be enabled.
use core::convert::TryInto;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use cpal::{
    Stream, StreamConfig, SampleRate, BufferSize,
    PlayStreamError, PauseStreamError, BuildStreamError,
    traits::{DeviceTrait, HostTrait, StreamTrait}
};

use crate::synth::TapeSignal;
pub use super::AudioHandleError;

/// The number of audio channels in the output stream.
pub const CHANNELS: u16 = 2;
/// The number of audio frames requested per each invocation of the audio callback.
pub const FRAMES_PER_BUFFER: u32 = 256;

/// The struct for controling the playback of the tape signal.
///
/// The [TapeSignal] lives in the **cpal** audio thread and is responsible for filling up
/// the audio output buffer with samples. Nothing else touches it after the stream has been created.
pub struct AudioHandle {
    /// The audio sample frequency of the output stream.
    pub sample_rate: u32,
    /// The number of audio channels in the output stream.
    pub channels: u8,
    stream: Stream
}

impl AudioHandle {
    /// Starts playback of the audio device.
    pub fn play(&self) -> Result<(), AudioHandleError> {
        self.stream.play().map_err(From::from)
    }
    /// Pauses playback of the audio device.
    pub fn pause(&self) -> Result<(), AudioHandleError> {
        self.stream.pause().map_err(From::from)
    }
    /// Closes audio playback and frees underlying resources including the tape signal.
    pub fn close(self) {}
    /// Creates an instance of the [AudioHandle] from the default **cpal** host with the default
    /// output device.
    ///
    /// See [AudioHandle::create].
    pub fn create_default<F>(
            signal: TapeSignal<F>,
            sample_rate: u32
        ) -> Result<Self, AudioHandleError>
        where F: AsRef<[u8]> + Send + 'static
    {
        Self::create(&cpal::default_host(), signal, sample_rate)
    }
    /// Creates an instance of the [AudioHandle] from the provided **cpal** `host` with
    /// the default output device.
    ///
    /// * `signal` is the tape signal generator being moved to the audio thread.
    /// * `sample_rate` is the audio sample frequency the `signal` was prepared for.
    pub fn create<F>(
            host: &cpal::Host,
            signal: TapeSignal<F>,
            sample_rate: u32
        ) -> Result<Self, AudioHandleError>
        where F: AsRef<[u8]> + Send + 'static
    {
        let device = host.default_output_device()
                     .ok_or(AudioHandleError::NoOutputDevice)?;
        Self::create_with_device(&device, signal, sample_rate)
    }
    /// Creates an instance of the [AudioHandle] from the provided **cpal** `device` with
    /// [CHANNELS] channels, `sample_rate` frequency and [FRAMES_PER_BUFFER] frames per buffer.
    pub fn create_with_device<F>(
            device: &cpal::Device,
            signal: TapeSignal<F>,
            sample_rate: u32
        ) -> Result<Self, AudioHandleError>
        where F: AsRef<[u8]> + Send + 'static
    {
        if let Ok(name) = device.name() {
            info!("audio device: {}", name);
        }
        let config = StreamConfig {
            channels: CHANNELS,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Fixed(FRAMES_PER_BUFFER)
        };
        Self::create_with_device_and_config(device, &config, signal)
    }
    /// Creates an instance of the [AudioHandle] from the provided **cpal** `device` with the
    /// desired audio parameters.
    ///
    /// * `config` specifies the desired audio parameters, the sample format is always `f32`.
    /// * `signal` is the tape signal generator being moved to the audio thread.
    pub fn create_with_device_and_config<F>(
            device: &cpal::Device,
            config: &StreamConfig,
            mut signal: TapeSignal<F>
        ) -> Result<Self, AudioHandleError>
        where F: AsRef<[u8]> + Send + 'static
    {
        let sample_rate = config.sample_rate.0;
        let unsupported = |reason: String| AudioHandleError::UnsupportedStream {
            channels: config.channels, sample_rate, reason
        };
        let channels: u8 = match config.channels.try_into() {
            Ok(0)|Err(_) => return Err(unsupported("the number of channels must be between 1 and 255".to_string())),
            Ok(channels) => channels
        };
        debug!("audio specs: {:?}", config);
        debug!("half-bit samples: {}", signal.clock().half_bit_samples());

        let chans = usize::from(channels);
        let data_fn = move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
            signal.render(out, chans)
        };

        let err_fn = |err| error!("an error occurred on stream: {}", err);

        let stream = device.build_output_stream(config, data_fn, err_fn, None)
                     .map_err(|err| match err {
                         BuildStreamError::StreamConfigNotSupported|
                         BuildStreamError::InvalidArgument => unsupported(err.to_string()),
                         err => AudioHandleError::from(err)
                     })?;

        Ok(AudioHandle {
            sample_rate,
            channels,
            stream
        })
    }
}

impl From<PlayStreamError> for AudioHandleError {
    fn from(e: PlayStreamError) -> Self {
        match e {
            PlayStreamError::DeviceNotAvailable => AudioHandleError::DeviceNotAvailable(e.to_string()),
            _ => AudioHandleError::Stream(e.to_string())
        }
    }
}

impl From<PauseStreamError> for AudioHandleError {
    fn from(e: PauseStreamError) -> Self {
        match e {
            PauseStreamError::DeviceNotAvailable => AudioHandleError::DeviceNotAvailable(e.to_string()),
            _ => AudioHandleError::Stream(e.to_string())
        }
    }
}

impl From<BuildStreamError> for AudioHandleError {
    fn from(e: BuildStreamError) -> Self {
        match e {
            BuildStreamError::DeviceNotAvailable => AudioHandleError::DeviceNotAvailable(e.to_string()),
            _ => AudioHandleError::Stream(e.to_string())
        }
    }
}
