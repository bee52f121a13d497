/*
    Copyright (C) 2020-2024  Rafal Michalski

    This file is part of RKTAPE, a Rust tool for loading software into Radio-86RK computers.

    For the full copyright notice, see the lib.rs file.
*/
//! Native audio output of the tape signal.
//!
//! Enable the `cpal` feature to get the [cpal::AudioHandle].
#[cfg(feature = "cpal")]
pub mod cpal;

/// An error returned when the tape signal can't be played through the audio output.
///
/// Variants carrying a `String` hold the diagnostic text reported by the audio backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioHandleError {
    /// The host has no default output device.
    #[error("no default audio output device")]
    NoOutputDevice,
    /// The device has been disconnected or is otherwise unavailable.
    #[error("audio device is not available: {0}")]
    DeviceNotAvailable(String),
    /// The device can't play a stream of the tape signal's format.
    #[error("audio device rejected {channels} channel(s) at {sample_rate} Hz: {reason}")]
    UnsupportedStream {
        channels: u16,
        sample_rate: u32,
        reason: String
    },
    /// The stream failed to build, start or stop.
    #[error("audio stream error: {0}")]
    Stream(String),
    /// The native audio output hasn't been compiled in.
    #[error("native audio output is not available in this build, use -w to write a WAV file")]
    Unsupported,
}

impl AudioHandleError {
    /// Returns `true` if the audio output can't be used at all and a retry won't help.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AudioHandleError::NoOutputDevice |
                       AudioHandleError::DeviceNotAvailable(..) |
                       AudioHandleError::Unsupported)
    }
}
