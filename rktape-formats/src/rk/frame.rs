/*
    Copyright (C) 2020-2024  Rafal Michalski

    This file is part of RKTAPE, a Rust tool for loading software into Radio-86RK computers.

    For the full copyright notice, see the lib.rs file.
*/
use core::ops::{Deref, Range};

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use super::*;

/// The complete byte sequence being transmitted as a tape signal.
///
/// Created by [build_frame]. Once built the content can't be modified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    mode: FormatMode,
    payload: Range<usize>
}

impl Frame {
    /// Returns the mode this frame was built with.
    pub fn mode(&self) -> FormatMode {
        self.mode
    }
    /// Returns all bytes of the frame.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
    /// Returns the source bytes embedded in the frame.
    pub fn payload(&self) -> &[u8] {
        &self.data[self.payload.clone()]
    }
    /// Returns the range of the source bytes within the frame.
    pub fn payload_range(&self) -> Range<usize> {
        self.payload.clone()
    }
    /// Returns the underlying bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Deref for Frame {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl AsRef<[u8]> for Frame {
    #[inline(always)]
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Returns the size in bytes of the frame that [build_frame] creates from the `source`.
pub fn frame_size(source: &[u8], params: &EncodingParams) -> usize {
    let overhead = match params.format {
        FormatMode::TapeImage => match source.first() {
            Some(&MAGIC_BYTE) => 0,
            _ => 1
        }
        FormatMode::BinaryLoader => BINARY_HEADER_SIZE + BINARY_TRAILER_SIZE
    };
    PADDING_SIZE + overhead + source.len()
}

/// Wraps `source` bytes into a tape [Frame] according to `params`.
///
/// The frame starts with [PADDING_SIZE] padding bytes followed by:
///
/// * in [FormatMode::TapeImage] mode: the [MAGIC_BYTE] unless `source` already starts with it,
///   followed by the `source` bytes;
/// * in [FormatMode::BinaryLoader] mode: the chunk header with the load and end address, the `source`
///   bytes and the trailer with the [checksum] of the `source` bytes.
///
/// Parameters are checked with [EncodingParams::validate] before anything is allocated.
pub fn build_frame(source: &[u8], params: &EncodingParams) -> Result<Frame, FrameError> {
    params.validate(source.len())?;
    let size = frame_size(source, params);
    let mut data = Vec::with_capacity(size);
    data.resize(PADDING_SIZE, PADDING_BYTE);
    match params.format {
        FormatMode::TapeImage => {
            if source[0] != MAGIC_BYTE {
                data.push(MAGIC_BYTE);
            }
        }
        FormatMode::BinaryLoader => {
            let end = params.end_address(source.len())?;
            data.push(MAGIC_BYTE);
            data.extend_from_slice(&params.load_address.to_be_bytes());
            data.extend_from_slice(&end.to_be_bytes());
        }
    }
    let payload = data.len()..data.len() + source.len();
    data.extend_from_slice(source);
    if params.format == FormatMode::BinaryLoader {
        data.extend_from_slice(&[PADDING_BYTE; TRAILER_PADDING_SIZE]);
        data.push(MAGIC_BYTE);
        data.extend_from_slice(&checksum(source).to_be_bytes());
    }
    assert_eq!(data.len(), size, "frame size mismatch");
    debug!("frame: {} bytes, {}, payload at {:?}", size, params.format, payload);
    Ok(Frame { data, mode: params.format, payload })
}
