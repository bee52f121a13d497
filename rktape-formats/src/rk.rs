/*
    Copyright (C) 2020-2024  Rafal Michalski

    This file is part of RKTAPE, a Rust tool for loading software into Radio-86RK computers.

    For the full copyright notice, see the lib.rs file.
*/
/*! **RK** tape frame utilities.

# RK tape format

The Radio-86RK monitor reads the tape as a continuous stream of bytes. Each byte is sent
MSB first and each bit is encoded with a self-clocking phase modulation, so the loader can
follow the speed of the tape without any lead tone of a fixed length. The loader waits for the
synchronization byte `0xE6` and only then starts interpreting the data.

A program saved by the monitor has the following layout, referenced here as an *RK chunk*:

| offset  | size | description                                     |
|---------|------|-------------------------------------------------|
|    0    |    1 | sync byte `0xE6`                                |
|    1    |    2 | start (load) address (MSB first)                |
|    3    |    2 | end address, inclusive (MSB first)              |
|    5    |    N | data, `N = end - start + 1`                     |
|  5+N    |    2 | zero bytes                                      |
|  7+N    |    1 | sync byte `0xE6`                                |
|  8+N    |    2 | checksum of the data bytes only (MSB first)     |

The *tape frame* is what is actually transmitted: [PADDING_SIZE] zero bytes, which let the
receiving side settle its clock recovery, followed by the chunk.

Frames are built in one of two [modes][FormatMode]:

* [FormatMode::TapeImage] treats the source as an already tagged tape image (e.g. an `.rk` file).
  Only the leading sync byte is ensured: it is inserted unless the image already begins with it.
* [FormatMode::BinaryLoader] treats the source as raw machine code. The chunk header, the trailer
  and the [checksum] are synthesized around it.

```no_run
use std::fs::File;
use rktape_formats::rk::*;

let source = read_source(File::open("game.bin")?)?;
let params = EncodingParams::default()
                .with_format(FormatMode::BinaryLoader)
                .with_load_address(0x0100);
let frame = build_frame(&source, &params)?;
let chunk = RkChunk::from(frame.as_slice()).validated()?;
println!("{}", chunk);
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
use core::borrow::Borrow;
use core::fmt;
use std::io;

mod frame;
mod read;
pub use frame::*;
pub use read::*;

/// The fixed audio sample frequency the tape signal is being rendered with.
pub const SAMPLE_RATE: u32 = 48_000;
/// The default tape speed in bits per second.
pub const DEFAULT_BAUD_RATE: u32 = 1300;
/// The synchronization byte marking the beginning of meaningful data.
pub const MAGIC_BYTE: u8 = 0xE6;
/// The value of the leading and inner padding bytes.
pub const PADDING_BYTE: u8 = 0x00;
/// The number of padding bytes preceding the data in each frame.
pub const PADDING_SIZE: usize = 256;
/// The maximum size in bytes of the source file.
pub const MAX_SOURCE_SIZE: usize = 0x7600;
/// The size of the synthesized chunk header: sync byte, start and end address.
pub const BINARY_HEADER_SIZE: usize = 5;
/// The size of the synthesized chunk trailer: 2 padding bytes, sync byte and checksum.
pub const BINARY_TRAILER_SIZE: usize = 5;
/// The number of padding bytes between the data and the trailing sync byte.
pub const TRAILER_PADDING_SIZE: usize = 2;

/// Determines how the source bytes are wrapped into a tape frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatMode {
    /// The source is a tape image already carrying its own header.
    TapeImage,
    /// The source is raw machine code requiring a synthesized loader header.
    BinaryLoader,
}

/// Parameters of the tape frame and of the signal it's being played with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodingParams {
    /// How to wrap the source bytes.
    pub format: FormatMode,
    /// Tape speed in bits per second, must be in the range: `[1, sample_rate / 2]`.
    pub baud_rate: u32,
    /// The address the data should be loaded at. Used only by [FormatMode::BinaryLoader].
    pub load_address: u16,
    /// The audio sample frequency, [SAMPLE_RATE] by default.
    pub sample_rate: u32,
}

/// An error returned when the tape frame can't be built.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    /// The source has no data.
    #[error("input file is empty")]
    EmptyInput,
    /// The source exceeds [MAX_SOURCE_SIZE].
    #[error("input file is too long: {size} bytes, the limit is {limit} bytes")]
    FileTooLarge {
        size: u64,
        limit: usize
    },
    /// The data wouldn't fit in memory when loaded at the given address.
    #[error("invalid load address: {address:#06x}, data would end at {end:#x}")]
    InvalidLoadAddress {
        address: u16,
        end: u32
    },
    /// The tape speed is not in the range: `[1, sample_rate / 2]`.
    #[error("baud rate must be between 1 and {max}, got {rate}")]
    InvalidBaudRate {
        rate: u32,
        max: u32
    },
    /// The source couldn't be read.
    #[error("cannot read input file: {0}")]
    Unreadable(#[from] io::Error),
}

impl Default for FormatMode {
    fn default() -> Self {
        FormatMode::TapeImage
    }
}

impl fmt::Display for FormatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FormatMode::TapeImage => "tape image",
            FormatMode::BinaryLoader => "binary loader",
        })
    }
}

impl Default for EncodingParams {
    fn default() -> Self {
        EncodingParams {
            format: FormatMode::default(),
            baud_rate: DEFAULT_BAUD_RATE,
            load_address: 0,
            sample_rate: SAMPLE_RATE
        }
    }
}

impl EncodingParams {
    /// Changes `format` returning a modified `EncodingParams`.
    pub fn with_format(mut self, format: FormatMode) -> Self {
        self.format = format;
        self
    }
    /// Changes `baud_rate` returning a modified `EncodingParams`.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
    /// Changes `load_address` returning a modified `EncodingParams`.
    pub fn with_load_address(mut self, load_address: u16) -> Self {
        self.load_address = load_address;
        self
    }
    /// Changes `sample_rate` returning a modified `EncodingParams`.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }
    /// Returns the highest accepted baud rate for the current sample rate.
    pub fn max_baud_rate(&self) -> u32 {
        self.sample_rate / 2
    }
    /// Validates parameters against the source of the given length.
    ///
    /// The checks are performed in the following order: the source size limit, an empty source,
    /// the load address (only in [FormatMode::BinaryLoader] mode) and the baud rate.
    pub fn validate(&self, source_len: usize) -> Result<(), FrameError> {
        if source_len > MAX_SOURCE_SIZE {
            return Err(FrameError::FileTooLarge { size: source_len as u64, limit: MAX_SOURCE_SIZE })
        }
        if source_len == 0 {
            return Err(FrameError::EmptyInput)
        }
        if self.format == FormatMode::BinaryLoader {
            self.end_address(source_len)?;
        }
        let max = self.max_baud_rate();
        if !(1..=max).contains(&self.baud_rate) {
            return Err(FrameError::InvalidBaudRate { rate: self.baud_rate, max })
        }
        Ok(())
    }
    /// Returns the inclusive end address of the data of the given length loaded at `load_address`.
    ///
    /// Validates the address range.
    pub fn end_address(&self, source_len: usize) -> Result<u16, FrameError> {
        let address = self.load_address;
        let end = u32::from(address) + (source_len as u32).saturating_sub(1);
        if usize::from(address) > MAX_SOURCE_SIZE || end > u32::from(u16::MAX) {
            return Err(FrameError::InvalidLoadAddress { address, end })
        }
        Ok(end as u16)
    }
}

/// Calculates the 16-bit checksum of the given data bytes, the same way the monitor's tape
/// routine does.
///
/// The high byte accumulates each byte but the last one together with the carry out of the low byte.
/// The last byte is added only to the low byte.
pub fn checksum<I: IntoIterator<Item=B>, B: Borrow<u8>>(iter: I) -> u16 {
    let mut iter = iter.into_iter().peekable();
    let mut lo: u16 = 0;
    let mut hi: u16 = 0;
    while let Some(byte) = iter.next() {
        let byte = u16::from(*byte.borrow());
        lo += byte;
        if iter.peek().is_some() {
            hi += byte;
            hi += (lo >> 8) & 1;
            lo &= 0xFF;
            hi &= 0xFF;
        }
    }
    (lo & 0xFF) | (hi << 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_works() {
        assert_eq!(0x0000, checksum(&[0u8; 0]));
        assert_eq!(0x00AB, checksum(&[0xABu8]));
        assert_eq!(0x0306, checksum(&[0x01u8, 0x02, 0x03]));
        assert_eq!(0x0306, checksum([1u8, 2, 3].iter()));
        // the carry out of the low byte goes to the high byte
        assert_eq!(0x0100, checksum(&[0xFFu8, 0x01, 0x00]));
        // but not for the last byte
        assert_eq!(0x8000, checksum(&[0x80u8, 0x80]));
        assert_eq!(0xFF01, checksum(&[0xFFu8, 0x02]));
    }

    #[test]
    fn params_validate() {
        let params = EncodingParams::default();
        assert_eq!(DEFAULT_BAUD_RATE, params.baud_rate);
        assert_eq!(SAMPLE_RATE, params.sample_rate);
        assert_eq!(FormatMode::TapeImage, params.format);
        assert!(params.validate(1).is_ok());
        assert!(params.validate(MAX_SOURCE_SIZE).is_ok());
        assert!(matches!(params.validate(MAX_SOURCE_SIZE + 1),
                         Err(FrameError::FileTooLarge { size, limit: MAX_SOURCE_SIZE })
                         if size == MAX_SOURCE_SIZE as u64 + 1));
        assert!(matches!(params.validate(0), Err(FrameError::EmptyInput)));

        assert!(params.with_baud_rate(24000).validate(1).is_ok());
        assert!(matches!(params.with_baud_rate(24001).validate(1),
                         Err(FrameError::InvalidBaudRate { rate: 24001, max: 24000 })));
        assert!(matches!(params.with_baud_rate(0).validate(1),
                         Err(FrameError::InvalidBaudRate { rate: 0, .. })));
        // the load address is checked only in the binary loader mode
        assert!(params.with_load_address(0xF000).validate(1).is_ok());
        let params = params.with_format(FormatMode::BinaryLoader);
        assert!(params.with_load_address(MAX_SOURCE_SIZE as u16).validate(10).is_ok());
        assert!(matches!(params.with_load_address(MAX_SOURCE_SIZE as u16 + 1).validate(10),
                         Err(FrameError::InvalidLoadAddress { address: 0x7601, end: 0x760A })));
        // the size is checked before the load address and the baud rate
        assert!(matches!(params.with_load_address(0xFFFF).with_baud_rate(0).validate(MAX_SOURCE_SIZE + 1),
                         Err(FrameError::FileTooLarge { .. })));
    }

    #[test]
    fn end_address_works() {
        let params = EncodingParams::default().with_load_address(0x0100);
        assert_eq!(0x0109, params.end_address(10).unwrap());
        assert_eq!(0x0100, params.end_address(1).unwrap());
        assert_eq!(0x75FF, params.with_load_address(0).end_address(MAX_SOURCE_SIZE).unwrap());
    }
}
