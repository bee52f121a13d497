/*
    Copyright (C) 2020-2024  Rafal Michalski

    This file is part of RKTAPE, a Rust tool for loading software into Radio-86RK computers.

    For the full copyright notice, see the lib.rs file.
*/
use core::convert::TryFrom;
use core::fmt;
use std::io::{ErrorKind, Error, Read, Seek, SeekFrom};

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use super::*;

/// Reads the whole source from a stream implementing [Read] and [Seek].
///
/// The size of the stream is determined first and checked against [MAX_SOURCE_SIZE],
/// so no memory is allocated for oversized or empty sources.
pub fn read_source<R: Read + Seek>(mut rd: R) -> Result<Vec<u8>, FrameError> {
    let size = rd.seek(SeekFrom::End(0))?;
    rd.seek(SeekFrom::Start(0))?;
    if size > MAX_SOURCE_SIZE as u64 {
        return Err(FrameError::FileTooLarge { size, limit: MAX_SOURCE_SIZE })
    }
    if size == 0 {
        return Err(FrameError::EmptyInput)
    }
    let mut buf = Vec::with_capacity(size as usize);
    rd.take(size).read_to_end(&mut buf)?;
    if buf.is_empty() {
        return Err(FrameError::EmptyInput)
    }
    debug!("source: {} bytes", buf.len());
    Ok(buf)
}

/// The *RK chunk* meta-data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RkChunkInfo {
    /// Represents a complete chunk with the address header and the checksum trailer.
    Loader {
        /// The load address.
        start: u16,
        /// The inclusive end address.
        end: u16,
        /// The checksum stored in the trailer.
        checksum: u16
    },
    /// Represents data following the sync byte that can't be interpreted as a complete chunk.
    Image {
        /// The number of bytes following the sync byte.
        length: usize
    },
    /// Represents a frame without the sync byte.
    Empty
}

/// The *RK chunk* reader.
///
/// Provides helper methods to interpret the underlying bytes the way the monitor's tape
/// loader does. Any leading padding bytes are skipped and the chunk starts at the first [MAGIC_BYTE].
/// This makes it possible to inspect complete tape [frames][Frame] as well as raw tape images.
///
/// Anything that implements `AsRef<[u8]>` can be used as `T` (e.g. `&[u8]`, `Vec<u8>` or [Frame]).
#[derive(Clone, Copy, Debug)]
pub struct RkChunk<T> {
    data: T
}

impl<T> From<T> for RkChunk<T> where T: AsRef<[u8]> {
    fn from(data: T) -> Self {
        RkChunk { data }
    }
}

impl<T> AsRef<[u8]> for RkChunk<T> where T: AsRef<[u8]> {
    #[inline(always)]
    fn as_ref(&self) -> &[u8] {
        self.data.as_ref()
    }
}

impl<T> RkChunk<T> {
    /// Returns the underlying bytes container.
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T> RkChunk<T> where T: AsRef<[u8]> {
    /// Returns the bytes following the sync byte, skipping any padding before it.
    pub fn body(&self) -> Option<&[u8]> {
        let data = self.data.as_ref();
        let offset = data.iter().position(|&b| b != PADDING_BYTE)?;
        match data[offset..].split_first() {
            Some((&MAGIC_BYTE, body)) => Some(body),
            _ => None
        }
    }

    fn word_at(&self, offset: usize) -> Option<u16> {
        match self.body()?.get(offset..offset + 2)? {
            &[hi, lo] => Some(u16::from_be_bytes([hi, lo])),
            _ => None
        }
    }

    /// Returns the load address stored in the header.
    pub fn start(&self) -> Option<u16> {
        self.word_at(0)
    }

    /// Returns the inclusive end address stored in the header.
    pub fn end(&self) -> Option<u16> {
        self.word_at(2)
    }

    /// Returns the length of data declared by the header.
    pub fn data_len(&self) -> Option<usize> {
        let start = self.start()?;
        let end = self.end()?;
        end.checked_sub(start).map(|len| usize::from(len) + 1)
    }

    /// Returns a reference to the data bytes as declared by the header.
    ///
    /// The provided reference does not include the header and the trailer.
    pub fn data(&self) -> Option<&[u8]> {
        let len = self.data_len()?;
        self.body()?.get(BINARY_HEADER_SIZE - 1..BINARY_HEADER_SIZE - 1 + len)
    }

    /// Returns the trailer following the data: padding, the sync byte and the checksum.
    fn trailer(&self) -> Option<&[u8]> {
        let offset = BINARY_HEADER_SIZE - 1 + self.data_len()?;
        self.body()?.get(offset..offset + BINARY_TRAILER_SIZE)
    }

    /// Returns the checksum stored in the trailer.
    pub fn stored_checksum(&self) -> Option<u16> {
        match self.trailer()? {
            &[PADDING_BYTE, PADDING_BYTE, MAGIC_BYTE, hi, lo] => Some(u16::from_be_bytes([hi, lo])),
            _ => None
        }
    }

    /// Calculates the checksum of the data bytes.
    pub fn checksum(&self) -> Option<u16> {
        self.data().map(checksum)
    }

    /// Returns information about the chunk.
    pub fn info(&self) -> RkChunkInfo {
        let body = match self.body() {
            Some(body) => body,
            None => return RkChunkInfo::Empty
        };
        match (self.start(), self.end(), self.stored_checksum()) {
            (Some(start), Some(end), Some(checksum)) => RkChunkInfo::Loader { start, end, checksum },
            _ => RkChunkInfo::Image { length: body.len() }
        }
    }

    /// Checks if this chunk is complete and its checksum is valid.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validates if this chunk is complete and its checksum is valid returning `self` on success.
    pub fn validated(self) -> Result<Self, Error> {
        self.validate().map(|_| self)
    }

    /// Validates if this chunk is complete and its checksum is valid.
    pub fn validate(&self) -> Result<(), Error> {
        if self.body().is_none() {
            return Err(Error::new(ErrorKind::InvalidData, "Not a proper RK chunk: missing sync byte"))
        }
        if self.data_len().is_none() {
            return Err(Error::new(ErrorKind::InvalidData, "Not a proper RK chunk: invalid address range"))
        }
        if self.data().is_none() {
            return Err(Error::new(ErrorKind::UnexpectedEof, "Not a proper RK chunk: data truncated"))
        }
        match self.stored_checksum() {
            None => Err(Error::new(ErrorKind::InvalidData, "Not a proper RK chunk: missing trailer")),
            Some(cs) if Some(cs) != self.checksum() => {
                Err(Error::new(ErrorKind::InvalidData, "Not a proper RK chunk: invalid checksum"))
            }
            Some(_) => Ok(())
        }
    }
}

impl<T> fmt::Display for RkChunk<T> where T: AsRef<[u8]> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.info() {
            RkChunkInfo::Loader { start, end, checksum } => {
                write!(f, "Loader: {:04X}-{:04X} ({} bytes) checksum: {:04X}",
                    start, end, u32::from(end.wrapping_sub(start)) + 1, checksum)
            }
            RkChunkInfo::Image { length } => write!(f, "Image: {} bytes", length),
            RkChunkInfo::Empty => write!(f, "Empty")
        }
    }
}

impl TryFrom<&'_[u8]> for RkChunkInfo {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Error> {
        let chunk = RkChunk::from(bytes);
        chunk.validate()?;
        Ok(chunk.info())
    }
}
