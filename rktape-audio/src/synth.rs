/*
    Copyright (C) 2020-2024  Rafal Michalski

    This file is part of RKTAPE, a Rust tool for loading software into Radio-86RK computers.

    For the full copyright notice, see the lib.rs file.
*/
//! Bit-clocked *TAPE* signal synthesis.
//!
//! Each bit of the transmitted bytes, starting from the most significant one, is encoded
//! as two half-bits of equal duration and opposite amplitude. The level of each half-bit is the
//! value of the bit XOR-ed with the phase flag, which is set for the first half. So there is always
//! a transition in the middle of each bit period and its direction determines the value of the bit.
//!
//! The signal generator is a nested state machine: a sample within a half-bit, a half-bit within a bit,
//! a bit within a byte and a byte within a frame. It's being advanced exactly once per each audio frame
//! and performs no allocations or I/O, so it can be driven directly from a real-time audio callback.
//! After the last bit has been emitted the generator produces silence indefinitely.
use core::num::NonZeroU32;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

/// The amplitude of the generated signal.
pub const OUTPUT_LEVEL: f32 = 0.1;

/// The duration of the signal elements measured in audio samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitClock {
    half_bit_samples: NonZeroU32
}

/// The position of the signal generator within the transmitted frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackCursor {
    byte_position: usize,
    bit_position: u8,
    invert: bool,
    samples_left: u32,
    done: bool
}

/// The tape signal generator.
///
/// Owns the transmitted bytes together with the [PlaybackCursor], so it can be moved into
/// an audio callback closure.
///
/// Anything that implements `AsRef<[u8]>` can be used as `F` (e.g. `&[u8]` or `Vec<u8>`).
#[derive(Clone, Debug)]
pub struct TapeSignal<F> {
    frame: F,
    clock: BitClock,
    cursor: PlaybackCursor
}

impl BitClock {
    /// Creates a new `BitClock` for the given sample rate and baud rate.
    ///
    /// A half-bit lasts `sample_rate / (2 * baud_rate)` samples, rounded down.
    ///
    /// Returns `None` if `baud_rate` is 0 or greater than `sample_rate / 2`.
    pub fn new(sample_rate: u32, baud_rate: u32) -> Option<Self> {
        let half_bit_samples = sample_rate.checked_div(baud_rate.checked_mul(2)?)?;
        NonZeroU32::new(half_bit_samples).map(|half_bit_samples| BitClock { half_bit_samples })
    }
    /// Returns the number of samples in each half-bit.
    #[inline]
    pub fn half_bit_samples(&self) -> u32 {
        self.half_bit_samples.get()
    }
    /// Returns the number of samples in each bit period.
    #[inline]
    pub fn bit_samples(&self) -> u32 {
        self.half_bit_samples.get() * 2
    }
}

impl PlaybackCursor {
    /// Creates a cursor positioned at the most significant bit of the first byte of the frame
    /// of the given length.
    pub fn new(clock: BitClock, frame_len: usize) -> Self {
        PlaybackCursor {
            byte_position: 0,
            bit_position: 7,
            invert: true,
            samples_left: clock.half_bit_samples(),
            done: frame_len == 0
        }
    }
    /// Returns the index of the byte being transmitted.
    pub fn byte_position(&self) -> usize {
        self.byte_position
    }
    /// Returns the bit being transmitted: 7 = MSB, 0 = LSB.
    pub fn bit_position(&self) -> u8 {
        self.bit_position
    }
    /// Returns `true` if the first half of the bit is being transmitted.
    pub fn is_first_half(&self) -> bool {
        self.invert
    }
    /// Returns `true` if the whole frame has been transmitted.
    pub fn is_done(&self) -> bool {
        self.done
    }
    /// Returns the signal level of the next sample and advances the cursor.
    ///
    /// `frame` should be the same for each call.
    #[inline]
    pub fn next_level(&mut self, frame: &[u8], clock: BitClock) -> f32 {
        if self.done {
            return 0.0
        }
        let byte = match frame.get(self.byte_position) {
            Some(byte) => *byte,
            None => {
                self.done = true;
                return 0.0
            }
        };
        let bit = (byte >> self.bit_position) & 1 == 1;
        let level = if bit ^ self.invert { OUTPUT_LEVEL } else { -OUTPUT_LEVEL };
        self.samples_left -= 1;
        if self.samples_left == 0 {
            self.samples_left = clock.half_bit_samples();
            self.invert = !self.invert;
            // back to the first half, the whole bit has been transmitted
            if self.invert {
                if self.bit_position == 0 {
                    self.bit_position = 7;
                    self.byte_position += 1;
                    if self.byte_position >= frame.len() {
                        self.done = true;
                    }
                }
                else {
                    self.bit_position -= 1;
                }
            }
        }
        level
    }
}

impl<F> TapeSignal<F> {
    /// Returns the bit clock.
    pub fn clock(&self) -> BitClock {
        self.clock
    }
    /// Returns a reference to the cursor.
    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }
    /// Returns `true` if the whole frame has been transmitted.
    pub fn is_done(&self) -> bool {
        self.cursor.done
    }
    /// Returns a shared reference to the transmitted bytes container.
    pub fn get_ref(&self) -> &F {
        &self.frame
    }
    /// Returns the transmitted bytes container.
    pub fn into_inner(self) -> F {
        self.frame
    }
}

impl<F: AsRef<[u8]>> TapeSignal<F> {
    /// Creates a new `TapeSignal` transmitting `frame` bytes.
    pub fn new(frame: F, clock: BitClock) -> Self {
        let cursor = PlaybackCursor::new(clock, frame.as_ref().len());
        debug!("tape signal: {} bytes, {} samples per half-bit", frame.as_ref().len(), clock.half_bit_samples());
        TapeSignal { frame, clock, cursor }
    }
    /// Returns the number of non-silent samples of the whole signal.
    pub fn samples_total(&self) -> u64 {
        self.frame.as_ref().len() as u64 * 8 * u64::from(self.clock.bit_samples())
    }
    /// Returns the next stereo sample. Both channels always have the same value.
    #[inline]
    pub fn next_frame(&mut self) -> (f32, f32) {
        let level = self.cursor.next_level(self.frame.as_ref(), self.clock);
        (level, level)
    }
    /// Fills the interleaved `out` buffer with samples, advancing the generator once for each group
    /// of `channels` samples. The same level is written to each channel.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return
        }
        let frame = self.frame.as_ref();
        for chans in out.chunks_mut(channels) {
            let level = self.cursor.next_level(frame, self.clock);
            for p in chans {
                *p = level;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_bits(signal: &mut TapeSignal<&[u8]>) -> Vec<f32> {
        let half = signal.clock().half_bit_samples();
        let mut levels = Vec::new();
        while !signal.is_done() {
            let (level, right) = signal.next_frame();
            assert_eq!(level, right);
            for _ in 1..half {
                assert_eq!((level, level), signal.next_frame());
            }
            levels.push(level);
        }
        levels
    }

    fn decode(levels: &[f32]) -> Vec<u8> {
        levels.chunks(16).map(|byte| {
            byte.chunks(2).fold(0u8, |acc, bit| {
                assert_eq!(bit[0], -bit[1]);
                acc << 1 | (bit[1] > 0.0) as u8
            })
        }).collect()
    }

    #[test]
    fn bit_clock_works() {
        let clock = BitClock::new(48000, 1300).unwrap();
        assert_eq!(18, clock.half_bit_samples());
        assert_eq!(36, clock.bit_samples());
        assert_eq!(1, BitClock::new(48000, 24000).unwrap().half_bit_samples());
        assert_eq!(None, BitClock::new(48000, 24001));
        assert_eq!(None, BitClock::new(48000, 0));
        assert_eq!(None, BitClock::new(48000, u32::MAX));
        assert_eq!(24000, BitClock::new(48000, 1).unwrap().half_bit_samples());
    }

    #[test]
    fn tape_signal_works() {
        let clock = BitClock::new(48000, 1300).unwrap();
        let data: &[u8] = &[0xFF];
        let mut signal = TapeSignal::new(data, clock);
        assert_eq!(36 * 8, signal.samples_total());
        assert_eq!(7, signal.cursor().bit_position());
        assert!(signal.cursor().is_first_half());
        let mut samples = Vec::new();
        while !signal.is_done() {
            samples.push(signal.next_frame().0);
        }
        assert_eq!(36 * 8, samples.len());
        let mut expected = Vec::new();
        for _ in 0..8 {
            expected.extend_from_slice(&[-OUTPUT_LEVEL; 18]);
            expected.extend_from_slice(&[OUTPUT_LEVEL; 18]);
        }
        assert_eq!(expected, samples);
        // a transition at every half-bit boundary
        for half_bits in samples.chunks(18).collect::<Vec<_>>().windows(2) {
            assert_ne!(half_bits[0][17], half_bits[1][0]);
        }
        assert_eq!(1, signal.cursor().byte_position());
        for _ in 0..1000 {
            assert_eq!((0.0, 0.0), signal.next_frame());
        }
        assert!(signal.is_done());
    }

    #[test]
    fn tape_signal_bits_works() {
        let data: &[u8] = &[0x00, 0xA5, 0xE6, 0x01, 0x80];
        for &baud in &[1, 300, 1300, 2400, 16000, 24000] {
            let clock = BitClock::new(48000, baud).unwrap();
            if clock.half_bit_samples() > 1000 {
                continue
            }
            let mut signal = TapeSignal::new(data, clock);
            let levels = half_bits(&mut signal);
            assert_eq!(2 * 8 * data.len(), levels.len());
            assert_eq!(data, &decode(&levels)[..]);
            assert_eq!((0.0, 0.0), signal.next_frame());
        }
        // bit 0 starts high, bit 1 starts low
        let clock = BitClock::new(48000, 24000).unwrap();
        let mut signal = TapeSignal::new(&[0x40u8][..], clock);
        assert_eq!(vec![OUTPUT_LEVEL, -OUTPUT_LEVEL, -OUTPUT_LEVEL, OUTPUT_LEVEL],
                   half_bits(&mut signal)[..4].to_vec());
    }

    #[test]
    fn tape_signal_render_works() {
        let clock = BitClock::new(48000, 12000).unwrap();
        let data = vec![0x0Fu8, 0x55];
        let mut signal = TapeSignal::new(data.clone(), clock);
        let mut expected = TapeSignal::new(data, clock);
        let mut out = vec![1.0f32; 256 * 2];
        let mut total = 0;
        while !signal.is_done() {
            signal.render(&mut out, 2);
            for chans in out.chunks(2) {
                assert_eq!(chans[0], chans[1]);
                assert_eq!(expected.next_frame().0, chans[0]);
                total += 1;
            }
        }
        assert_eq!(256, total);
        assert_eq!(64, signal.samples_total());
        assert!(out[64 * 2..].iter().all(|&s| s == 0.0));
        signal.render(&mut out, 0);
        let mut mono = vec![1.0f32; 10];
        signal.render(&mut mono, 1);
        assert_eq!(vec![0.0f32; 10], mono);
    }

    #[test]
    fn empty_frame_is_silent() {
        let clock = BitClock::new(48000, 1300).unwrap();
        let mut signal = TapeSignal::new(Vec::new(), clock);
        assert!(signal.is_done());
        assert_eq!(0, signal.samples_total());
        assert_eq!((0.0, 0.0), signal.next_frame());
    }
}
