/*
    Copyright (C) 2020-2024  Rafal Michalski

    This file is part of RKTAPE, a Rust tool for loading software into Radio-86RK computers.

    For the full copyright notice, see the lib.rs file.
*/
//! Command line options.
use std::path::PathBuf;

use clap::{App, Arg, ArgMatches, crate_authors, crate_version};

use rktape::formats::rk::{EncodingParams, FormatMode, MAX_SOURCE_SIZE, SAMPLE_RATE};

/// Parsed command line options.
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    pub source: PathBuf,
    pub wav: Option<PathBuf>,
    pub params: EncodingParams,
}

/// Returns the command line options table.
pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("rktape")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Plays binary files as Radio-86RK tape signals")
        .arg(Arg::with_name("binary")
            .short("b")
            .long("binary")
            .help("Treats FILE as raw machine code and adds the loader header"))
        .arg(Arg::with_name("address")
            .short("a")
            .long("address")
            .value_name("LOADADDR")
            .takes_value(true)
            .requires("binary")
            .validator(|s| parse_address(&s).map(drop))
            .help("Load address in binary mode, decimal or hexadecimal with 0x or $ [default: 0]"))
        .arg(Arg::with_name("rate")
            .short("r")
            .long("rate")
            .value_name("BAUDRATE")
            .takes_value(true)
            .validator(|s| parse_baud_rate(&s).map(drop))
            .help("Tape speed in bits per second [default: 1300]"))
        .arg(Arg::with_name("wav")
            .short("w")
            .long("wav")
            .value_name("WAVFILE")
            .takes_value(true)
            .help("Writes the signal to a WAV file instead of playing it"))
        .arg(Arg::with_name("FILE")
            .required(true)
            .index(1)
            .help("The file to be loaded"))
}

/// Parses a 16-bit address given as a decimal or a hexadecimal number with `0x` or `$` prefix.
pub fn parse_address(s: &str) -> Result<u16, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).or_else(|| s.strip_prefix('$')) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse()
    };
    match parsed {
        Ok(address) if usize::from(address) <= MAX_SOURCE_SIZE => Ok(address),
        _ => Err(format!("Load address must be between 0 and {:#06x}", MAX_SOURCE_SIZE))
    }
}

/// Parses the tape speed.
pub fn parse_baud_rate(s: &str) -> Result<u32, String> {
    let max = SAMPLE_RATE / 2;
    match s.trim().parse() {
        Ok(rate) if (1..=max).contains(&rate) => Ok(rate),
        _ => Err(format!("Baud rate must be between 1 and {}", max))
    }
}

impl Options {
    /// Parses the process arguments, printing usage and exiting on errors.
    pub fn from_args() -> Self {
        let matches = app().get_matches();
        Self::from_matches(&matches).unwrap_or_else(|msg| {
            clap::Error::with_description(&msg, clap::ErrorKind::InvalidValue).exit()
        })
    }

    /// Converts the matched arguments into options.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, String> {
        let mut params = EncodingParams::default();
        if matches.is_present("binary") {
            params.format = FormatMode::BinaryLoader;
        }
        if let Some(address) = matches.value_of("address") {
            params.load_address = parse_address(address)?;
        }
        if let Some(rate) = matches.value_of("rate") {
            params.baud_rate = parse_baud_rate(rate)?;
        }
        let source = matches.value_of_os("FILE").map(PathBuf::from)
                     .ok_or_else(|| "missing FILE argument".to_string())?;
        let wav = matches.value_of_os("wav").map(PathBuf::from);
        Ok(Options { source, wav, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rktape::formats::rk::DEFAULT_BAUD_RATE;

    fn parse(args: &[&str]) -> Result<Options, clap::Error> {
        let matches = app().get_matches_from_safe(
            Some("rktape").into_iter().chain(args.iter().copied()))?;
        Ok(Options::from_matches(&matches).unwrap())
    }

    #[test]
    fn parse_address_works() {
        assert_eq!(Ok(0), parse_address("0"));
        assert_eq!(Ok(256), parse_address("256"));
        assert_eq!(Ok(0x100), parse_address("0x100"));
        assert_eq!(Ok(0x7600), parse_address("0X7600"));
        assert_eq!(Ok(0x1A0), parse_address("$1a0"));
        assert!(parse_address("0x7601").is_err());
        assert!(parse_address("65536").is_err());
        assert!(parse_address("-1").is_err());
        assert!(parse_address("0x").is_err());
        assert!(parse_address("zero").is_err());
    }

    #[test]
    fn parse_baud_rate_works() {
        assert_eq!(Ok(1), parse_baud_rate("1"));
        assert_eq!(Ok(1300), parse_baud_rate("1300"));
        assert_eq!(Ok(24000), parse_baud_rate("24000"));
        assert!(parse_baud_rate("24001").is_err());
        assert!(parse_baud_rate("0").is_err());
        assert!(parse_baud_rate("").is_err());
    }

    #[test]
    fn options_works() {
        let options = parse(&["game.rk"]).unwrap();
        assert_eq!(PathBuf::from("game.rk"), options.source);
        assert_eq!(None, options.wav);
        assert_eq!(EncodingParams::default(), options.params);
        assert_eq!(DEFAULT_BAUD_RATE, options.params.baud_rate);

        let options = parse(&["-b", "-a", "0x100", "-r", "2400", "-w", "out.wav", "game.bin"]).unwrap();
        assert_eq!(PathBuf::from("game.bin"), options.source);
        assert_eq!(Some(PathBuf::from("out.wav")), options.wav);
        assert_eq!(FormatMode::BinaryLoader, options.params.format);
        assert_eq!(0x100, options.params.load_address);
        assert_eq!(2400, options.params.baud_rate);

        let options = parse(&["-b", "game.bin"]).unwrap();
        assert_eq!(FormatMode::BinaryLoader, options.params.format);
        assert_eq!(0, options.params.load_address);
    }

    #[test]
    fn options_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["-a", "0x100", "game.bin"]).is_err());
        assert!(parse(&["-r", "0", "game.rk"]).is_err());
        assert!(parse(&["-r", "24001", "game.rk"]).is_err());
        assert!(parse(&["-b", "-a", "0x8000", "game.bin"]).is_err());
        assert!(parse(&["-x", "game.rk"]).is_err());
    }
}
