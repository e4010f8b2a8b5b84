//! Support for command line argument parsing.
//!
//! See [crate] documentation for details on command line arguments and examples.

use clap::{ArgAction, Parser};
use jjy::{modulator::DEFAULT_CARRIER_HZ, Config};
use log::LevelFilter;

/// Parsed command line arguments.
///
/// Values are only checked for type and basic range here; [`Config::validate`] checks the rest
/// once the arguments are combined into a [`Config`].
#[derive(Debug, Parser)]
#[cfg_attr(test, derive(PartialEq))]
#[command(
	name = "jjysync",
	version,
	about = "Set JJY radio-controlled clocks by emulating the JJY40 time signal with audio output.",
	after_help = "\
Examples:
  jjysync
  jjysync -t 10 -s ntp.nict.jp
  jjysync -d -150 -v
  jjysync -o 0 -r 44100"
)]
pub struct Arguments {
	/// Transmission length in minutes
	#[arg(short = 't', long = "duration", default_value_t = 30,
		value_parser = clap::value_parser!(u32).range(1..))]
	pub duration: u32,

	/// Correction added to the reference time in milliseconds, e.g. to offset audio latency
	#[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
	pub delta: i64,

	/// Offset of the transmitted time from UTC in hours
	#[arg(short = 'o', long, default_value_t = 9.0, allow_negative_numbers = true)]
	pub tz_offset: f64,

	/// Output sample rate in Hz
	#[arg(short = 'r', long, default_value_t = 48000)]
	pub sample_rate: u32,

	/// Carrier frequency in Hz, below half the sample rate
	#[arg(short = 'f', long, default_value_t = DEFAULT_CARRIER_HZ)]
	pub carrier: f64,

	/// NTP server to take the time from instead of the local clock
	#[arg(short = 's', long)]
	pub ntp_server: Option<String>,

	/// NTP protocol version
	#[arg(short = 'n', long, default_value_t = 4,
		value_parser = clap::value_parser!(u8).range(1..=4))]
	pub ntp_version: u8,

	/// Fail instead of falling back to the local clock if the NTP server cannot be reached
	#[arg(long)]
	pub strict_ntp: bool,

	/// Log more detail, repeat for more
	#[arg(short, long, action = ArgAction::Count)]
	pub verbose: u8
}

impl Arguments {
	/// Transmission parameters given by these arguments.
	pub fn to_config(&self) -> Config {
		Config {
			duration_minutes: self.duration,
			delta_millis: self.delta,
			offset_hours: self.tz_offset,
			sample_rate: self.sample_rate,
			carrier_hz: self.carrier
		}
	}

	/// Default log level, which `RUST_LOG` can still override.
	pub fn log_level(&self) -> LevelFilter {
		match self.verbose {
			0 => LevelFilter::Info,
			1 => LevelFilter::Debug,
			_ => LevelFilter::Trace
		}
	}
}
