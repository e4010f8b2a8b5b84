//! Set radio-controlled clocks by emulating the JJY40 time signal with simple audio output.
//!
//! Japan's [JJY] longwave stations broadcast the time on 40 kHz and 60 kHz. This application
//! renders the same time code as audio and plays it on the default output device. Audio hardware
//! radiates stray RF at the harmonics of its output as a side effect of its operation, and the
//! default 13.333 kHz carrier has its third harmonic at exactly 40 kHz. A JJY clock or watch held
//! next to the speaker or headphone cable picks it up -- the audible output itself is not useful.
//!
//! # Command Line Arguments
//!
//! General form: `jjysync [options...]`
//!
//! | Short form | Long form       | Argument       | Default  | Description                              |
//! | ---------- | --------------- | -------------- | -------- | ---------------------------------------- |
//! | `-t`       | `--duration`    | Integer > 0    | 30       | Transmission length in minutes           |
//! | `-d`       | `--delta`       | Integer        | 0        | Correction in milliseconds               |
//! | `-o`       | `--tz-offset`   | -24 < x < 24   | 9        | Offset of the transmitted time from UTC  |
//! | `-r`       | `--sample-rate` | Integer > 0    | 48000    | Output sample rate in Hz                 |
//! | `-f`       | `--carrier`     | 0 < x < rate/2 | 13333.33 | Carrier frequency in Hz                  |
//! | `-s`       | `--ntp-server`  | Hostname or IP | None     | Use [NTP] to determine the time          |
//! | `-n`       | `--ntp-version` | 1-4            | 4        | NTP protocol version                     |
//! |            | `--strict-ntp`  |                |          | Fail rather than fall back to local time |
//! | `-v`       | `--verbose`     |                |          | More logging, repeat for more            |
//!
//! Transmission starts on the next whole second. `--delta` shifts the transmitted time, which is
//! useful to cancel out audio output latency. If the NTP server cannot be reached the local clock
//! is used with a warning, unless `--strict-ntp` is given. `RUST_LOG` overrides the log level.
//!
//! Ctrl-C stops the transmission early; this is not treated as an error.
//!
//! [JJY]: https://en.wikipedia.org/wiki/JJY
//! [NTP]: sntp
//!
//! # Examples
//!
//! Transmit Japan standard time from the local clock for 30 minutes
//! ```sh
//! jjysync
//! ```
//!
//! Transmit for 10 minutes using NICT's NTP server, 150 ms early
//! ```sh
//! jjysync -t 10 -d 150 -s ntp.nict.jp
//! ```

use std::process::ExitCode;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Sample;
use log::{error, info, warn};

use args::Arguments;
use jjy::{transmission_origin, CancelToken, Scheduler, State, SystemClock, TimeSource, TransmitError};
use source::NtpClock;

mod args;
mod source;

/// Audio buffer size in frames.
const BUFFER_SIZE: u32 = 1024;

/// How a transmission ended.
#[derive(Clone, Debug, PartialEq)]
enum Outcome {
	/// Every sample was played.
	Completed,
	/// Stopped early with Ctrl-C.
	Interrupted,
	/// The audio stream reported an error.
	Failed(String)
}

impl Outcome {
	/// Treat [`Outcome::Failed`] as a [`TransmitError::SinkError`].
	fn into_result(self) -> Result<Outcome, TransmitError> {
		match self {
			Outcome::Failed(e) => Err(TransmitError::SinkError(e)),
			outcome => Ok(outcome)
		}
	}
}

/// Simple multi-threaded flag using a condition variable, carrying the [`Outcome`].
///
/// Only the first [`Flagger::notify`] counts. After that, all calls to [`Flagger::wait`] return
/// its outcome immediately.
struct Flagger {
	/// Mutex containing the outcome. `None` means continue waiting.
	mutex: Mutex<Option<Outcome>>,
	/// Condition variable to manage wait/notify.
	cond: Condvar
}

impl Flagger {
	/// Create a new [`Flagger`] ready to be [`wait`](Flagger::wait)ed on.
	fn new() -> Arc<Flagger> {
		Arc::new(Flagger {
			mutex: Mutex::new(None),
			cond: Condvar::new()
		})
	}

	/// Block until another thread calls [`Flagger::notify`], then return the outcome it gave.
	fn wait(&self) -> Outcome {
		let guard = self.mutex.lock().unwrap_or_else(PoisonError::into_inner);
		let outcome = self.cond
			.wait_while(guard, |outcome| outcome.is_none())
			.unwrap_or_else(PoisonError::into_inner);
		outcome.clone().unwrap_or(Outcome::Completed)
	}

	/// Record `outcome`, unless one was already recorded, and unblock waiting threads.
	fn notify(&self, outcome: Outcome) {
		let mut flag = self.mutex.lock().unwrap_or_else(PoisonError::into_inner);
		if flag.is_none() {
			*flag = Some(outcome);
		}
		self.cond.notify_all();
	}
}

/// Current state of the writer.
#[derive(Clone, Copy, Debug, PartialEq)]
enum WriterState {
	/// Waiting for the first callback to align the scheduler to a whole second.
	Waiting,
	/// Writing [`f32::EQUILIBRIUM`] until the first boundary. The payload is the number of samples
	/// left to pad.
	Padding(u64),
	/// Writing the scheduler's samples.
	Running,
	/// Done and completion signalled. Write [`f32::EQUILIBRIUM`].
	Finished
}

/// Fills audio buffers from a [`Scheduler`].
///
/// The stream is started before the first boundary. On the first callback the scheduler is
/// aligned using the time since the reference time was fetched, and the wait until the boundary is
/// written as silence, so opening and starting the device does not delay the signal. Once the
/// scheduler is done the rest of the buffer is padded with [`f32::EQUILIBRIUM`], and completion is
/// signalled on the following callback so the final buffer is played out.
struct Writer {
	scheduler: Scheduler,
	flagger: Arc<Flagger>,
	/// When the reference time was fetched.
	fetched: std::time::Instant,
	sample_rate: u32,
	state: WriterState
}

impl Writer {
	fn new(scheduler: Scheduler, flagger: Arc<Flagger>, fetched: std::time::Instant, sample_rate: u32) -> Writer {
		Writer { scheduler, flagger, fetched, sample_rate, state: WriterState::Waiting }
	}

	/// Write the next buffer of audio.
	fn write(&mut self, data: &mut [f32]) {
		match self.state {
			WriterState::Waiting => {
				let delay = self.scheduler.align(self.fetched.elapsed());
				self.state = WriterState::Padding(delay_samples(delay, self.sample_rate));
			},
			WriterState::Running if self.scheduler.state() == State::Done => {
				self.flagger.notify(Outcome::Completed);
				self.state = WriterState::Finished;
			},
			_ => ()
		}

		let mut i = 0;
		if let WriterState::Padding(n) = self.state {
			i = n.min(data.len() as u64) as usize;
			data[..i].iter_mut().for_each(|v| *v = f32::EQUILIBRIUM);
			self.state = if i as u64 == n { WriterState::Running } else { WriterState::Padding(n - i as u64) };
		}

		if let WriterState::Running = self.state {
			i += self.scheduler.fill(&mut data[i..]);
		}
		data.iter_mut().skip(i).for_each(|v| *v = f32::EQUILIBRIUM);
	}
}

/// Convert `delay` to a whole number of samples at `sample_rate`, rounding down.
fn delay_samples(delay: Duration, sample_rate: u32) -> u64 {
	(delay.as_nanos() * sample_rate as u128 / 1_000_000_000) as u64
}

/// Make the audio callback that pulls samples through `writer`.
fn make_writer(mut writer: Writer) -> impl FnMut(&mut [f32], &cpal::OutputCallbackInfo) + Send + 'static {
	move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| writer.write(data)
}

/// Make the error callback for the audio stream, which ends the transmission as failed.
fn make_error_handler(flagger: Arc<Flagger>) -> impl FnMut(cpal::StreamError) + Send + 'static {
	move |e: cpal::StreamError| {
		error!("Error occurred on the audio stream: {}", e);
		flagger.notify(Outcome::Failed(e.to_string()));
	}
}

/// Transmit the time signal over the default audio output device, blocking until complete.
///
/// # Errors
///
/// - [`TransmitError::InvalidConfiguration`] for out-of-range arguments.
/// - [`TransmitError::TimeUnavailable`] if the reference time cannot be read.
/// - [`TransmitError::SinkError`] if the audio device cannot be opened or fails while playing.
fn play(args: &Arguments) -> Result<Outcome> {
	let config = args.to_config();
	config.validate()?;

	// Get the reference time
	let mut source: Box<dyn TimeSource> = match &args.ntp_server {
		Some(server) => Box::new(NtpClock::new(server.clone(), args.ntp_version, args.strict_ntp)),
		None => Box::new(SystemClock)
	};
	let origin = transmission_origin(source.as_mut(), &config)
		.context("Failed to get the reference time")?;
	let fetched = std::time::Instant::now();

	let cancel = CancelToken::new();
	let scheduler = Scheduler::new(&config, origin, cancel.clone())?;
	let flagger = Flagger::new();
	{
		let flagger = flagger.clone();
		ctrlc::set_handler(move || {
			warn!("Interrupted, stopping transmission");
			cancel.cancel();
			flagger.notify(Outcome::Interrupted);
		}).context("Failed to set the Ctrl-C handler")?;
	}

	// Set up output device
	let host = cpal::default_host();
	let device = host.default_output_device()
		.ok_or_else(|| TransmitError::sink("no default audio output device"))?;
	let stream_config = cpal::StreamConfig {
		channels: 1,
		sample_rate: cpal::SampleRate(config.sample_rate),
		buffer_size: cpal::BufferSize::Fixed(BUFFER_SIZE)
	};
	info!(
		"Output on {} at {} Hz, carrier {:.2} Hz",
		device.name().unwrap_or_else(|_| String::from("unknown device")),
		config.sample_rate,
		config.carrier_hz
	);

	let stream = device.build_output_stream(
					&stream_config,
					make_writer(Writer::new(scheduler, flagger.clone(), fetched, config.sample_rate)),
					make_error_handler(flagger.clone()),
					None)
		.map_err(TransmitError::sink)?;
	stream.play().map_err(TransmitError::sink)?;

	// Wait for audio to complete
	Ok(flagger.wait().into_result()?)
}

/// Main program entry point.
///
/// Parses input arguments and plays time signal audio output. See [`crate`] documentation for
/// details.
fn main() -> ExitCode {
	let args = Arguments::parse();

	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level().to_string()))
		.format_timestamp_millis()
		.init();

	match play(&args) {
		Ok(Outcome::Interrupted) => {
			info!("Transmission stopped");
			ExitCode::SUCCESS
		},
		Ok(_) => {
			info!("Transmission complete");
			ExitCode::SUCCESS
		},
		Err(e) => {
			error!("{:#}", e);
			ExitCode::FAILURE
		}
	}
}
