//! Time-aligned generation of the transmitted waveform.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clock::{TimeSpec, SECONDS_PER_MINUTE};
use log::{debug, info, warn};
use crate::{build_frame, Config, Frame, Instant, Modulator, TransmitError};

/// State of a [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
	/// Created, waiting for the first whole second.
	WaitingForBoundary,
	/// Producing samples from the current frame.
	Transmitting,
	/// A minute just ended; the frame is rebuilt before the next sample.
	RebuildFrame,
	/// Duration reached or cancelled. No more samples are produced.
	Done
}

/// Shared flag to stop a transmission from another thread.
///
/// # Examples
///
/// ```
/// # use jjy::CancelToken;
/// let token = CancelToken::new();
/// let handle = token.clone();
/// std::thread::spawn(move || handle.cancel()).join().unwrap();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	pub fn new() -> CancelToken {
		CancelToken::default()
	}

	/// Request cancellation. Takes effect at the next sample.
	pub fn cancel(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

/// Position of the transmission, counted in samples from the first whole second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransmissionClock {
	/// Timestamp (timezone offset applied) of the start of the current minute.
	minute: i64,
	/// Second within the minute, ranged [0, 59].
	second: u8,
	/// Sample within the second, ranged [0, sample rate).
	sample: u32
}

impl TransmissionClock {
	fn new(start: i64) -> TransmissionClock {
		let second = start.rem_euclid(SECONDS_PER_MINUTE);
		TransmissionClock {
			minute: start - second,
			second: second as u8,
			sample: 0
		}
	}

	/// Timestamp of the start of the current minute.
	pub fn minute_start(&self) -> i64 {
		self.minute
	}

	pub fn second(&self) -> u8 {
		self.second
	}

	pub fn sample(&self) -> u32 {
		self.sample
	}

	/// Calendar fields of the current second.
	pub fn instant(&self) -> Instant {
		Instant::from_unix(self.minute + self.second as i64)
	}

	/// Advance by one sample. Returns `true` when a new minute starts.
	fn tick(&mut self, sample_rate: u32) -> bool {
		self.sample += 1;
		if self.sample < sample_rate {
			return false;
		}
		self.sample = 0;
		self.second += 1;
		if self.second < 60 {
			return false;
		}
		self.second = 0;
		self.minute += SECONDS_PER_MINUTE;
		true
	}

	/// Jump forward `seconds` whole seconds to the start of a second. Returns `true` if the
	/// minute changed.
	fn skip(&mut self, seconds: u64) -> bool {
		let total = self.second as i64 + seconds as i64;
		let minutes = total.div_euclid(SECONDS_PER_MINUTE);
		self.second = total.rem_euclid(SECONDS_PER_MINUTE) as u8;
		self.sample = 0;
		self.minute += minutes * SECONDS_PER_MINUTE;
		minutes != 0
	}
}

/// Drives a transmission: aligns to a whole second, then produces samples on demand.
///
/// After the initial alignment all timing comes from the number of samples produced, so the
/// output stays in step with the audio device clock rather than the system clock. The frame is
/// rebuilt from the transmission clock whenever a minute ends, including when the transmission
/// starts mid-minute.
///
/// See the [crate] documentation for an example.
pub struct Scheduler {
	state: State,
	cancel: CancelToken,
	clock: TransmissionClock,
	frame: Frame,
	modulator: Modulator,
	sample_rate: u32,
	boundary_delay: Duration,
	total_samples: u64,
	produced: u64
}

impl Scheduler {
	/// Create a scheduler transmitting from `origin`, the offset reference time.
	///
	/// The first transmitted second is the first whole second at or after `origin`.
	///
	/// # Errors
	///
	/// Returns [`TransmitError::InvalidConfiguration`] if `config` does not validate.
	pub fn new(config: &Config, origin: TimeSpec, cancel: CancelToken) -> Result<Scheduler, TransmitError> {
		config.validate()?;
		let clock = TransmissionClock::new(origin.ceil_seconds());
		let frame = build_frame(&Instant::from_unix(clock.minute));
		debug!("Frame {}: {}", Instant::from_unix(clock.minute), frame);
		Ok(Scheduler {
			state: State::WaitingForBoundary,
			cancel,
			clock,
			frame,
			modulator: Modulator::new(config.carrier_hz, config.sample_rate),
			sample_rate: config.sample_rate,
			boundary_delay: Duration::from_nanos(origin.nanos_to_next_second() as u64),
			total_samples: config.total_samples(),
			produced: 0
		})
	}

	pub fn state(&self) -> State {
		self.state
	}

	/// Time from the origin to the first transmitted second.
	pub fn boundary_delay(&self) -> Duration {
		self.boundary_delay
	}

	pub fn clock(&self) -> &TransmissionClock {
		&self.clock
	}

	/// Frame of the minute being transmitted.
	pub fn frame(&self) -> &Frame {
		&self.frame
	}

	pub fn samples_produced(&self) -> u64 {
		self.produced
	}

	/// Sleep until the first whole second, then start transmitting.
	///
	/// `elapsed` is the time already spent since the origin was taken. See [`Scheduler::align`].
	pub fn wait_for_boundary(&mut self, elapsed: Duration) {
		let delay = self.align(elapsed);
		if !delay.is_zero() {
			thread::sleep(delay);
		}
	}

	/// Start transmitting, returning how long the caller must wait before the first sample.
	///
	/// `elapsed` is the time already spent since the origin was taken, e.g. opening the audio
	/// device. If it is past the first boundary, the seconds that have already gone by are skipped
	/// and the next boundary is used instead, so the first sample always starts the second it
	/// encodes. Returns zero unless the scheduler is still waiting.
	pub fn align(&mut self, elapsed: Duration) -> Duration {
		if self.state != State::WaitingForBoundary {
			return Duration::ZERO;
		}

		let delay = match elapsed.checked_sub(self.boundary_delay) {
			None => self.boundary_delay - elapsed,
			Some(late) => {
				let mut skipped = late.as_secs();
				let mut delay = Duration::ZERO;
				if late.subsec_nanos() > 0 {
					skipped += 1;
					delay = Duration::from_secs(skipped) - late;
				}
				if skipped > 0 {
					warn!("Started {:?} after the first boundary, skipping {} s", late, skipped);
					if self.clock.skip(skipped) {
						self.rebuild_frame();
					}
				}
				delay
			}
		};
		self.start();
		delay
	}

	fn start(&mut self) {
		info!("Transmitting from {} for {} samples", self.clock.instant(), self.total_samples);
		self.state = State::Transmitting;
	}

	fn rebuild_frame(&mut self) {
		let instant = Instant::from_unix(self.clock.minute);
		self.frame = build_frame(&instant);
		debug!("Frame {}: {}", instant, self.frame);
	}

	fn finish(&mut self) {
		info!("Transmission finished after {} samples", self.produced);
		self.state = State::Done;
	}

	/// Produce the next sample, or `None` once [`State::Done`].
	///
	/// Pulling a sample while still waiting starts the transmission immediately.
	pub fn next_sample(&mut self) -> Option<f32> {
		match self.state {
			State::Done => return None,
			State::WaitingForBoundary => self.start(),
			State::RebuildFrame => {
				self.rebuild_frame();
				self.state = State::Transmitting;
			},
			State::Transmitting => ()
		}

		if self.cancel.is_cancelled() {
			info!("Transmission cancelled");
			self.finish();
			return None;
		}

		let symbol = self.frame[self.clock.second as usize];
		let elapsed = self.clock.sample as f64 / self.sample_rate as f64;
		let value = self.modulator.sample(symbol, elapsed);
		self.produced += 1;

		if self.clock.tick(self.sample_rate) {
			self.state = State::RebuildFrame;
		}
		if self.produced >= self.total_samples {
			self.finish();
		}
		Some(value)
	}

	/// Fill `buf` with samples, returning how many were written.
	///
	/// Fewer than `buf.len()` are written only once the transmission is done; the rest of `buf` is
	/// left untouched.
	pub fn fill(&mut self, buf: &mut [f32]) -> usize {
		let mut n = 0;
		for slot in buf.iter_mut() {
			match self.next_sample() {
				Some(v) => *slot = v,
				None => break
			}
			n += 1;
		}
		n
	}
}
