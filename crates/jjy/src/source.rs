//! Reference time sources.

use clock::{Milliseconds, Seconds, TimeSpec};
use log::info;
use crate::{Config, TransmitError};

/// Something that can tell the current UTC time.
pub trait TimeSource {
	/// Get the current time as a Unix timestamp.
	///
	/// # Errors
	///
	/// Returns [`TransmitError::TimeUnavailable`] if no time can be obtained.
	fn now(&mut self) -> Result<TimeSpec, TransmitError>;
}

/// The local realtime clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
	fn now(&mut self) -> Result<TimeSpec, TransmitError> {
		clock::now().ok_or_else(|| TransmitError::TimeUnavailable(String::from("failed to read the system clock")))
	}
}

/// Get the instant to transmit: the source's time shifted by the timezone offset and delta.
///
/// The result is a Unix timestamp whose calendar fields are the local time to be broadcast.
///
/// # Errors
///
/// Propagates [`TransmitError::TimeUnavailable`] from `source`.
pub fn transmission_origin(source: &mut dyn TimeSource, config: &Config) -> Result<TimeSpec, TransmitError> {
	let reference = source.now()?;
	let origin = reference + Seconds(config.offset_seconds()) + Milliseconds(config.delta_millis);
	info!(
		"Reference time {}.{:09} UTC, offset {} h, delta {} ms",
		reference.sec, reference.nsec, config.offset_hours, config.delta_millis
	);
	Ok(origin)
}
