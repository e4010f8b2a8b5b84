//! Transmission parameters.

use crate::{modulator::DEFAULT_CARRIER_HZ, TransmitError};

/// Parameters of a transmission.
///
/// Construct with struct update syntax over [`Config::default`] and check with
/// [`Config::validate`]. [`crate::Scheduler::new`] validates before doing anything else.
///
/// # Examples
///
/// ```
/// # use jjy::Config;
/// let config = Config { duration_minutes: 5, offset_hours: 7.0, ..Config::default() };
/// assert!(config.validate().is_ok());
/// assert_eq!(config.offset_seconds(), 25200);
/// assert_eq!(config.total_samples(), 5 * 60 * 48000);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
	/// Length of the transmission in minutes, > 0.
	pub duration_minutes: u32,
	/// Manual correction added to the reference time, in milliseconds. Typically used to
	/// compensate for audio output latency.
	pub delta_millis: i64,
	/// Offset of the transmitted time from UTC, in hours, within (-24, 24). JST is 9.
	pub offset_hours: f64,
	/// Output sample rate in Hz, > 0.
	pub sample_rate: u32,
	/// Carrier frequency in Hz, below half the sample rate.
	pub carrier_hz: f64
}

impl Default for Config {
	fn default() -> Self {
		Config {
			duration_minutes: 30,
			delta_millis: 0,
			offset_hours: 9.0,
			sample_rate: 48000,
			carrier_hz: DEFAULT_CARRIER_HZ
		}
	}
}

impl Config {
	/// Check every parameter is in range.
	///
	/// # Errors
	///
	/// Returns [`TransmitError::InvalidConfiguration`] naming the first offending parameter.
	pub fn validate(&self) -> Result<(), TransmitError> {
		let invalid = |s: String| Err(TransmitError::InvalidConfiguration(s));
		if self.duration_minutes == 0 {
			return invalid(String::from("duration must be at least one minute"));
		}
		if self.sample_rate == 0 {
			return invalid(String::from("sample rate must be positive"));
		}
		if !self.offset_hours.is_finite() || self.offset_hours.abs() >= 24.0 {
			return invalid(format!("timezone offset {} h is outside (-24, 24)", self.offset_hours));
		}
		let nyquist = self.sample_rate as f64 / 2.0;
		if !self.carrier_hz.is_finite() || self.carrier_hz <= 0.0 || self.carrier_hz >= nyquist {
			return invalid(format!(
				"carrier {} Hz must be positive and below {} Hz at {} Hz sampling",
				self.carrier_hz, nyquist, self.sample_rate
			));
		}
		if self.checked_total_samples().is_none() {
			return invalid(format!(
				"{} minutes at {} Hz is too many samples",
				self.duration_minutes, self.sample_rate
			));
		}
		Ok(())
	}

	/// Timezone offset rounded to whole seconds.
	pub fn offset_seconds(&self) -> i64 {
		(self.offset_hours * 3600.0).round() as i64
	}

	/// Number of samples in the whole transmission, saturating if it does not validate.
	pub fn total_samples(&self) -> u64 {
		self.checked_total_samples().unwrap_or(u64::MAX)
	}

	fn checked_total_samples(&self) -> Option<u64> {
		(self.duration_minutes as u64)
			.checked_mul(60)?
			.checked_mul(self.sample_rate as u64)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_test() {
		let c = Config::default();
		assert_eq!(c.validate(), Ok(()));
		assert_eq!(c.offset_seconds(), 32400);
		assert_eq!(c.total_samples(), 30 * 60 * 48000);
	}

	#[test]
	fn offset_test() {
		let c = Config { offset_hours: 5.5, ..Config::default() };
		assert_eq!(c.offset_seconds(), 19800);
		let c = Config { offset_hours: -3.5, ..Config::default() };
		assert_eq!(c.offset_seconds(), -12600);
		assert!(c.validate().is_ok());
	}

	#[test]
	fn validate_test() {
		let invalid = |c: Config| matches!(c.validate(), Err(TransmitError::InvalidConfiguration(_)));
		assert!(invalid(Config { duration_minutes: 0, ..Config::default() }));
		assert!(invalid(Config { sample_rate: 0, ..Config::default() }));
		assert!(invalid(Config { offset_hours: 24.0, ..Config::default() }));
		assert!(invalid(Config { offset_hours: -30.0, ..Config::default() }));
		assert!(invalid(Config { offset_hours: f64::NAN, ..Config::default() }));
		assert!(invalid(Config { carrier_hz: 0.0, ..Config::default() }));
		assert!(invalid(Config { carrier_hz: -100.0, ..Config::default() }));
		assert!(invalid(Config { carrier_hz: 24000.0, ..Config::default() }));
		assert!(invalid(Config { sample_rate: 22050, ..Config::default() }));
		assert!(!invalid(Config { sample_rate: 44100, ..Config::default() }));
		assert!(!invalid(Config { sample_rate: 1000, carrier_hz: 250.0, ..Config::default() }));
	}

	#[test]
	fn sample_count_overflow_test() {
		let c = Config { duration_minutes: u32::MAX, sample_rate: u32::MAX, carrier_hz: 1000.0, ..Config::default() };
		assert!(matches!(c.validate(), Err(TransmitError::InvalidConfiguration(_))));
		assert_eq!(c.total_samples(), u64::MAX);

		// Largest duration at 48 kHz still fits
		let c = Config { duration_minutes: u32::MAX, ..Config::default() };
		assert!(c.validate().is_ok());
		assert_eq!(c.total_samples(), u32::MAX as u64 * 60 * 48000);
	}
}
