//! Reference time from an NTP server.

use clock::TimeSpec;
use jjy::{SystemClock, TimeSource, TransmitError};
use log::{info, warn};

/// Time from an SNTP query, falling back to the local clock unless `strict`.
#[derive(Debug)]
pub struct NtpClock {
	server: String,
	version: u8,
	strict: bool
}

impl NtpClock {
	pub fn new(server: String, version: u8, strict: bool) -> NtpClock {
		NtpClock { server, version, strict }
	}
}

impl TimeSource for NtpClock {
	fn now(&mut self) -> Result<TimeSpec, TransmitError> {
		match sntp::get_ntp_time(&self.server, self.version) {
			Ok(t) => {
				info!("Got time from NTP server {} (version {})", self.server, self.version);
				Ok(t)
			},
			Err(e) if self.strict => {
				Err(TransmitError::TimeUnavailable(format!("NTP server {}: {}", self.server, e)))
			},
			Err(e) => {
				warn!("Failed to get time from NTP server {}: {}; using the local clock", self.server, e);
				SystemClock.now()
			}
		}
	}
}
