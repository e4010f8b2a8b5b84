//! Error types for transmission.
//!
//! Every failure originates at a boundary of the transmitter (time source, audio sink, or
//! configuration). Frame building, the envelope, and the modulator cannot fail.

use thiserror::Error;

/// The error type for setting up and running a transmission.
#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq))]
pub enum TransmitError {
	/// No reference time could be obtained. The payload describes which source failed and why.
	#[error("Reference time unavailable: {0}")]
	TimeUnavailable(String),
	/// The audio device or stream failed. The payload is the underlying device error.
	#[error("Audio sink error: {0}")]
	SinkError(String),
	/// A configuration value is out of range. The payload names the value.
	#[error("Invalid configuration: {0}")]
	InvalidConfiguration(String)
}

impl TransmitError {
	/// Wrap any displayable audio error as [`TransmitError::SinkError`].
	pub fn sink(error: impl std::fmt::Display) -> TransmitError {
		TransmitError::SinkError(error.to_string())
	}
}
