//! Amplitude envelope of each symbol.
//!
//! JJY encodes symbols by how long the carrier stays at full power after the start of the second.
//! The carrier then drops to 10% for the rest of the second; it is never switched off.
//!
//! | Symbol            | Full power | Reduced power |
//! | ----------------- | ---------- | ------------- |
//! | [`BitSymbol::Marker`] | 0.2 s  | 0.8 s         |
//! | [`BitSymbol::One`]    | 0.5 s  | 0.5 s         |
//! | [`BitSymbol::Zero`]   | 0.8 s  | 0.2 s         |
//!
//! Receivers synchronize on the rising edge at the start of every second, so the step in
//! amplitude is intended. Only the envelope steps; the carrier underneath stays continuous (see
//! [`crate::Modulator`]).

use crate::BitSymbol;

/// Amplitude of the carrier at full power.
pub const FULL_AMPLITUDE: f64 = 1.0;
/// Amplitude of the carrier at reduced power.
pub const LOW_AMPLITUDE: f64 = 0.1;

impl BitSymbol {
	/// Seconds of full power at the start of the second for this symbol.
	pub fn full_power_duration(self) -> f64 {
		match self {
			BitSymbol::Marker => 0.2,
			BitSymbol::One => 0.5,
			BitSymbol::Zero => 0.8
		}
	}
}

/// Amplitude, in [0, 1], of `symbol` at `elapsed` seconds into its second.
///
/// # Examples
///
/// ```
/// # use jjy::{envelope::amplitude_at, BitSymbol};
/// assert_eq!(amplitude_at(BitSymbol::One, 0.499), 1.0);
/// assert_eq!(amplitude_at(BitSymbol::One, 0.5), 0.1);
/// ```
pub fn amplitude_at(symbol: BitSymbol, elapsed: f64) -> f64 {
	if elapsed < symbol.full_power_duration() {
		FULL_AMPLITUDE
	} else {
		LOW_AMPLITUDE
	}
}
