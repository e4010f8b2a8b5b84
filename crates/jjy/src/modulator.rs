//! Amplitude modulation of a continuous sine carrier.

use core::f64::consts::TAU;
use crate::{envelope::amplitude_at, BitSymbol};

/// Default carrier frequency. Its third harmonic is 40 kHz, the JJY40 frequency, and it is low
/// enough to be reproduced at common audio sample rates.
pub const DEFAULT_CARRIER_HZ: f64 = 40000. / 3.;

/// Generates one audio sample at a time from the symbol being transmitted.
///
/// The carrier phase is kept in an accumulator that advances by `carrier / rate` cycles per sample
/// and is wrapped into [0, 1). It is never reset, so only the amplitude changes between seconds.
///
/// # Examples
///
/// ```
/// # use jjy::{BitSymbol, Modulator};
/// let mut m = Modulator::new(12000., 48000);
/// // Quarter-cycle steps: 0, 1, 0, -1
/// assert_eq!(m.sample(BitSymbol::Zero, 0.0), 0.0);
/// assert!((m.sample(BitSymbol::Zero, 0.0) - 1.0).abs() < 1e-6);
/// ```
#[derive(Clone, Debug)]
pub struct Modulator {
	/// Phase increment per sample, in cycles.
	step: f64,
	/// Current phase, in cycles, ranged [0, 1).
	phase: f64
}

impl Modulator {
	/// Construct a modulator for `carrier_hz` sampled at `sample_rate` Hz, starting at phase 0.
	pub fn new(carrier_hz: f64, sample_rate: u32) -> Modulator {
		Modulator {
			step: (carrier_hz / sample_rate as f64).rem_euclid(1.0),
			phase: 0.0
		}
	}

	/// Produce the next sample for `symbol`, `elapsed` seconds into the current second.
	pub fn sample(&mut self, symbol: BitSymbol, elapsed: f64) -> f32 {
		let value = amplitude_at(symbol, elapsed) * (TAU * self.phase).sin();
		self.phase += self.step;
		if self.phase >= 1.0 {
			self.phase -= 1.0;
		}
		value as f32
	}
}
