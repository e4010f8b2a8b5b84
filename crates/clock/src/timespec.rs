//! Unix timestamps with nanosecond granularity.

use core::ops::Add;
#[cfg(feature = "now")]
use core::mem::MaybeUninit;
#[cfg(feature = "now")]
use libc::{clock_gettime, timespec, CLOCK_REALTIME};

/// Nanoseconds per second.
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
/// Nanoseconds per millisecond.
const NANOS_PER_MILLI: i64 = 1_000_000;

/// Offset in whole seconds, for use with [`TimeSpec`] arithmetic.
///
/// # Examples
///
/// ```
/// # use clock::{Seconds, TimeSpec};
/// let t = TimeSpec { sec: 1735732800, nsec: 5 };
/// assert_eq!(t + Seconds(-32400), TimeSpec { sec: 1735700400, nsec: 5 });
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(transparent)]
pub struct Seconds(pub i64);

/// Offset in milliseconds, for use with [`TimeSpec`] arithmetic.
///
/// This is the unit of the manual delta correction, so negative values are common.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(transparent)]
pub struct Milliseconds(pub i64);

/// Offset in nanoseconds, for use with [`TimeSpec`] arithmetic.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(transparent)]
pub struct Nanoseconds(pub i64);

/// Unix time with nanosecond granularity.
///
/// `nsec` is kept in `[0, 999999999]` by every operation in this module, including when adding
/// negative offsets, so `sec` is always the floor of the represented time.
///
/// # Examples
///
/// ```
/// # use clock::{Milliseconds, TimeSpec};
/// let t = TimeSpec { sec: 100, nsec: 200_000_000 };
/// assert_eq!(t + Milliseconds(-300), TimeSpec { sec: 99, nsec: 900_000_000 });
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeSpec {
	/// Seconds since the Unix epoch.
	pub sec: i64,
	/// Nanoseconds since the beginning of `sec`, ranged [0, 999999999].
	pub nsec: i64
}

impl TimeSpec {
	/// Construct a [`TimeSpec`] from possibly unnormalized parts.
	pub fn new(sec: i64, nsec: i64) -> TimeSpec {
		TimeSpec {
			sec: sec + nsec.div_euclid(NANOS_PER_SECOND),
			nsec: nsec.rem_euclid(NANOS_PER_SECOND)
		}
	}

	/// Nanoseconds remaining until the next whole second, or `0` if `self` is already on one.
	///
	/// # Examples
	///
	/// ```
	/// # use clock::TimeSpec;
	/// assert_eq!(TimeSpec { sec: 7, nsec: 250_000_000 }.nanos_to_next_second(), 750_000_000);
	/// assert_eq!(TimeSpec { sec: 7, nsec: 0 }.nanos_to_next_second(), 0);
	/// ```
	pub fn nanos_to_next_second(&self) -> i64 {
		if self.nsec == 0 { 0 } else { NANOS_PER_SECOND - self.nsec }
	}

	/// The first whole second at or after `self`.
	pub fn ceil_seconds(&self) -> i64 {
		if self.nsec == 0 { self.sec } else { self.sec + 1 }
	}
}

#[cfg(feature = "now")]
impl From<timespec> for TimeSpec {
	fn from(value: timespec) -> Self {
		TimeSpec::new(value.tv_sec as i64, value.tv_nsec as i64)
	}
}

impl Add<Seconds> for TimeSpec {
	type Output = Self;

	fn add(mut self, rhs: Seconds) -> Self::Output {
		self.sec += rhs.0;
		self
	}
}

impl Add<Nanoseconds> for TimeSpec {
	type Output = Self;

	/// Add `rhs` nanoseconds, carrying into (or borrowing from) `sec` as needed.
	fn add(self, rhs: Nanoseconds) -> Self::Output {
		TimeSpec::new(self.sec, self.nsec + rhs.0)
	}
}

impl Add<Milliseconds> for TimeSpec {
	type Output = Self;

	fn add(self, rhs: Milliseconds) -> Self::Output {
		// Split first so large deltas cannot overflow the nanosecond multiplication
		let sec = rhs.0.div_euclid(1000);
		let ms = rhs.0.rem_euclid(1000);
		self + Seconds(sec) + Nanoseconds(ms * NANOS_PER_MILLI)
	}
}

impl Add for TimeSpec {
	type Output = Self;

	fn add(self, rhs: TimeSpec) -> Self::Output {
		self + Seconds(rhs.sec) + Nanoseconds(rhs.nsec)
	}
}

/// Read the realtime clock.
///
/// Returns `None` if `clock_gettime` fails.
///
/// # Examples
///
/// ```
/// let c = clock::now().expect("Failed to get current time");
/// assert!(c.sec > 0);
/// ```
#[cfg(feature = "now")]
pub fn now() -> Option<TimeSpec> {
	let mut time = MaybeUninit::<timespec>::uninit();
	// Safety: clock_gettime only writes to `time`, and a zero return guarantees it was written.
	unsafe {
		match clock_gettime(CLOCK_REALTIME, time.as_mut_ptr()) {
			0 => Some(time.assume_init().into()),
			_ => None
		}
	}
}
