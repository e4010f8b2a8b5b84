//! Calendar fields of a transmitted minute.

use core::fmt;
use clock::Tm;

/// The calendar fields JJY encodes, in the transmitted (already offset) timezone.
///
/// # Examples
///
/// ```
/// # use jjy::Instant;
/// // Sat, Dec 31 2016. 23:59:00 (leap year)
/// let i = Instant::from_unix(1483228740);
/// assert_eq!(i, Instant { year: 2016, yday: 366, hour: 23, minute: 59, second: 0, weekday: 6 });
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instant {
	/// Absolute Gregorian year. Only the last two digits are transmitted.
	pub year: i32,
	/// Day of the year, ranged [1, 366]
	pub yday: u16,
	/// Hour, ranged [0, 23]
	pub hour: u8,
	/// Minute, ranged [0, 59]
	pub minute: u8,
	/// Second, ranged [0, 59]
	pub second: u8,
	/// Day of the week, ranged [0, 6] => [Sunday, Saturday]
	pub weekday: u8
}

impl Instant {
	/// Convert a Unix timestamp that already includes the timezone offset.
	pub fn from_unix(sec: i64) -> Instant {
		Tm::new(sec).into()
	}
}

impl From<Tm> for Instant {
	fn from(tm: Tm) -> Self {
		Instant {
			year: tm.year,
			yday: tm.yday,
			hour: tm.hour,
			minute: tm.min,
			second: tm.sec,
			weekday: tm.wday
		}
	}
}

impl fmt::Display for Instant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
		write!(
			f,
			"{:04}/{:03} {} {:02}:{:02}:{:02}",
			self.year, self.yday, DAYS[(self.weekday % 7) as usize], self.hour, self.minute, self.second
		)
	}
}
