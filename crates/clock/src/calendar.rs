//! Gregorian calendar conversion for Unix timestamps.
//!
//! Conversion is total: timestamps before the Unix epoch map onto the proleptic Gregorian
//! calendar. The day-number algorithm rotates the year to start in March so that the leap day is
//! the last day of the rotated year, then works in 400-year eras. See
//! <http://howardhinnant.github.io/date_algorithms.html#civil_from_days>.

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: i64 = 60;
/// Seconds per hour.
pub const SECONDS_PER_HOUR: i64 = SECONDS_PER_MINUTE * 60;
/// Seconds per day.
pub const SECONDS_PER_DAY: i64 = SECONDS_PER_HOUR * 24;
/// Days per 400-year era.
const DAYS_PER_ERA: i64 = 146097;
/// Days from March 1, 0000 to January 1, 1970.
const DAYS_FROM_MARCH_0000_TO_EPOCH: i64 = 719468;
/// Days in the months before each month of a non-leap year.
const DAYS_BEFORE_MONTH: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Check whether `year` (absolute Gregorian year, e.g. 2024) is a leap year.
///
/// # Examples
///
/// ```
/// # use clock::isleapyear;
/// assert!(!isleapyear(1900));
/// assert!(isleapyear(2000));
/// assert!(isleapyear(2024));
/// assert!(!isleapyear(2025));
/// ```
#[inline(always)]
pub fn isleapyear(year: i32) -> bool {
	(year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Gregorian calendar date and time of day, without timezone.
///
/// # Examples
///
/// ```
/// # use clock::Tm;
/// let date = Tm::new(1718617807);
/// assert_eq!(date, Tm {
/// 	sec: 7,
/// 	min: 50,
/// 	hour: 9,
/// 	day: 17,
/// 	mon: 6,
/// 	year: 2024,
/// 	wday: 1,
/// 	yday: 169
/// });
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tm {
	/// Seconds, ranged [0, 59]
	pub sec: u8,
	/// Minutes, ranged [0, 59]
	pub min: u8,
	/// Hours, ranged [0, 23]
	pub hour: u8,
	/// Day of the month, ranged [1, 31]
	pub day: u8,
	/// Month of the year, ranged [1, 12]
	pub mon: u8,
	/// Absolute Gregorian year
	pub year: i32,
	/// Day of the week, ranged [0, 6] => [Sunday, Saturday]
	pub wday: u8,
	/// Day of the year, ranged [1, 366]
	pub yday: u16
}

impl Tm {
	/// Convert a Unix timestamp into calendar fields.
	pub fn new(unixtimestamp: i64) -> Tm {
		let days = unixtimestamp.div_euclid(SECONDS_PER_DAY);
		let rem = unixtimestamp.rem_euclid(SECONDS_PER_DAY);
		let (year, mon, day) = civil_from_days(days);
		let leapday = if mon > 2 && isleapyear(year) { 1 } else { 0 };

		Tm {
			sec: (rem % SECONDS_PER_MINUTE) as u8,
			min: ((rem % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE) as u8,
			hour: (rem / SECONDS_PER_HOUR) as u8,
			day,
			mon,
			year,
			wday: (days + 4).rem_euclid(7) as u8, // Jan 1, 1970 was a Thursday
			yday: DAYS_BEFORE_MONTH[(mon - 1) as usize] + day as u16 + leapday
		}
	}

	/// Check whether the year of `self` is a leap year.
	#[inline(always)]
	pub fn isleapyear(&self) -> bool {
		isleapyear(self.year)
	}
}

/// Convert days since the Unix epoch into `(year, month, day)`.
fn civil_from_days(days: i64) -> (i32, u8, u8) {
	let z = days + DAYS_FROM_MARCH_0000_TO_EPOCH;
	let era = z.div_euclid(DAYS_PER_ERA);
	let doe = z.rem_euclid(DAYS_PER_ERA);
	let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
	let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
	// Month and day within the March-based year
	let mp = (5 * doy + 2) / 153;
	let day = doy - (153 * mp + 2) / 5 + 1;
	let mon = if mp < 10 { mp + 3 } else { mp - 9 };
	let year = yoe + era * 400 + if mon <= 2 { 1 } else { 0 };
	(year as i32, mon as u8, day as u8)
}
