//! The JJY time code frame.
//!
//! See [JJY documentation](https://www.nict.go.jp/en/sts/jjy_signal.html) for the authoritative
//! layout. Each minute is sent as 60 symbols, one per second, starting with the reference marker
//! at second 0:
//!
//! | Seconds | Content                               |
//! | ------- | ------------------------------------- |
//! | 0       | Marker (M)                            |
//! | 1-8     | Minute BCD: 40 20 10 _ 8 4 2 1        |
//! | 9       | Marker (P1)                           |
//! | 12-18   | Hour BCD: 20 10 _ 8 4 2 1             |
//! | 19      | Marker (P2)                           |
//! | 22-28   | Day of year BCD: 200 100 _ 80 40 20 10 |
//! | 29      | Marker (P3)                           |
//! | 30-33   | Day of year BCD: 8 4 2 1              |
//! | 36      | PA1, even parity of the hour bits     |
//! | 37      | PA2, even parity of the minute bits   |
//! | 39      | Marker (P4)                           |
//! | 41-48   | Year BCD: 80 40 20 10 8 4 2 1         |
//! | 49      | Marker (P5)                           |
//! | 50-52   | Day of week: 4 2 1 (Sunday = 0)       |
//! | 59      | Marker (P0)                           |
//!
//! Every other second is a zero. That includes the summer time bits (38, 40), which Japan does
//! not use, and the leap second warnings (LS1, LS2 at 53, 54), which this transmitter never sets.
//! The call sign minutes (15 and 45) are transmitted like every other minute.

use core::fmt;
use core::ops::Index;
use crate::Instant;

/// Number of symbols (seconds) in a frame.
pub const FRAME_LEN: usize = 60;

/// Seconds that always carry a [`BitSymbol::Marker`].
pub const MARKER_POSITIONS: [usize; 7] = [0, 9, 19, 29, 39, 49, 59];

/// One second of the time code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitSymbol {
	/// Position marker.
	Marker,
	/// Binary 1.
	One,
	/// Binary 0.
	Zero
}

impl BitSymbol {
	/// Character used for this symbol when a [`Frame`] is displayed.
	pub fn as_char(self) -> char {
		match self {
			BitSymbol::Marker => 'M',
			BitSymbol::One => '1',
			BitSymbol::Zero => '0'
		}
	}
}

/// A full minute of the time code, indexed by second.
///
/// Displays as 60 characters, e.g. `M0001011M...`, which is handy in logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame([BitSymbol; FRAME_LEN]);

impl Frame {
	/// All symbols, in transmission order.
	pub fn symbols(&self) -> &[BitSymbol; FRAME_LEN] {
		&self.0
	}

	/// Iterate over the symbols in transmission order.
	pub fn iter(&self) -> impl Iterator<Item = BitSymbol> + '_ {
		self.0.iter().copied()
	}
}

impl Index<usize> for Frame {
	type Output = BitSymbol;

	fn index(&self, second: usize) -> &BitSymbol {
		&self.0[second]
	}
}

impl fmt::Display for Frame {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.iter().try_for_each(|s| fmt::Write::write_char(f, s.as_char()))
	}
}

/// The BCD digits of one minute's time code.
struct TimeCode {
	/// Minutes ones digit, ranged [0, 9].
	min_ones: u8,
	/// Minutes tens digit, ranged [0, 5].
	min_tens: u8,
	/// Hour ones digit, ranged [0, 9].
	hour_ones: u8,
	/// Hour tens digit, ranged [0, 2].
	hour_tens: u8,
	/// Day of year ones digit, ranged [0, 9].
	yday_ones: u8,
	/// Day of year tens digit, ranged [0, 9].
	yday_tens: u8,
	/// Day of year hundreds digit, ranged [0, 3].
	yday_huns: u8,
	/// Year ones digit, ranged [0, 9].
	year_ones: u8,
	/// Year tens digit, ranged [0, 9].
	year_tens: u8,
	/// Day of week, ranged [0, 6], where 0=Sunday, 6=Saturday.
	day_of_week: u8
}

impl TimeCode {
	fn new(instant: &Instant) -> TimeCode {
		let year = instant.year.rem_euclid(100) as u8;
		TimeCode {
			min_ones: instant.minute % 10,
			min_tens: instant.minute / 10,
			hour_ones: instant.hour % 10,
			hour_tens: instant.hour / 10,
			yday_ones: (instant.yday % 10) as u8,
			yday_tens: ((instant.yday / 10) % 10) as u8,
			yday_huns: (instant.yday / 100) as u8,
			year_ones: year % 10,
			year_tens: year / 10,
			day_of_week: instant.weekday
		}
	}

	/// Pack the time code so that bit `n` holds the data bit for second `n`.
	///
	/// Marker seconds are left clear.
	fn pack(&self) -> u64 {
		// JJY uses even parity bits over the minute and hour.
		let min_parity = (self.min_tens.count_ones() + self.min_ones.count_ones()) & 0x1;
		let hour_parity = (self.hour_tens.count_ones() + self.hour_ones.count_ones()) & 0x1;

		let mut a = 0;
		put(&mut a, self.min_tens, 1, 3);
		put(&mut a, self.min_ones, 5, 4);
		put(&mut a, self.hour_tens, 12, 2);
		put(&mut a, self.hour_ones, 15, 4);
		put(&mut a, self.yday_huns, 22, 2);
		put(&mut a, self.yday_tens, 25, 4);
		put(&mut a, self.yday_ones, 30, 4);
		put(&mut a, hour_parity as u8, 36, 1);
		put(&mut a, min_parity as u8, 37, 1);
		put(&mut a, self.year_tens, 41, 4);
		put(&mut a, self.year_ones, 45, 4);
		put(&mut a, self.day_of_week, 50, 3);
		a
	}
}

/// Write the low `width` bits of `value` MSB first, starting at second `start`.
fn put(packed: &mut u64, value: u8, start: usize, width: usize) {
	for i in 0..width {
		let bit = (value >> (width - 1 - i)) & 1;
		*packed |= (bit as u64) << (start + i);
	}
}

/// Build the frame transmitted during the minute that starts at `instant`.
///
/// Only the minute, hour, day of year, year, and weekday of `instant` are used.
///
/// # Examples
///
/// ```
/// # use jjy::{build_frame, BitSymbol, Instant};
/// // Mon, Jan 1 2024. 00:00
/// let instant = Instant { year: 2024, yday: 1, hour: 0, minute: 0, second: 0, weekday: 1 };
/// let frame = build_frame(&instant);
/// assert_eq!(
/// 	frame.to_string(),
/// 	"M00000000M000000000M000000000M000100000M000100100M001000000M"
/// );
/// assert_eq!(frame[9], BitSymbol::Marker);
/// ```
pub fn build_frame(instant: &Instant) -> Frame {
	let packed = TimeCode::new(instant).pack();
	let mut symbols = [BitSymbol::Zero; FRAME_LEN];
	for (second, symbol) in symbols.iter_mut().enumerate() {
		*symbol = if MARKER_POSITIONS.contains(&second) {
			BitSymbol::Marker
		} else if (packed >> second) & 1 == 1 {
			BitSymbol::One
		} else {
			BitSymbol::Zero
		};
	}
	Frame(symbols)
}

#[cfg(test)]
mod tests {
	use super::*;
	use clock::SECONDS_PER_DAY;

	/// Fields read back out of a frame.
	#[derive(Debug, PartialEq)]
	struct Decoded {
		minute: u8,
		hour: u8,
		yday: u16,
		year: u8,
		weekday: u8
	}

	fn read(frame: &Frame, start: usize, width: usize) -> u16 {
		(start..start + width).fold(0, |acc, i| (acc << 1) | (frame[i] == BitSymbol::One) as u16)
	}

	fn decode(frame: &Frame) -> Decoded {
		Decoded {
			minute: (read(frame, 1, 3) * 10 + read(frame, 5, 4)) as u8,
			hour: (read(frame, 12, 2) * 10 + read(frame, 15, 4)) as u8,
			yday: read(frame, 22, 2) * 100 + read(frame, 25, 4) * 10 + read(frame, 30, 4),
			year: (read(frame, 41, 4) * 10 + read(frame, 45, 4)) as u8,
			weekday: read(frame, 50, 3) as u8
		}
	}

	/// Frame as a 64-bit value with second 0 in the MSB and markers read as 0.
	fn bits(frame: &Frame) -> u64 {
		frame.iter().fold(0u64, |acc, s| (acc << 1) | (s == BitSymbol::One) as u64) << 4
	}

	fn check_structure(frame: &Frame) {
		assert_eq!(frame.symbols().len(), FRAME_LEN);
		for (i, s) in frame.iter().enumerate() {
			if MARKER_POSITIONS.contains(&i) {
				assert_eq!(s, BitSymbol::Marker, "second {}", i);
			} else {
				assert_ne!(s, BitSymbol::Marker, "second {}", i);
			}
		}
		// Unused seconds are always zero
		for i in [4, 10, 11, 14, 20, 21, 24, 34, 35, 38, 40, 53, 54, 55, 56, 57, 58] {
			assert_eq!(frame[i], BitSymbol::Zero, "second {}", i);
		}
	}

	fn check_parity(frame: &Frame) {
		let ones = |r: core::ops::RangeInclusive<usize>| r.filter(|&i| frame[i] == BitSymbol::One).count();
		assert_eq!(ones(1..=8) % 2 == 1, frame[37] == BitSymbol::One);
		assert_eq!(ones(12..=18) % 2 == 1, frame[36] == BitSymbol::One);
	}

	#[test]
	fn message_test() {
		// Fri, Jun 10 2016. 17:15 JST
		let frame = build_frame(&Instant { year: 2016, yday: 162, hour: 17, minute: 15, second: 18, weekday: 5 });
		assert_eq!(bits(&frame), 0x1284E130840B2800);
		assert_eq!(frame.to_string(), "M00100101M000100111M000100110M001000010M000010110M101000000M");

		// Sat, Jul 4 2020. 11:36 JST
		let frame = build_frame(&Instant::from_unix(1593830218 + 9 * 3600));
		assert_eq!(bits(&frame), 0x3304214180103000);

		// Mon, May 27 2024. 01:57 and 01:58 JST
		let frame = build_frame(&Instant { year: 2024, yday: 148, hour: 1, minute: 57, second: 0, weekday: 1 });
		assert_eq!(bits(&frame), 0x538021220C120800);
		let frame = build_frame(&Instant { year: 2024, yday: 148, hour: 1, minute: 58, second: 0, weekday: 1 });
		assert_eq!(bits(&frame), 0x540021220C120800);
	}

	#[test]
	fn new_year_test() {
		let frame = build_frame(&Instant { year: 2024, yday: 1, hour: 0, minute: 0, second: 0, weekday: 1 });
		assert!(frame.iter().take(9).skip(1).all(|s| s == BitSymbol::Zero));
		assert_eq!(frame[0], BitSymbol::Marker);
		assert_eq!(frame[9], BitSymbol::Marker);
		assert_eq!(frame[36], BitSymbol::Zero);
		assert_eq!(frame[37], BitSymbol::Zero);
		assert_eq!(decode(&frame), Decoded { minute: 0, hour: 0, yday: 1, year: 24, weekday: 1 });
	}

	#[test]
	fn parity_test() {
		// 59 = 101 1001 has four ones, 23 = 10 0011 has three
		let frame = build_frame(&Instant { year: 2023, yday: 200, hour: 23, minute: 59, second: 0, weekday: 3 });
		assert_eq!(frame[37], BitSymbol::Zero);
		assert_eq!(frame[36], BitSymbol::One);
		// 7 = 0111 has three ones, 10 = 01 0000 has one
		let frame = build_frame(&Instant { year: 2023, yday: 200, hour: 10, minute: 7, second: 0, weekday: 3 });
		assert_eq!(frame[37], BitSymbol::One);
		assert_eq!(frame[36], BitSymbol::One);

		for hour in 0..24 {
			for minute in 0..60 {
				let frame = build_frame(&Instant { year: 2025, yday: 77, hour, minute, second: 0, weekday: 2 });
				check_structure(&frame);
				check_parity(&frame);
			}
		}
	}

	#[test]
	fn round_trip_leap_year_test() {
		// Every day of 2024 (leap year) at 21:37 plus a minute either side of midnight
		let start = 1704067200;
		for day in 0..366 {
			for offset in [0, 21 * 3600 + 37 * 60, SECONDS_PER_DAY - 60] {
				let instant = Instant::from_unix(start + day * SECONDS_PER_DAY + offset);
				let frame = build_frame(&instant);
				check_structure(&frame);
				check_parity(&frame);
				assert_eq!(decode(&frame), Decoded {
					minute: instant.minute,
					hour: instant.hour,
					yday: instant.yday,
					year: 24,
					weekday: instant.weekday
				});
			}
		}

		// Tue, Dec 31 2024. 23:59
		let frame = build_frame(&Instant::from_unix(1735689540));
		assert_eq!(decode(&frame), Decoded { minute: 59, hour: 23, yday: 366, year: 24, weekday: 2 });
	}

	#[test]
	fn century_test() {
		let frame = build_frame(&Instant { year: 2100, yday: 365, hour: 12, minute: 30, second: 0, weekday: 5 });
		assert_eq!(decode(&frame).year, 0);
		let frame = build_frame(&Instant { year: 1999, yday: 365, hour: 12, minute: 30, second: 0, weekday: 5 });
		assert_eq!(decode(&frame).year, 99);
	}
}
