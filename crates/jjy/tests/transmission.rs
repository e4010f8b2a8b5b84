use std::thread;
use std::time::Duration;

use clock::TimeSpec;
use jjy::*;

const RATE: u32 = 1000;

// Sun, Dec 31 2023. 23:59:30 JST
const NEW_YEARS_EVE_JST: i64 = 1704067170;

/// A reference clock stuck at one time.
struct FixedClock(TimeSpec);

impl TimeSource for FixedClock {
	fn now(&mut self) -> Result<TimeSpec, TransmitError> {
		Ok(self.0)
	}
}

struct BrokenClock;

impl TimeSource for BrokenClock {
	fn now(&mut self) -> Result<TimeSpec, TransmitError> {
		Err(TransmitError::TimeUnavailable(String::from("no reference")))
	}
}

/// 250 Hz at 1 kHz gives quarter-cycle steps, so every block of 4 samples peaks at the amplitude.
fn config(duration_minutes: u32, delta_millis: i64) -> Config {
	Config {
		duration_minutes,
		delta_millis,
		sample_rate: RATE,
		carrier_hz: 250.0,
		..Config::default()
	}
}

fn start(config: &Config, utc: TimeSpec, cancel: CancelToken) -> Scheduler {
	let origin = transmission_origin(&mut FixedClock(utc), config).unwrap();
	let mut scheduler = Scheduler::new(config, origin, cancel).unwrap();
	scheduler.wait_for_boundary(Duration::ZERO);
	scheduler
}

fn drain(scheduler: &mut Scheduler) -> Vec<f32> {
	let mut out = Vec::new();
	let mut buf = vec![0f32; 1024];
	loop {
		let n = scheduler.fill(&mut buf);
		out.extend_from_slice(&buf[..n]);
		if n < buf.len() {
			return out;
		}
	}
}

/// Recover the symbol of each second from how long the carrier stays at full power.
fn decode(samples: &[f32]) -> Vec<BitSymbol> {
	samples.chunks(RATE as usize)
		.map(|second| {
			let high = second.chunks(4)
				.filter(|block| block.iter().fold(0f32, |m, v| m.max(v.abs())) > 0.5)
				.count() * 4;
			match high {
				200 => BitSymbol::Marker,
				500 => BitSymbol::One,
				800 => BitSymbol::Zero,
				ms => panic!("Unexpected full power duration {} ms", ms)
			}
		})
		.collect()
}

#[test]
fn one_minute_test() {
	let config = config(1, 0);
	let utc = TimeSpec { sec: NEW_YEARS_EVE_JST - 9 * 3600, nsec: 0 };
	let mut scheduler = start(&config, utc, CancelToken::new());
	let samples = drain(&mut scheduler);

	assert_eq!(samples.len(), 60 * RATE as usize);
	assert_eq!(scheduler.state(), State::Done);
	assert!(samples.iter().all(|v| (-1.0..=1.0).contains(v)));

	// Second half of 23:59, then first half of 00:00 on New Year's Day
	let before = build_frame(&Instant::from_unix(NEW_YEARS_EVE_JST));
	let after = build_frame(&Instant::from_unix(NEW_YEARS_EVE_JST + 30));
	let expected: Vec<BitSymbol> = before.iter().skip(30).chain(after.iter().take(30)).collect();
	assert_eq!(decode(&samples), expected);
	assert_eq!(scheduler.frame(), &after);
}

#[test]
fn delta_test() {
	// 23:59:59 JST
	let utc = TimeSpec { sec: NEW_YEARS_EVE_JST + 29 - 9 * 3600, nsec: 0 };
	let on_time = start(&config(1, 0), utc, CancelToken::new());
	let late = start(&config(1, 1000), utc, CancelToken::new());

	assert_eq!(on_time.clock().instant().minute, 59);
	assert_eq!(late.clock().instant().minute, 0);
	assert_eq!(late.clock().instant().year, 2024);
	assert_ne!(on_time.frame(), late.frame());
	assert_eq!(late.clock().minute_start(), on_time.clock().minute_start() + 60);
}

#[test]
fn late_start_test() {
	// 23:59:58.5 JST, first boundary at 23:59:59 but the sink took 2.2 s to start
	let config = config(1, 0);
	let utc = TimeSpec { sec: NEW_YEARS_EVE_JST + 28 - 9 * 3600, nsec: 500_000_000 };
	let origin = transmission_origin(&mut FixedClock(utc), &config).unwrap();
	let mut scheduler = Scheduler::new(&config, origin, CancelToken::new()).unwrap();
	assert_eq!(scheduler.align(Duration::from_millis(2200)), Duration::from_millis(300));

	// The first second sent is 00:00:01, the one starting when the wait ends
	let samples = drain(&mut scheduler);
	assert_eq!(samples.len(), 60 * RATE as usize);
	let new_year = build_frame(&Instant::from_unix(NEW_YEARS_EVE_JST + 30));
	let next = build_frame(&Instant::from_unix(NEW_YEARS_EVE_JST + 90));
	let expected: Vec<BitSymbol> = new_year.iter().skip(1).chain(next.iter().take(1)).collect();
	assert_eq!(decode(&samples), expected);
}

#[test]
fn cancel_test() {
	let token = CancelToken::new();
	let utc = TimeSpec { sec: NEW_YEARS_EVE_JST, nsec: 0 };
	let mut scheduler = start(&config(30, 0), utc, token.clone());

	let mut buf = vec![0f32; 1024];
	assert_eq!(scheduler.fill(&mut buf), 1024);
	thread::spawn(move || token.cancel()).join().unwrap();

	assert_eq!(scheduler.fill(&mut buf), 0);
	assert_eq!(scheduler.state(), State::Done);
	assert_eq!(scheduler.samples_produced(), 1024);
}

#[test]
fn time_unavailable_test() {
	let result = transmission_origin(&mut BrokenClock, &Config::default());
	assert!(matches!(result, Err(TransmitError::TimeUnavailable(_))));
}
