//! Emulate the JJY longwave time signal with audio hardware.
//!
//! Japan's [JJY] stations broadcast the time as one amplitude-modulated symbol per second, sixty
//! symbols per minute. Ordinary audio output radiates enough stray RF at the harmonics of its
//! signal to set a radio-controlled watch at close range, so this crate renders the JJY time code
//! as an audio waveform:
//!
//! 1. [`frame::build_frame`] turns a calendar [`Instant`] into the 60-symbol [`Frame`] for that
//!    minute (BCD fields, parity bits, position markers).
//! 2. [`envelope::amplitude_at`] gives the amplitude of each [`BitSymbol`] over its second.
//! 3. [`Modulator`] multiplies that envelope onto a phase-continuous sine carrier.
//! 4. [`Scheduler`] aligns the start to a whole second, walks the frame one second at a time, and
//!    rebuilds it as each minute rolls over. Samples are pulled from it by the audio sink, so all
//!    timing after the initial alignment comes from the sample counter.
//!
//! The reference time comes from a [`TimeSource`]; [`SystemClock`] reads the local realtime clock.
//!
//! [JJY]: https://www.nict.go.jp/en/sts/jjy_signal.html
//!
//! # Examples
//!
//! ```
//! # use jjy::{transmission_origin, CancelToken, Config, Scheduler, State, SystemClock};
//! let config = Config { duration_minutes: 1, ..Config::default() };
//! let origin = transmission_origin(&mut SystemClock, &config).expect("System clock unavailable");
//! let mut scheduler = Scheduler::new(&config, origin, CancelToken::new()).unwrap();
//!
//! // Sleep until the next whole second, then pull samples as an audio sink would
//! scheduler.wait_for_boundary(std::time::Duration::ZERO);
//! let mut buf = vec![0f32; 1024];
//! while scheduler.fill(&mut buf) == buf.len() {
//! 	// Write buf to the audio device
//! }
//! assert_eq!(scheduler.state(), State::Done);
//! assert_eq!(scheduler.samples_produced(), 60 * 48000);
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod instant;
pub mod modulator;
pub mod scheduler;
pub mod source;

pub use config::Config;
pub use error::TransmitError;
pub use frame::{build_frame, BitSymbol, Frame};
pub use instant::Instant;
pub use modulator::Modulator;
pub use scheduler::{CancelToken, Scheduler, State, TransmissionClock};
pub use source::{transmission_origin, SystemClock, TimeSource};
