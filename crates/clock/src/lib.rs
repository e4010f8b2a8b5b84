//! Minimal Unix time utilities for time signal generation.
//!
//! This crate is split in two: [`timespec`] holds [`TimeSpec`], a Unix timestamp with nanosecond
//! granularity plus the offset types used to shift it ([`Seconds`], [`Milliseconds`],
//! [`Nanoseconds`]); [`calendar`] converts Unix timestamps into Gregorian calendar fields ([`Tm`]).
//! Neither half knows anything about timezones. A fixed UTC offset is applied by shifting the
//! timestamp before conversion.
//!
//! The crate is `no_std`. If the `now` feature is enabled, [`now`] reads the realtime clock
//! through `libc::clock_gettime`.
//!
//! # Examples
//!
//! ```
//! # use clock::{Seconds, TimeSpec, Tm};
//! // Mon, Jun 17 2024. 09:50:07 UTC, shifted to UTC+9
//! let t = TimeSpec { sec: 1718617807, nsec: 0 } + Seconds(9 * 3600);
//! let date = Tm::new(t.sec);
//! assert_eq!(date.hour, 18);
//! assert_eq!(date.yday, 169);
//! ```

#![no_std]

pub mod calendar;
pub mod timespec;

pub use calendar::*;
pub use timespec::*;
