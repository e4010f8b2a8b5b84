//! Simple Network Time Protocol client.
//!
//! This crate exposes one entry point, [`get_ntp_time`], which asks an NTP server (or pool) for the
//! current time using a caller-selected protocol version. Five requests are made and the reply
//! with the smallest error bound wins, which is typically good to ~30 ms. If the address resolves
//! to several IPs the requests cycle through them.
//!
//! # Examples
//!
//! ```no_run
//! # use sntp::get_ntp_time;
//! match get_ntp_time("time.google.com", 4) {
//! 	Ok(t) => assert!(t.sec > 0),
//! 	Err(e) => eprintln!("Error querying time.google.com: {e}")
//! }
//! ```

use std::{
	io,
	net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket},
	ops::{Add, Div, Sub},
	time::Duration
};
use clock::{now, TimeSpec};
use log::{debug, trace};
use thiserror::Error;

/// Offset between the NTP epoch (Jan 1, 1900) and the Unix epoch (Jan 1, 1970), in seconds.
const UNIX_TO_NTP_EPOCH_ADJUST: i64 = (70 * 365 + 17) * 86400; // 17 leap years between 1900-1970
/// Size of an NTP packet without extension fields or authenticator.
const PACKET_LEN: usize = 48;
/// Number of queries made per call to [`get_ntp_time`].
const QUERIES: usize = 5;
/// Client association mode.
const MODE_CLIENT: u8 = 3;
/// Server association mode.
const MODE_SERVER: u8 = 4;

/// The error type for SNTP queries.
#[derive(Debug, Error)]
pub enum SntpError {
	/// The server address was empty.
	#[error("empty NTP server address")]
	EmptyAddress,
	/// The server address resolved to no IPs.
	#[error("NTP server address {0} did not resolve to any IPs")]
	Unresolved(String),
	/// The requested protocol version is not one of 1-4.
	#[error("unsupported NTP version {0}, expected 1-4")]
	UnsupportedVersion(u8),
	/// A socket operation failed.
	#[error("NTP socket error: {0}")]
	Io(#[from] io::Error),
	/// The server replied with something that is not a usable server reply.
	#[error("invalid reply from NTP server: {0}")]
	InvalidReply(&'static str),
	/// The local realtime clock could not be read.
	#[error("failed to read the local clock")]
	LocalClock
}

/// An NTP timestamp: 32.32 fixed point seconds since Jan 1, 1900, stored system-endian.
///
/// The format rolls over every 136 years (first on Feb 7, 2036); differences use wrapping
/// arithmetic so they stay correct across a rollover.
#[derive(Clone, Copy, Debug, PartialEq)]
struct NtpTimestamp(u64);

impl NtpTimestamp {
	/// Create a timestamp from its whole (`sec`) and fractional (`frac`, units of 2^-32 s) parts.
	fn new(sec: u32, frac: u32) -> Self {
		Self((sec as u64) << 32 | frac as u64)
	}

	/// Widen a 16.16 "short format" value (root delay, root dispersion) to 32.32.
	fn from_short(v: u32) -> Self {
		Self((v as u64) << 16)
	}
}

impl From<TimeSpec> for NtpTimestamp {
	fn from(time: TimeSpec) -> Self {
		let sec = time.sec + UNIX_TO_NTP_EPOCH_ADJUST;
		let frac = (time.nsec << 32) / 1_000_000_000;
		NtpTimestamp::new(sec as u32, frac as u32)
	}
}

impl Sub for NtpTimestamp {
	type Output = NtpTimestampDiff;

	fn sub(self, rhs: Self) -> Self::Output {
		// Overflow reinterpreted as a negative difference
		NtpTimestampDiff(self.0.wrapping_sub(rhs.0) as i64)
	}
}

impl Div<u64> for NtpTimestamp {
	type Output = NtpTimestamp;

	fn div(self, rhs: u64) -> Self::Output {
		Self(self.0 / rhs)
	}
}

/// A signed difference between two [`NtpTimestamp`]s, 32.32 fixed point.
///
/// Differences of more than +-68 years cannot be represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct NtpTimestampDiff(i64);

impl NtpTimestampDiff {
	/// Whole seconds, rounded towards negative infinity.
	fn sec(self) -> i64 {
		self.0 >> 32
	}

	/// Fractional part in units of 2^-32 s, always positive.
	fn frac(self) -> i64 {
		self.0 & 0xFFFFFFFF
	}

	fn abs(self) -> Self {
		Self(self.0.wrapping_abs())
	}
}

impl Sub for NtpTimestampDiff {
	type Output = Self;

	fn sub(self, rhs: Self) -> Self::Output {
		// Only meaningless for malformed packets, never worth a debug-mode panic
		Self(self.0.wrapping_sub(rhs.0))
	}
}

impl Add for NtpTimestampDiff {
	type Output = Self;

	fn add(self, rhs: Self) -> Self::Output {
		Self(self.0.wrapping_add(rhs.0))
	}
}

impl Add<NtpTimestamp> for NtpTimestampDiff {
	type Output = Self;

	fn add(self, rhs: NtpTimestamp) -> Self::Output {
		Self(self.0.wrapping_add(rhs.0 as i64))
	}
}

impl Div<i64> for NtpTimestampDiff {
	type Output = Self;

	fn div(self, rhs: i64) -> Self::Output {
		Self(self.0 / rhs)
	}
}

impl From<NtpTimestampDiff> for TimeSpec {
	/// Convert to a (normalized) Unix time difference.
	fn from(time: NtpTimestampDiff) -> Self {
		let nsec = (time.frac() * 1_000_000_000) >> 32;
		TimeSpec::new(time.sec(), nsec)
	}
}

/// The fields of an NTP packet this client reads or writes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct NtpPacket {
	/// Leap indicator (2 bits), version (3 bits), mode (3 bits).
	li_vn_mode: u8,
	/// Stratum of the server clock. 0 is a kiss-o'-death reply.
	stratum: u8,
	/// Round-trip delay to the primary reference, 16.16 fixed point.
	root_delay: u32,
	/// Maximum error relative to the primary reference, 16.16 fixed point.
	root_dispersion: u32,
	/// Client transmit time echoed back by the server.
	origin_time: u64,
	/// Time the request arrived at the server.
	rx_time: u64,
	/// Time the reply left the server (or, in a request, the time the request left the client).
	tx_time: u64
}

impl NtpPacket {
	/// Build a client request for protocol `version` sent at `time`.
	fn request(version: u8, time: NtpTimestamp) -> Self {
		NtpPacket {
			li_vn_mode: (version & 0x7) << 3 | MODE_CLIENT,
			tx_time: time.0,
			..Default::default()
		}
	}

	fn mode(&self) -> u8 {
		self.li_vn_mode & 0x7
	}

	/// Encode to wire format (big endian).
	fn to_bytes(&self) -> [u8; PACKET_LEN] {
		let mut buf = [0u8; PACKET_LEN];
		buf[0] = self.li_vn_mode;
		buf[1] = self.stratum;
		buf[4..8].copy_from_slice(&self.root_delay.to_be_bytes());
		buf[8..12].copy_from_slice(&self.root_dispersion.to_be_bytes());
		buf[24..32].copy_from_slice(&self.origin_time.to_be_bytes());
		buf[32..40].copy_from_slice(&self.rx_time.to_be_bytes());
		buf[40..48].copy_from_slice(&self.tx_time.to_be_bytes());
		buf
	}

	/// Decode from wire format (big endian).
	fn from_bytes(buf: &[u8; PACKET_LEN]) -> Self {
		let u32_at = |i: usize| u32::from_be_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
		let u64_at = |i: usize| (u32_at(i) as u64) << 32 | u32_at(i + 4) as u64;
		NtpPacket {
			li_vn_mode: buf[0],
			stratum: buf[1],
			root_delay: u32_at(4),
			root_dispersion: u32_at(8),
			origin_time: u64_at(24),
			rx_time: u64_at(32),
			tx_time: u64_at(40)
		}
	}
}

/// Read the local clock, mapping failure to [`SntpError::LocalClock`].
fn local_time() -> Result<TimeSpec, SntpError> {
	now().ok_or(SntpError::LocalClock)
}

/// A client that reuses one IPv4 and one IPv6 socket across queries.
///
/// Not thread safe; create one per thread.
struct NtpClient {
	version: u8,
	sockv4: Option<UdpSocket>,
	sockv6: Option<UdpSocket>
}

impl NtpClient {
	/// Construct a client speaking protocol `version` (1-4).
	fn new(version: u8) -> Result<Self, SntpError> {
		if !(1..=4).contains(&version) {
			return Err(SntpError::UnsupportedVersion(version));
		}
		Ok(Self { version, sockv4: None, sockv6: None })
	}

	/// Get the socket for `addr`'s family, binding it on first use.
	fn get_or_init_socket<T>(socket: &mut Option<UdpSocket>, addr: T) -> Result<&UdpSocket, io::Error>
	where (T, u16): ToSocketAddrs
	{
		if socket.is_none() {
			let s = UdpSocket::bind((addr, 0))?;
			s.set_read_timeout(Some(Duration::from_secs(1)))?;
			s.set_write_timeout(Some(Duration::from_secs(1)))?;
			*socket = Some(s);
		}
		socket.as_ref().ok_or_else(|| io::Error::new(io::ErrorKind::Other, "NTP socket unavailable"))
	}

	/// Query one server.
	///
	/// Returns the offset to add to the local clock and the error bound of that offset.
	fn query_server(&mut self, addr: &SocketAddr) -> Result<(NtpTimestampDiff, NtpTimestampDiff), SntpError> {
		let socket = if addr.is_ipv4() {
			Self::get_or_init_socket(&mut self.sockv4, Ipv4Addr::UNSPECIFIED)?
		} else {
			Self::get_or_init_socket(&mut self.sockv6, Ipv6Addr::UNSPECIFIED)?
		};

		socket.connect(addr)?;
		let t1 = NtpTimestamp::from(local_time()?);
		socket.send(&NtpPacket::request(self.version, t1).to_bytes())?;
		let mut buf = [0u8; PACKET_LEN];
		let bytes = socket.recv(&mut buf)?;
		let t4 = NtpTimestamp::from(local_time()?);
		if bytes != PACKET_LEN {
			return Err(SntpError::InvalidReply("short packet"));
		}

		let reply = NtpPacket::from_bytes(&buf);
		if reply.mode() != MODE_SERVER {
			return Err(SntpError::InvalidReply("not a server reply"));
		}
		if reply.stratum == 0 {
			return Err(SntpError::InvalidReply("kiss-o'-death"));
		}
		if reply.origin_time != t1.0 {
			return Err(SntpError::InvalidReply("origin timestamp mismatch"));
		}

		let t2 = NtpTimestamp(reply.rx_time);
		let t3 = NtpTimestamp(reply.tx_time);
		let delay = t4 - t1 - (t3 - t2);
		let offset = ((t2 - t1) + (t3 - t4)) / 2;
		let error = delay
				  + (NtpTimestamp::from_short(reply.root_delay) / 2)
				  + NtpTimestamp::from_short(reply.root_dispersion);

		trace!("NTP reply from {}: offset {:?}, error {:?}", addr, offset, error);
		Ok((offset, error))
	}
}

/// Add the default NTP port (123) to `addr` unless it already has one.
///
/// Domain names, IPv4, and bare or bracketed IPv6 addresses are supported.
fn normalize_address(addr: &str) -> Result<String, SntpError> {
	if addr.is_empty() {
		return Err(SntpError::EmptyAddress);
	}

	match addr.find(':') {
		// A second ':' means IPv6
		Some(i) => match addr[i + 1..].rfind(':') {
			Some(j) => match addr.rfind(']') {
				// Port after the closing bracket
				Some(k) if i + 1 + j > k => Ok(String::from(addr)),
				Some(_) => Ok(format!("{}:123", addr)),
				None => Ok(format!("[{}]:123", addr))
			},
			None => Ok(String::from(addr))
		},
		None => Ok(format!("{}:123", addr))
	}
}

/// Get the current time according to the NTP server at `addr`, speaking protocol `version`.
///
/// Makes five queries and keeps the reply with the smallest error bound. Fails only if every query
/// fails, in which case the last error is returned.
///
/// # Errors
///
/// [`SntpError::UnsupportedVersion`] for versions outside 1-4, address errors if `addr` is empty or
/// does not resolve, and otherwise the error of the last failed query.
pub fn get_ntp_time(addr: &str, version: u8) -> Result<TimeSpec, SntpError> {
	let mut client = NtpClient::new(version)?;
	let addrs: Vec<SocketAddr> = normalize_address(addr)?.to_socket_addrs()?.collect();
	if addrs.is_empty() {
		return Err(SntpError::Unresolved(String::from(addr)));
	}

	let mut best: Option<(NtpTimestampDiff, NtpTimestampDiff)> = None;
	let mut last_error = None;
	for target in addrs.iter().cycle().take(QUERIES) {
		match client.query_server(target) {
			Ok((offset, error)) => {
				let error = error.abs();
				if best.map_or(true, |(_, e)| error < e) {
					best = Some((offset, error));
				}
			},
			Err(e) => {
				debug!("NTP query to {} failed: {}", target, e);
				last_error = Some(e);
			}
		}
	}

	match best {
		Some((offset, _)) => Ok(local_time()? + TimeSpec::from(offset)),
		None => Err(last_error.unwrap_or(SntpError::InvalidReply("no replies")))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ntp_timestamp_test() {
		let t = NtpTimestamp::new(0x12345678, 0x11223344);
		assert_eq!(t.0, 0x1234567811223344);
		assert_eq!(NtpTimestamp::from_short(0x12345678).0, 0x0000123456780000);

		// Jan 1, 1970 is NTP second 2208988800
		let t = NtpTimestamp::from(TimeSpec { sec: 0, nsec: 500_000_000 });
		assert_eq!(t, NtpTimestamp::new(2208988800, 0x80000000));
	}

	#[test]
	fn ntp_timestamp_math_test() {
		let t1 = NtpTimestamp::new(0x1, 0x80000000); // 1.500s
		let t2 = NtpTimestamp::new(0x2, 0x60000000); // 2.375s
		let d = t2 - t1;
		assert_eq!(d.0, 0x00000000E0000000);
		assert_eq!((d.sec(), d.frac()), (0, 0xE0000000));
		assert_eq!(TimeSpec::from(d), TimeSpec { sec: 0, nsec: 875000000 });

		let d = t1 - t2;
		assert_eq!(d.0, 0xFFFFFFFF20000000u64 as i64);
		assert_eq!((d.sec(), d.frac()), (-1, 0x20000000));
		assert_eq!(TimeSpec::from(d), TimeSpec { sec: -1, nsec: 125000000 });
		assert_eq!(d.abs(), t2 - t1);

		let d = (t2 - t1) / 2;
		assert_eq!(TimeSpec::from(d), TimeSpec { sec: 0, nsec: 437500000 });
	}

	#[test]
	fn packet_test() {
		let p = NtpPacket::request(3, NtpTimestamp::new(0x11223344, 0x55667788));
		let bytes = p.to_bytes();
		assert_eq!(bytes[0], 0x1B);
		assert_eq!(&bytes[40..48], &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
		assert!(bytes[1..40].iter().all(|&b| b == 0));
		assert_eq!(NtpPacket::from_bytes(&bytes), p);
		assert_eq!(NtpPacket::request(4, NtpTimestamp(0)).li_vn_mode, 0x23);

		let mut bytes = [0u8; PACKET_LEN];
		bytes[0] = 0x24;
		bytes[1] = 2;
		bytes[4..8].copy_from_slice(&[0, 0, 0x80, 0]);
		bytes[24..32].copy_from_slice(&[0, 0, 0, 1, 0, 0, 0, 2]);
		let p = NtpPacket::from_bytes(&bytes);
		assert_eq!(p.mode(), MODE_SERVER);
		assert_eq!(p.stratum, 2);
		assert_eq!(p.root_delay, 0x8000);
		assert_eq!(p.origin_time, 0x0000000100000002);
	}

	#[test]
	fn version_test() {
		assert!(matches!(NtpClient::new(0), Err(SntpError::UnsupportedVersion(0))));
		assert!(matches!(NtpClient::new(5), Err(SntpError::UnsupportedVersion(5))));
		assert!(NtpClient::new(1).is_ok());
		assert!(matches!(get_ntp_time("time.google.com", 7), Err(SntpError::UnsupportedVersion(7))));
	}

	#[test]
	fn normalize_address_test() {
		assert_eq!(normalize_address("time.google.com:321").unwrap(), "time.google.com:321");
		assert_eq!(normalize_address("time.google.com").unwrap(), "time.google.com:123");
		assert_eq!(normalize_address("127.0.0.1:321").unwrap(), "127.0.0.1:321");
		assert_eq!(normalize_address("127.0.0.1").unwrap(), "127.0.0.1:123");
		assert_eq!(normalize_address("[::1]:321").unwrap(), "[::1]:321");
		assert_eq!(normalize_address("::1").unwrap(), "[::1]:123");
		assert_eq!(normalize_address("[::1]").unwrap(), "[::1]:123");
		assert!(matches!(normalize_address(""), Err(SntpError::EmptyAddress)));
	}

	#[test]
	fn invalid_address_test() {
		assert!(get_ntp_time("", 4).is_err());
		assert!(get_ntp_time("invalid address", 4).is_err());
	}
}
