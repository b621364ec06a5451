//! Query a remote time server with a single NTPv3 request/response exchange.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! let client = ntptime::NtpClient::new("time.apple.com", 123, Duration::from_secs(5));
//! match client.get_time() {
//!     Ok(time) => println!("NTP time: {}", time),
//!     Err(e) => eprintln!("query failed: {}", e),
//! }
//! ```

use std::time::Duration;

pub mod client;
pub mod error;
pub mod ntppacket;
pub mod ntpresult;

pub use crate::client::NtpClient;
pub use crate::error::{Error, Result};
pub use crate::ntppacket::{decode_response, encode_request, NtpPacket, NtpTimestamp};
pub use crate::ntpresult::{timestamp_from_ntp, NtpResult};

/// Number of nanoseconds in one second
pub const NSEC_IN_SEC: u32 = 1_000_000_000;

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01)
pub const NTP_TIMESTAMP_DELTA: i64 = 2_208_988_800;

/// Size of an NTP packet without extension fields
pub const PACKET_SIZE: usize = 48;

/// Well-known NTP server port
pub const DEFAULT_PORT: u16 = 123;

/// Timeout used when a client is built with a zero timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
