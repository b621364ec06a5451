use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::ntppacket::NtpTimestamp;
use crate::{NSEC_IN_SEC, NTP_TIMESTAMP_DELTA};

/// Server time relative to the Unix epoch
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NtpResult {
    /// Seconds since 1970-01-01 (negative before the Unix epoch)
    pub sec: i64,
    /// Nanoseconds within the second, always below one second
    pub nsec: u32,
}

impl NtpResult {
    /// Create new NTP result
    /// Args:
    /// * `sec` - number of seconds since the Unix epoch
    /// * `nsec` - number of nanoseconds, carried into `sec` when it exceeds one second
    pub fn new(sec: i64, nsec: u32) -> Self {
        let residue = nsec / NSEC_IN_SEC;
        let nsec = nsec % NSEC_IN_SEC;
        let sec = sec + i64::from(residue);

        NtpResult { sec, nsec }
    }

    /// Returns number of seconds since the Unix epoch
    pub fn sec(&self) -> i64 {
        self.sec
    }

    /// Returns number of nanoseconds within the second
    pub fn nsec(&self) -> u32 {
        self.nsec
    }

    /// Returns the time as a UTC date.
    ///
    /// `None` only for values outside chrono's range, which no 32-bit NTP
    /// timestamp produces.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.sec, self.nsec).single()
    }

    /// Returns the time as a `SystemTime`
    pub fn system_time(&self) -> SystemTime {
        if self.sec >= 0 {
            UNIX_EPOCH + Duration::new(self.sec as u64, self.nsec)
        } else {
            UNIX_EPOCH - Duration::from_secs(self.sec.unsigned_abs())
                + Duration::from_nanos(u64::from(self.nsec))
        }
    }
}

/// Converts an NTP timestamp into Unix time.
///
/// The fraction is scaled to nanoseconds with truncation. NTP era 0 ends in
/// 2036; later timestamps wrap and are not corrected.
pub fn timestamp_from_ntp(seconds: u32, fraction: u32) -> NtpResult {
    let sec = i64::from(seconds) - NTP_TIMESTAMP_DELTA;
    let nsec = (u64::from(fraction) * u64::from(NSEC_IN_SEC)) >> 32;

    NtpResult::new(sec, nsec as u32)
}

impl From<NtpTimestamp> for NtpResult {
    fn from(ts: NtpTimestamp) -> Self {
        timestamp_from_ntp(ts.seconds, ts.fraction)
    }
}

impl From<NtpResult> for SystemTime {
    fn from(result: NtpResult) -> Self {
        result.system_time()
    }
}

impl Display for NtpResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            None => write!(f, "{}.{:09}", self.sec, self.nsec),
        }
    }
}
