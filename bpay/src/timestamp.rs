//! Millisecond Unix timestamps used in request signatures.
//!
//! Binance Pay expects `BinancePay-Timestamp` in milliseconds since the Unix
//! epoch, and the same value must appear verbatim in the signed payload.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

/// Milliseconds since the Unix epoch (1970-01-01T00:00:00Z).
///
/// Rendered as a plain decimal integer, both in the signature payload and in
/// the `BinancePay-Timestamp` header.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct TimestampMs(u64);

impl Display for TimestampMs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TimestampMs {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl TimestampMs {
    /// Creates a timestamp from a raw millisecond value.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the current system time.
    ///
    /// # Panics
    ///
    /// Panics if the system clock is set to a time before the Unix epoch,
    /// which should never happen on properly configured systems.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("SystemTime before UNIX epoch?!?")
            .as_millis();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Returns the raw millisecond value.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Returns the value truncated to whole seconds.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0 / 1000
    }

    /// Absolute distance to `other` in milliseconds.
    #[must_use]
    pub const fn abs_diff(&self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// Converts to a UTC date-time, truncated to whole seconds.
    ///
    /// Returns `None` if the value is outside the range chrono can represent.
    #[must_use]
    pub fn to_utc_secs(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.as_secs()).ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}
