//! Half-hour trading periods and their feed timestamps.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use crate::error::{Error, Result};

/// Number of trading periods in a (non-DST-transition) trading day.
pub const PERIODS_PER_DAY: u32 = 48;
/// Length of one trading period in minutes.
pub const PERIOD_MINUTES: u32 = 30;

/// Timestamp layout used as the offer feed's period key.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A 1-based trading period: period 1 covers 00:00-00:30, period 48 covers
/// 23:30-24:00.
///
/// # Examples
///
/// ```
/// use merit_curve::market::period::TradingPeriod;
///
/// let tp = TradingPeriod::new(3).unwrap();
/// assert_eq!(tp.start_time().to_string(), "01:00:00");
/// assert_eq!(TradingPeriod::wrapping(49).number(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TradingPeriod(u32);

impl TradingPeriod {
    /// First period of the day.
    pub const FIRST: Self = Self(1);

    /// Creates a trading period.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Period`] unless `n` is in `1..=48`.
    pub fn new(n: u32) -> Result<Self> {
        if (1..=PERIODS_PER_DAY).contains(&n) {
            Ok(Self(n))
        } else {
            Err(Error::Period(n))
        }
    }

    /// Maps any positive period number onto `1..=48`; `0` maps to 48.
    pub fn wrapping(n: u32) -> Self {
        Self(n.checked_sub(1).map_or(PERIODS_PER_DAY, |m| m % PERIODS_PER_DAY + 1))
    }

    /// The 1-based period number.
    pub fn number(self) -> u32 {
        self.0
    }

    /// Zero-based position in the day's period sequence.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Wall-clock start of the period.
    pub fn start_time(self) -> NaiveTime {
        let minutes = (self.0 - 1) * PERIOD_MINUTES;
        NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Start of the period on `date`.
    pub fn start(self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start_time())
    }

    /// End of the period on `date` (start of the next period).
    pub fn end(self, date: NaiveDate) -> NaiveDateTime {
        self.start(date) + Duration::minutes(i64::from(PERIOD_MINUTES))
    }

    /// Feed key for this period on `date`, e.g. `2025-12-30T13:30:00`.
    pub fn timestamp(self, date: NaiveDate) -> String {
        self.start(date).format(TIMESTAMP_FORMAT).to_string()
    }

    /// Parses a feed key back into its date and period.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the string is not a timestamp or does not
    /// fall on a period boundary.
    pub fn from_timestamp(s: &str) -> Result<(NaiveDate, Self)> {
        let parsed = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map_err(|e| {
            Error::Parse {
                line: 0,
                message: format!("invalid period timestamp \"{s}\": {e}"),
            }
        })?;
        let time = parsed.time();
        let minutes = time.hour() * 60 + time.minute();
        if minutes % PERIOD_MINUTES != 0 || time.second() != 0 {
            return Err(Error::Parse {
                line: 0,
                message: format!("timestamp \"{s}\" is not on a trading period boundary"),
            });
        }
        Ok((parsed.date(), Self(minutes / PERIOD_MINUTES + 1)))
    }

    /// All periods of a day in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=PERIODS_PER_DAY).map(Self)
    }
}

impl fmt::Display for TradingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TP {} ({})", self.0, self.start_time().format("%H:%M"))
    }
}
