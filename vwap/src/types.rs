use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, TimeDelta, Timelike};
use serde::{Serialize, Serializer};

use crate::error::TradeError;

/// Display/parse format for a time-of-day, e.g. `9:31 AM`.
const CLOCK_FORMAT: &str = "%-I:%M %p";
const CLOCK_PARSE_FORMAT: &str = "%I:%M %p";

/// Unvalidated trade as handed over by the caller:
/// `[time, instrument, price, volume]`, but any field count is accepted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawTradeRecord(Vec<String>);

impl RawTradeRecord {
    pub fn new(fields: Vec<String>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for RawTradeRecord {
    fn from(fields: Vec<String>) -> Self {
        Self(fields)
    }
}

impl<const N: usize> From<[&str; N]> for RawTradeRecord {
    fn from(fields: [&str; N]) -> Self {
        Self(fields.iter().map(|f| f.to_string()).collect())
    }
}

impl fmt::Display for RawTradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// A time-of-day on a 12-hour clock. Carries no date and no zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TradeTime(NaiveTime);

impl TradeTime {
    /// Same hour and AM/PM, minutes and seconds zeroed.
    pub fn hour_bucket(&self) -> Self {
        Self(NaiveTime::MIN + TimeDelta::hours(i64::from(self.0.hour())))
    }
}

/// `h:mm` followed by a single space and an upper-case `AM`/`PM`.
///
/// chrono alone is too forgiving here (lower-case markers, missing space,
/// one-digit minutes), so the layout is checked before parsing.
fn has_clock_shape(text: &str) -> bool {
    let Some((clock, marker)) = text.split_once(' ') else {
        return false;
    };
    if marker != "AM" && marker != "PM" {
        return false;
    }
    let Some((hour, minute)) = clock.split_once(':') else {
        return false;
    };

    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    (1..=2).contains(&hour.len()) && minute.len() == 2 && digits(hour) && digits(minute)
}

impl FromStr for TradeTime {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !has_clock_shape(s) {
            return Err(TradeError::InvalidTime(s.to_string()));
        }
        NaiveTime::parse_from_str(s, CLOCK_PARSE_FORMAT)
            .map(Self)
            .map_err(|_| TradeError::InvalidTime(s.to_string()))
    }
}

impl fmt::Display for TradeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CLOCK_FORMAT))
    }
}

impl Serialize for TradeTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A record that passed validation. Lives only until it is folded in.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTrade {
    pub time: TradeTime,
    pub instrument: String,
    pub price: f64,
    pub volume: u32,
}
