use std::fmt;

use crate::types::TradeTime;

/// Identity of one aggregation unit: an instrument within one clock hour.
///
/// Equality and hashing only ever see these two fields, so every trade
/// in the same hour for the same instrument lands on the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    pub instrument: String,
    pub hour: TradeTime,
}

impl BucketKey {
    /// No zone conversion and no date rollover: 11:31 PM and 12:31 AM
    /// are simply two different hours.
    pub fn resolve(instrument: &str, time: TradeTime) -> Self {
        Self {
            instrument: instrument.to_string(),
            hour: time.hour_bucket(),
        }
    }

    /// `"<INSTRUMENT> <h:00 AM/PM>"`, the key used in snapshots.
    pub fn display_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.instrument, self.hour)
    }
}
