//! Bucket Store
//!
//! Two-level map `instrument → hour → Accumulator`. Each level is a
//! `parking_lot::RwLock<HashMap<..>>`:
//!   • existing buckets are reached under read locks only, so folding into a
//!     known bucket never contends with other readers or writers
//!   • a missing key is inserted under the write lock with `entry()`, after a
//!     read-locked miss; the second check inside `entry()` makes creation
//!     exactly-once even when several threads race on first touch
//!
//! Accumulators are owned by their slot and never handed out; callers reach
//! them through closures.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::accumulator::Accumulator;
use crate::bucket::BucketKey;
use crate::types::TradeTime;

type HourBuckets = RwLock<HashMap<TradeTime, Accumulator>>;

/// Materialised view of one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSnapshot {
    pub instrument: String,
    pub hour: TradeTime,
    pub vwap: f64,
    pub total_volume: u64,
    pub trade_count: u64,
}

impl BucketSnapshot {
    pub fn display_key(&self) -> String {
        format!("{} {}", self.instrument, self.hour)
    }
}

#[derive(Debug, Default)]
pub struct BucketStore {
    instruments: RwLock<HashMap<String, Arc<HourBuckets>>>,
}

impl BucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hour map of `instrument`, inserted on first use.
    fn hours_for(&self, instrument: &str) -> Arc<HourBuckets> {
        if let Some(hours) = self.instruments.read().get(instrument) {
            return Arc::clone(hours);
        }

        let mut guard = self.instruments.write();
        let hours = guard.entry(instrument.to_string()).or_insert_with(|| {
            debug!(instrument, "instrument registered in bucket store");
            Arc::default()
        });
        Arc::clone(hours)
    }

    /// Run `f` against the accumulator for `key`, creating it if needed.
    pub fn with_accumulator<R>(&self, key: &BucketKey, f: impl FnOnce(&Accumulator) -> R) -> R {
        let hours = self.hours_for(&key.instrument);

        {
            let guard = hours.read();
            if let Some(acc) = guard.get(&key.hour) {
                return f(acc);
            }
        }

        let mut guard = hours.write();
        let acc = guard.entry(key.hour).or_insert_with(|| {
            debug!(bucket = %key, "bucket created");
            Accumulator::new()
        });
        f(acc)
    }

    /// Run `f` against an existing accumulator. Never creates one.
    pub fn peek<R>(&self, key: &BucketKey, f: impl FnOnce(&Accumulator) -> R) -> Option<R> {
        let hours = self.instruments.read().get(&key.instrument).cloned()?;
        let guard = hours.read();
        guard.get(&key.hour).map(f)
    }

    pub fn contains(&self, key: &BucketKey) -> bool {
        self.peek(key, |_| ()).is_some()
    }

    /// All buckets, ordered by instrument then hour.
    ///
    /// The instrument map stays read-locked for the whole walk, so no bucket
    /// appears or disappears midway; folds into existing buckets continue.
    pub fn buckets(&self) -> Vec<BucketSnapshot> {
        let instruments = self.instruments.read();

        let mut out = Vec::new();
        for (instrument, hours) in instruments.iter() {
            for (hour, acc) in hours.read().iter() {
                let snap = acc.snapshot();
                out.push(BucketSnapshot {
                    instrument: instrument.clone(),
                    hour: *hour,
                    vwap: snap.vwap(),
                    total_volume: snap.volume,
                    trade_count: snap.trades,
                });
            }
        }

        out.sort_by(|a, b| (&a.instrument, a.hour).cmp(&(&b.instrument, b.hour)));
        out
    }

    pub fn bucket_count(&self) -> usize {
        self.instruments
            .read()
            .values()
            .map(|hours| hours.read().len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bucket_count() == 0
    }
}
