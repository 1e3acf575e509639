//! Per-bucket running sums.
//!
//! The numerator is an `f64` stored as raw bits in an `AtomicU64` and
//! updated with a compare-and-swap loop; the denominator is a plain
//! `fetch_add`. Writers never take a lock.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running `Σ price·volume` and `Σ volume` for a single bucket.
#[derive(Debug, Default)]
pub struct Accumulator {
    /// Bit pattern of the `f64` numerator. `0u64` is `0.0`.
    notional_bits: AtomicU64,
    volume: AtomicU64,
    trades: AtomicU64,
}

/// Point-in-time copy of an [`Accumulator`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccumulatorSnapshot {
    pub notional: f64,
    pub volume: u64,
    pub trades: u64,
}

impl AccumulatorSnapshot {
    pub fn vwap(&self) -> f64 {
        vwap(self.notional, self.volume)
    }
}

fn vwap(notional: f64, volume: u64) -> f64 {
    if volume == 0 {
        return 0.0;
    }
    notional / volume as f64
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one trade in. Safe to call from any number of threads at once.
    pub fn add_trade(&self, price: f64, volume: u32) {
        let delta = price * f64::from(volume);

        let mut current = self.notional_bits.load(Ordering::Acquire);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self.notional_bits.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        // Published after the numerator: a reader that sees this volume
        // also sees the matching notional.
        self.volume.fetch_add(u64::from(volume), Ordering::AcqRel);
        self.trades.fetch_add(1, Ordering::Relaxed);
    }

    /// Current VWAP, or `0.0` while no volume has been recorded.
    ///
    /// Numerator and denominator are read separately, so under concurrent
    /// writes the value may mix two adjacent states.
    pub fn value(&self) -> f64 {
        let volume = self.total_volume();
        vwap(self.notional(), volume)
    }

    pub fn notional(&self) -> f64 {
        f64::from_bits(self.notional_bits.load(Ordering::Acquire))
    }

    pub fn total_volume(&self) -> u64 {
        self.volume.load(Ordering::Acquire)
    }

    pub fn trade_count(&self) -> u64 {
        self.trades.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> AccumulatorSnapshot {
        let volume = self.total_volume();
        AccumulatorSnapshot {
            notional: self.notional(),
            volume,
            trades: self.trade_count(),
        }
    }
}
