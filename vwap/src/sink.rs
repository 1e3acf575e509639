//! Side channel for records skipped in lenient mode.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

use crate::error::{RejectionKind, TradeError};
use crate::types::RawTradeRecord;

/// Receives every record a lenient batch skips.
///
/// Called synchronously on the submitting thread, possibly from several
/// threads at once.
pub trait RejectionSink: Send + Sync {
    fn on_rejected(&self, index: usize, record: &RawTradeRecord, reason: &TradeError);
}

impl<F> RejectionSink for F
where
    F: Fn(usize, &RawTradeRecord, &TradeError) + Send + Sync,
{
    fn on_rejected(&self, index: usize, record: &RawTradeRecord, reason: &TradeError) {
        self(index, record, reason)
    }
}

/// Default sink: one `warn` event per rejected record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl RejectionSink for TracingSink {
    fn on_rejected(&self, index: usize, record: &RawTradeRecord, reason: &TradeError) {
        warn!(
            target: "vwap::rejected",
            index,
            record = %record,
            kind = %reason.kind(),
            reason = %reason,
            "trade record rejected"
        );
    }
}

/// A captured rejection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    /// Position of the record inside its batch.
    pub index: usize,
    pub record: RawTradeRecord,
    pub kind: RejectionKind,
    pub reason: String,
}

/// Keeps every rejection in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    rejections: Mutex<Vec<Rejection>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejections(&self) -> Vec<Rejection> {
        self.rejections.lock().clone()
    }

    pub fn kinds(&self) -> Vec<RejectionKind> {
        self.rejections.lock().iter().map(|r| r.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.rejections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rejections.lock().is_empty()
    }

    /// Drain everything collected so far.
    pub fn take(&self) -> Vec<Rejection> {
        std::mem::take(&mut *self.rejections.lock())
    }
}

impl RejectionSink for CollectingSink {
    fn on_rejected(&self, index: usize, record: &RawTradeRecord, reason: &TradeError) {
        self.rejections.lock().push(Rejection {
            index,
            record: record.clone(),
            kind: reason.kind(),
            reason: reason.to_string(),
        });
    }
}
