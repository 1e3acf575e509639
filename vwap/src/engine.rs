//! VwapEngine
//!
//! Batch orchestration on top of the bucket store.
//! Responsibilities:
//!   • Validate each record of a batch, in array order
//!   • Resolve the `(instrument, hour)` bucket of every valid trade
//!   • Fold the trade into that bucket's accumulator
//!   • Apply the failure policy to invalid records (abort or report & skip)
//!   • Serve snapshots and single-bucket lookups
//!
//! The engine is `Send + Sync` and meant to be shared (by reference or
//! `Arc`) between any number of submitting threads.

use std::collections::HashMap;
use std::sync::Arc;

use common::logger::{TraceId, child_span, root_span};
use serde::Serialize;
use tracing::{debug, warn};

use crate::bucket::BucketKey;
use crate::config::{EngineConfig, FailurePolicy};
use crate::error::{BatchError, TradeError};
use crate::sink::{RejectionSink, TracingSink};
use crate::store::{BucketSnapshot, BucketStore};
use crate::types::{ParsedTrade, RawTradeRecord};
use crate::validator::TradeValidator;

/// Outcome of a batch that was not aborted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub accepted: usize,
    pub rejected: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.accepted + self.rejected
    }

    pub fn merge(self, other: BatchReport) -> BatchReport {
        BatchReport {
            accepted: self.accepted + other.accepted,
            rejected: self.rejected + other.rejected,
        }
    }
}

pub struct VwapEngine {
    validator: TradeValidator,
    store: BucketStore,
    policy: FailurePolicy,
    sink: Arc<dyn RejectionSink>,
}

impl VwapEngine {
    /// Engine whose lenient-mode rejections go to [`TracingSink`].
    pub fn new(config: EngineConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    pub fn with_sink(config: EngineConfig, sink: Arc<dyn RejectionSink>) -> Self {
        debug!(
            instruments = config.instruments.len(),
            policy = %config.failure_policy,
            "vwap engine created"
        );

        Self {
            validator: TradeValidator::new(config.instruments),
            store: BucketStore::new(),
            policy: config.failure_policy,
            sink,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Submit a batch under the configured failure policy.
    pub fn submit(&self, records: &[RawTradeRecord]) -> Result<BatchReport, BatchError> {
        self.submit_with_policy(records, self.policy)
    }

    /// Submit a batch under an explicit failure policy.
    ///
    /// Strict: the first invalid record ends the batch with a [`BatchError`];
    /// trades folded before it stay folded. Lenient: every invalid record
    /// goes to the sink and the rest of the batch is processed.
    pub fn submit_with_policy(
        &self,
        records: &[RawTradeRecord],
        policy: FailurePolicy,
    ) -> Result<BatchReport, BatchError> {
        let trace_id = TraceId::new();
        let span = root_span("submit", &trace_id);
        span.record("records", records.len());
        let _guard = span.enter();

        let mut report = BatchReport::default();

        for (index, record) in records.iter().enumerate() {
            match self.validator.validate(record) {
                Ok(trade) => {
                    self.fold(&trade);
                    report.accepted += 1;
                }
                Err(source) => match policy {
                    FailurePolicy::Strict => {
                        warn!(
                            index,
                            record = %record,
                            kind = %source.kind(),
                            accepted = report.accepted,
                            "batch aborted on invalid record"
                        );
                        return Err(BatchError {
                            index,
                            record: record.clone(),
                            source,
                        });
                    }
                    FailurePolicy::Lenient => {
                        self.sink.on_rejected(index, record, &source);
                        report.rejected += 1;
                    }
                },
            }
        }

        span.record("accepted", report.accepted);
        debug!(
            accepted = report.accepted,
            rejected = report.rejected,
            %policy,
            "batch folded"
        );

        Ok(report)
    }

    fn fold(&self, trade: &ParsedTrade) {
        let key = BucketKey::resolve(&trade.instrument, trade.time);
        self.store
            .with_accumulator(&key, |acc| acc.add_trade(trade.price, trade.volume));
    }

    /// Current VWAP of every bucket, keyed `"<INSTRUMENT> <h:00 AM/PM>"`.
    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.buckets()
            .into_iter()
            .map(|b| (b.display_key(), b.vwap))
            .collect()
    }

    /// Structured snapshot, ordered by instrument then hour.
    pub fn buckets(&self) -> Vec<BucketSnapshot> {
        let _span = child_span("snapshot").entered();
        self.store.buckets()
    }

    /// VWAP of the bucket containing `time` for `instrument`.
    ///
    /// Both arguments are validated like a record's fields; an untouched
    /// bucket yields `0.0`.
    pub fn lookup(&self, instrument: &str, time: &str) -> Result<f64, TradeError> {
        let time = self.validator.parse_time(time)?;
        self.validator.check_instrument(instrument)?;

        let key = BucketKey::resolve(instrument, time);
        Ok(self.store.peek(&key, |acc| acc.value()).unwrap_or(0.0))
    }

    pub fn bucket_count(&self) -> usize {
        self.store.bucket_count()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
