//! Hourly volume-weighted average price aggregation for currency-pair trades.
//!
//! Raw string records are validated, resolved to an `(instrument, hour)`
//! bucket and folded into a lock-free accumulator. Any number of threads may
//! submit batches to the same [`VwapEngine`] concurrently.

pub mod accumulator;
pub mod bucket;
pub mod config;
pub mod engine;
pub mod error;
pub mod sink;
pub mod store;
pub mod types;
pub mod validator;

pub use accumulator::Accumulator;
pub use bucket::BucketKey;
pub use config::{EngineConfig, FailurePolicy, InstrumentSet};
pub use engine::{BatchReport, VwapEngine};
pub use error::{BatchError, ConfigError, RejectionKind, TradeError};
pub use sink::{CollectingSink, Rejection, RejectionSink, TracingSink};
pub use store::{BucketSnapshot, BucketStore};
pub use types::{ParsedTrade, RawTradeRecord, TradeTime};
pub use validator::TradeValidator;
