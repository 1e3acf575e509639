use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::RawTradeRecord;

/// Why a single trade record could not be aggregated.
///
/// None of these are fatal to the engine; they only concern the one record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    #[error("malformed record: expected 4 fields, got {fields}")]
    MalformedRecord { fields: usize },

    #[error("invalid trade time: {0:?}")]
    InvalidTime(String),

    #[error("invalid currency pair: {0:?}")]
    InvalidInstrument(String),

    #[error("invalid trade price: {0:?}")]
    InvalidPrice(String),

    #[error("invalid trade volume: {0:?}")]
    InvalidVolume(String),
}

impl TradeError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::MalformedRecord { .. } => RejectionKind::MalformedRecord,
            Self::InvalidTime(_) => RejectionKind::InvalidTime,
            Self::InvalidInstrument(_) => RejectionKind::InvalidInstrument,
            Self::InvalidPrice(_) => RejectionKind::InvalidPrice,
            Self::InvalidVolume(_) => RejectionKind::InvalidVolume,
        }
    }
}

/// Field-free discriminant of [`TradeError`], handy for matching and counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RejectionKind {
    MalformedRecord,
    InvalidTime,
    InvalidInstrument,
    InvalidPrice,
    InvalidVolume,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedRecord => "MalformedRecord",
            Self::InvalidTime => "InvalidTime",
            Self::InvalidInstrument => "InvalidInstrument",
            Self::InvalidPrice => "InvalidPrice",
            Self::InvalidVolume => "InvalidVolume",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict-mode batch abort. Records before `index` remain folded in.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("record {index} rejected: {source}")]
pub struct BatchError {
    pub index: usize,
    pub record: RawTradeRecord,
    #[source]
    pub source: TradeError,
}

impl BatchError {
    pub fn kind(&self) -> RejectionKind {
        self.source.kind()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("instrument set must not be empty")]
    EmptyInstrumentSet,

    #[error("unknown failure policy: {0:?} (expected \"strict\" or \"lenient\")")]
    UnknownPolicy(String),
}
