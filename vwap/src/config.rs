use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Currency pairs accepted when no explicit set is configured.
pub const DEFAULT_FX_PAIRS: [&str; 21] = [
    "EUR/USD", "USD/JPY", "GBP/USD", "USD/CHF", "AUD/USD", "USD/CAD", "NZD/USD", "EUR/GBP",
    "EUR/JPY", "GBP/JPY", "AUD/JPY", "EUR/AUD", "CHF/JPY", "GBP/CHF", "USD/TRY", "USD/ZAR",
    "USD/SGD", "USD/MXN", "USD/PLN", "EUR/TRY", "EUR/HUF",
];

/// Closed set of recognised instrument symbols, matched by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentSet {
    symbols: HashSet<String>,
}

impl InstrumentSet {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn default_fx() -> Self {
        Self::new(DEFAULT_FX_PAIRS)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Parse a comma-separated list such as `"EUR/USD, USD/JPY"`.
    /// Blank entries are skipped; an empty result is an error.
    pub fn parse_list(list: &str) -> Result<Self, ConfigError> {
        let set = Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        );

        if set.is_empty() {
            return Err(ConfigError::EmptyInstrumentSet);
        }
        Ok(set)
    }
}

impl Default for InstrumentSet {
    fn default() -> Self {
        Self::default_fx()
    }
}

/// What a batch does when it meets an invalid record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abort the batch with the first rejection. Already folded records stay.
    #[default]
    Strict,
    /// Report each rejection to the sink and keep going.
    Lenient,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Lenient => f.write_str("lenient"),
        }
    }
}

/// Construction-time settings of a [`crate::VwapEngine`].
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    /// Instruments the validator accepts. Shared, never mutated.
    pub instruments: Arc<InstrumentSet>,

    /// Default batch policy; `submit_with_policy` can override it per call.
    pub failure_policy: FailurePolicy,
}

impl EngineConfig {
    pub const POLICY_VAR: &'static str = "VWAP_FAILURE_POLICY";
    pub const INSTRUMENTS_VAR: &'static str = "VWAP_INSTRUMENTS";

    pub fn with_instruments(mut self, instruments: InstrumentSet) -> Self {
        self.instruments = Arc::new(instruments);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Read `VWAP_FAILURE_POLICY` and `VWAP_INSTRUMENTS`, falling back to
    /// defaults (with a warning) on anything unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Strict counterpart of [`EngineConfig::from_env`].
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::try_from_lookup(|key| std::env::var(key).ok())
    }

    /// [`EngineConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(Self::POLICY_VAR) {
            match raw.parse() {
                Ok(p) => cfg.failure_policy = p,
                Err(e) => warn!(error = %e, "ignoring {}", Self::POLICY_VAR),
            }
        }

        if let Some(raw) = lookup(Self::INSTRUMENTS_VAR) {
            match InstrumentSet::parse_list(&raw) {
                Ok(set) => cfg.instruments = Arc::new(set),
                Err(e) => warn!(error = %e, "ignoring {}", Self::INSTRUMENTS_VAR),
            }
        }

        cfg
    }

    /// [`EngineConfig::try_from_env`] over an arbitrary variable source.
    pub fn try_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::from_values(
            lookup(Self::POLICY_VAR).as_deref(),
            lookup(Self::INSTRUMENTS_VAR).as_deref(),
        )
    }

    /// Build from optional raw setting values; `None` keeps the default.
    pub fn from_values(
        policy: Option<&str>,
        instruments: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(raw) = policy {
            cfg.failure_policy = raw.parse()?;
        }
        if let Some(raw) = instruments {
            cfg.instruments = Arc::new(InstrumentSet::parse_list(raw)?);
        }

        Ok(cfg)
    }
}
