use std::sync::Arc;

use crate::config::InstrumentSet;
use crate::error::TradeError;
use crate::types::{ParsedTrade, RawTradeRecord, TradeTime};

/// Turns raw string records into [`ParsedTrade`]s.
///
/// Checks run in a fixed order (field count, time, instrument, price,
/// volume) and the first failure is the one reported. Nothing is trimmed
/// or coerced.
#[derive(Debug, Clone)]
pub struct TradeValidator {
    instruments: Arc<InstrumentSet>,
}

impl TradeValidator {
    pub fn new(instruments: Arc<InstrumentSet>) -> Self {
        Self { instruments }
    }

    pub fn validate(&self, record: &RawTradeRecord) -> Result<ParsedTrade, TradeError> {
        let [time, instrument, price, volume] = record.fields() else {
            return Err(TradeError::MalformedRecord {
                fields: record.len(),
            });
        };

        let time = self.parse_time(time)?;
        self.check_instrument(instrument)?;
        let price_text = price;
        let price = self.parse_price(price)?;
        let volume = self.parse_volume(volume)?;

        // the accumulator's numerator must stay finite
        if !(price * f64::from(volume)).is_finite() {
            return Err(TradeError::InvalidPrice(price_text.clone()));
        }

        Ok(ParsedTrade {
            time,
            instrument: instrument.clone(),
            price,
            volume,
        })
    }

    pub fn parse_time(&self, text: &str) -> Result<TradeTime, TradeError> {
        text.parse()
    }

    pub fn check_instrument(&self, text: &str) -> Result<(), TradeError> {
        if self.instruments.contains(text) {
            Ok(())
        } else {
            Err(TradeError::InvalidInstrument(text.to_string()))
        }
    }

    /// Finite and strictly positive.
    pub fn parse_price(&self, text: &str) -> Result<f64, TradeError> {
        match text.parse::<f64>() {
            Ok(p) if p.is_finite() && p > 0.0 => Ok(p),
            _ => Err(TradeError::InvalidPrice(text.to_string())),
        }
    }

    /// Whole number in `1..=u32::MAX`.
    pub fn parse_volume(&self, text: &str) -> Result<u32, TradeError> {
        match text.parse::<u32>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(TradeError::InvalidVolume(text.to_string())),
        }
    }
}
