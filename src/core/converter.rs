//! Cross-rate currency conversion through the base currency.
use std::collections::HashMap;
use std::fmt::Display;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConversionError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Invalid rate {rate} for currency: {code}")]
    InvalidRate { code: String, rate: f64 },
}

fn lookup(rates: &HashMap<String, f64>, code: &str) -> Result<f64, ConversionError> {
    let rate = *rates
        .get(code)
        .ok_or_else(|| ConversionError::UnknownCurrency(code.to_string()))?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ConversionError::InvalidRate {
            code: code.to_string(),
            rate,
        });
    }
    Ok(rate)
}

/// Converts `amount` of `from` into `to` as `amount / rates[from] * rates[to]`.
///
/// Both codes must be present in `rates`; a missing code is an error and no
/// value is produced. Converting a currency into itself returns `amount`
/// unchanged.
pub fn convert(
    amount: f64,
    from: &str,
    to: &str,
    rates: &HashMap<String, f64>,
) -> Result<f64, ConversionError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ConversionError::InvalidAmount(amount));
    }

    let rate_from = lookup(rates, from)?;
    let rate_to = lookup(rates, to)?;

    if from == to {
        return Ok(amount);
    }

    let result = (amount / rate_from) * rate_to;
    debug!("Converted {amount} {from} to {result} {to} (rates {rate_from}, {rate_to})");
    Ok(result)
}

/// A pending conversion as entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

impl ConversionRequest {
    pub fn new(amount: f64, from: &str, to: &str) -> Self {
        ConversionRequest {
            amount,
            from: from.trim().to_uppercase(),
            to: to.trim().to_uppercase(),
        }
    }

    pub fn apply(&self, rates: &HashMap<String, f64>) -> Result<f64, ConversionError> {
        convert(self.amount, &self.from, &self.to, rates)
    }
}

impl Display for ConversionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} -> {}", self.amount, self.from, self.to)
    }
}
