//! Exchange-rate records, snapshots and the rate source abstraction

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use thiserror::Error;

/// One currency's quote against the base currency.
///
/// `value` is the number of base units paid for `nominal` foreign units,
/// exactly as the feed publishes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub code: String,
    pub name: String,
    pub value: f64,
    pub previous_value: f64,
    pub nominal: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl RateRecord {
    /// Base units per single foreign unit.
    pub fn per_unit(&self) -> f64 {
        self.value / f64::from(self.nominal)
    }

    pub fn change(&self) -> f64 {
        self.value - self.previous_value
    }

    pub fn direction(&self) -> Direction {
        if self.value > self.previous_value {
            Direction::Up
        } else if self.value < self.previous_value {
            Direction::Down
        } else {
            Direction::Flat
        }
    }
}

/// All records fetched together at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub base_currency: String,
    pub records: Vec<RateRecord>,
    pub fetched_at: DateTime<Utc>,
    /// The publisher's own date for the quotes. Informational only.
    pub as_of: Option<DateTime<FixedOffset>>,
}

impl RateSnapshot {
    pub fn new(base_currency: &str, records: Vec<RateRecord>, fetched_at: DateTime<Utc>) -> Self {
        RateSnapshot {
            base_currency: base_currency.to_string(),
            records,
            fetched_at,
            as_of: None,
        }
    }

    pub fn with_as_of(mut self, as_of: Option<DateTime<FixedOffset>>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&RateRecord> {
        self.records.iter().find(|r| r.code == code)
    }

    /// Currency codes in snapshot order, base currency first.
    pub fn codes(&self) -> Vec<&str> {
        std::iter::once(self.base_currency.as_str())
            .chain(self.records.iter().map(|r| r.code.as_str()))
            .collect()
    }

    /// Quotes as foreign units per one base unit, keyed by currency code.
    ///
    /// The base currency itself maps to `1.0`. This is the shape the
    /// converter expects: dividing by the source quote lands in the base
    /// currency, multiplying by the target quote leaves it.
    pub fn units_per_base(&self) -> HashMap<String, f64> {
        let mut rates: HashMap<String, f64> = self
            .records
            .iter()
            .map(|r| (r.code.clone(), 1.0 / r.per_unit()))
            .collect();
        rates.insert(self.base_currency.clone(), 1.0);
        rates
    }
}

/// Why a refresh produced no snapshot.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Unexpected rate feed format: {0}")]
    Schema(String),
}

impl FetchError {
    /// Whether the failure happened on the wire rather than in the payload.
    pub fn is_network(&self) -> bool {
        !matches!(self, FetchError::Schema(_))
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<RateSnapshot, FetchError>;
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::Up => "↗",
                Direction::Down => "↘",
                Direction::Flat => "→",
            }
        )
    }
}
