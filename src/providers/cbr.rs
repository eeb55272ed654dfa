use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::rates::{FetchError, RateRecord, RateSnapshot, RateSource};

/// Currency the CBR feed quotes everything against.
pub const CBR_BASE_CURRENCY: &str = "RUB";

const DAILY_ENDPOINT: &str = "/daily_json.js";
const USER_AGENT: &str = concat!("ratewatch/", env!("CARGO_PKG_VERSION"));

// CbrRateSource implementation for RateSource
pub struct CbrRateSource {
    base_url: String,
    client: reqwest::Client,
}

impl CbrRateSource {
    /// Builds the HTTP client once; every refresh reuses its connection pool.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(CbrRateSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url, DAILY_ENDPOINT)
    }
}

#[derive(Debug, Deserialize)]
struct CbrDailyResponse {
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "Valute")]
    valute: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CbrValute {
    char_code: String,
    name: String,
    value: f64,
    previous: f64,
    nominal: u32,
}

impl CbrValute {
    fn into_record(self, key: &str) -> Result<RateRecord, FetchError> {
        let code = self.char_code.trim().to_string();
        if code.is_empty() {
            return Err(FetchError::Schema(format!("Empty CharCode for entry {key}")));
        }
        if !self.value.is_finite() || self.value <= 0.0 {
            return Err(FetchError::Schema(format!(
                "Invalid Value {} for {code}",
                self.value
            )));
        }
        if !self.previous.is_finite() {
            return Err(FetchError::Schema(format!(
                "Invalid Previous {} for {code}",
                self.previous
            )));
        }
        if self.nominal == 0 {
            return Err(FetchError::Schema(format!("Zero Nominal for {code}")));
        }

        Ok(RateRecord {
            code,
            name: self.name,
            value: self.value,
            previous_value: self.previous,
            nominal: self.nominal,
        })
    }
}

/// Validates a daily feed document and turns it into a snapshot stamped with
/// `fetched_at`. Entry order follows the document.
pub fn parse_daily(text: &str, fetched_at: DateTime<Utc>) -> Result<RateSnapshot, FetchError> {
    let data: CbrDailyResponse = serde_json::from_str(text)
        .map_err(|e| FetchError::Schema(format!("Failed to parse JSON response: {e}")))?;

    if data.valute.is_empty() {
        return Err(FetchError::Schema("No currencies in Valute".to_string()));
    }

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(data.valute.len());
    for (key, entry) in data.valute {
        let valute: CbrValute = serde_json::from_value(entry)
            .map_err(|e| FetchError::Schema(format!("Malformed entry {key}: {e}")))?;
        let record = valute.into_record(&key)?;
        if !seen.insert(record.code.clone()) {
            return Err(FetchError::Schema(format!(
                "Duplicate currency code: {}",
                record.code
            )));
        }
        records.push(record);
    }

    let as_of = data
        .date
        .as_deref()
        .and_then(|date| match DateTime::parse_from_rfc3339(date) {
            Ok(dt) => Some(dt),
            Err(e) => {
                warn!("Ignoring unparseable feed date '{date}': {e}");
                None
            }
        });

    Ok(RateSnapshot::new(CBR_BASE_CURRENCY, records, fetched_at).with_as_of(as_of))
}

#[async_trait]
impl RateSource for CbrRateSource {
    #[instrument(name = "CbrRatesFetch", skip(self), fields(base_url = %self.base_url))]
    async fn fetch_snapshot(&self) -> Result<RateSnapshot, FetchError> {
        let url = self.url();
        debug!("Requesting daily rates from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("Request error: {e} for URL: {url}")))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to read response body: {e}")))?;

        let snapshot = parse_daily(&text, Utc::now())?;
        debug!(
            count = snapshot.len(),
            as_of = ?snapshot.as_of,
            "Received CBR daily rates"
        );
        Ok(snapshot)
    }
}
