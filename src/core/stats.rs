//! Aggregate statistics over a rate snapshot.
use crate::core::rates::{RateRecord, RateSnapshot};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("Cannot compute statistics over an empty rate snapshot")]
    EmptyInput,
}

/// The record that reached an extreme value and when it was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct Extreme {
    pub record: RateRecord,
    pub timestamp: DateTime<Utc>,
}

/// Maximum, minimum and mean of the quoted values in one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    pub max: Extreme,
    pub min: Extreme,
    pub average: f64,
    pub count: usize,
}

/// Computes max, min and average of `record.value` in a single pass.
///
/// Ties keep the record that appears first in the snapshot. The average is
/// held inside `[min, max]` since summing many equal values can drift past
/// them by an ulp.
pub fn compute_stats(snapshot: &RateSnapshot) -> Result<StatsSummary, StatsError> {
    let mut records = snapshot.records.iter();
    let first = records.next().ok_or(StatsError::EmptyInput)?;

    let mut max = first;
    let mut min = first;
    let mut sum = first.value;

    for record in records {
        if record.value > max.value {
            max = record;
        }
        if record.value < min.value {
            min = record;
        }
        sum += record.value;
    }

    let count = snapshot.len();
    let average = (sum / count as f64).clamp(min.value, max.value);
    debug!(
        count,
        max = %max.code,
        min = %min.code,
        average,
        "Computed rate statistics"
    );

    Ok(StatsSummary {
        max: Extreme {
            record: max.clone(),
            timestamp: snapshot.fetched_at,
        },
        min: Extreme {
            record: min.clone(),
            timestamp: snapshot.fetched_at,
        },
        average,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::tests::{record, snapshot};

    #[test]
    fn test_compute_stats() {
        let snap = snapshot(vec![
            record("USD", 81.5, 80.0, 1),
            record("EUR", 95.25, 94.0, 1),
            record("CNY", 11.25, 11.0, 1),
        ]);

        let stats = compute_stats(&snap).unwrap();
        assert_eq!(stats.max.record.code, "EUR");
        assert_eq!(stats.min.record.code, "CNY");
        assert_eq!(stats.count, 3);
        assert!((stats.average - 62.666_666_666_666_664).abs() < 1e-9);
        assert_eq!(stats.max.timestamp, snap.fetched_at);
        assert_eq!(stats.min.timestamp, snap.fetched_at);
    }

    #[test]
    fn test_single_record_is_both_extremes() {
        let snap = snapshot(vec![record("USD", 81.5, 80.0, 1)]);

        let stats = compute_stats(&snap).unwrap();
        assert_eq!(stats.max.record, stats.min.record);
        assert_eq!(stats.max.record.code, "USD");
        assert_eq!(stats.average, 81.5);
    }

    #[test]
    fn test_empty_snapshot_fails() {
        let snap = snapshot(vec![]);
        assert_eq!(compute_stats(&snap), Err(StatsError::EmptyInput));
    }

    #[test]
    fn test_ties_pick_first_record() {
        let snap = snapshot(vec![
            record("AAA", 10.0, 10.0, 1),
            record("BBB", 90.0, 90.0, 1),
            record("CCC", 90.0, 90.0, 1),
            record("DDD", 10.0, 10.0, 1),
        ]);

        for _ in 0..5 {
            let stats = compute_stats(&snap).unwrap();
            assert_eq!(stats.max.record.code, "BBB");
            assert_eq!(stats.min.record.code, "AAA");
        }
    }

    #[test]
    fn test_average_stays_between_extremes() {
        let cases = vec![
            vec![0.1, 0.1, 0.1],
            vec![1e-9, 1e9, 3.3],
            vec![0.7; 17],
            vec![52.4181, 102.3011, 0.4417, 27.1, 11.9384],
        ];

        for values in cases {
            let records = values
                .iter()
                .enumerate()
                .map(|(i, v)| record(&format!("C{i}"), *v, *v, 1))
                .collect();
            let stats = compute_stats(&snapshot(records)).unwrap();
            assert!(stats.min.record.value <= stats.average);
            assert!(stats.average <= stats.max.record.value);
        }
    }
}
