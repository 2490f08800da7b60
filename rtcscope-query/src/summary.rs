// Copyright 2025 Rtcscope Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Summary Engine
//!
//! Recomputes per-metric aggregate statistics over the entire store on
//! every invocation. The store is re-read from durable form first, so
//! the summary is correct for sessions built across many independent
//! process runs.
//!
//! Zero is "metric not active yet" (streams report structural zeros
//! before media flows), so only strictly positive values enter the
//! statistics and all-zero metrics are omitted from the report
//! entirely. `num_samples` still counts every persisted row.
//!
//! Percentiles use linear interpolation between order statistics (the
//! inclusive method). Labels are the true upper ranks p50/p75/p99/p99.9.

use rtcscope_core::{Metric, Result};
use rtcscope_storage::{SampleStore, StoredRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Aggregates for one metric, over its non-zero values only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    /// Sample standard deviation; 0 when only one value qualifies
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
    pub p50: f64,
    pub p75: f64,
    pub p99: f64,
    pub p99_9: f64,
}

/// Full summary artifact for one store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryReport {
    /// Total persisted rows, zero-valued rows included
    pub num_samples: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_timestamp: Option<String>,

    /// Set instead of the metric map when the store holds no rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(flatten)]
    pub metrics: BTreeMap<String, MetricSummary>,
}

/// Recompute the summary from the durable store
pub fn summarize_store(store: &SampleStore) -> Result<SummaryReport> {
    Ok(summarize_rows(&store.read_all()?))
}

/// Summary over already-loaded rows
pub fn summarize_rows(rows: &[StoredRecord]) -> SummaryReport {
    if rows.is_empty() {
        return SummaryReport {
            num_samples: 0,
            error: Some("No data available for summary".to_string()),
            ..Default::default()
        };
    }

    let mut report = SummaryReport {
        num_samples: rows.len(),
        first_timestamp: rows.first().map(|r| r.record.timestamp.clone()),
        latest_timestamp: rows.last().map(|r| r.record.timestamp.clone()),
        ..Default::default()
    };

    for metric in Metric::ALL {
        let mut values: Vec<f64> = rows
            .iter()
            .map(|row| row.record.get(metric))
            .filter(|v| *v > 0.0)
            .collect();
        if values.is_empty() {
            continue;
        }
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        report
            .metrics
            .insert(metric.as_str().to_string(), summarize_values(&values));
    }

    report
}

/// Aggregates over one sorted, non-empty value set
fn summarize_values(sorted: &[f64]) -> MetricSummary {
    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;

    let std = if count > 1 {
        let variance = sorted
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / (count - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    MetricSummary {
        mean: round2(mean),
        std: round2(std),
        min: round2(sorted[0]),
        max: round2(sorted[count - 1]),
        count,
        p50: round2(percentile(sorted, 50.0)),
        p75: round2(percentile(sorted, 75.0)),
        p99: round2(percentile(sorted, 99.0)),
        p99_9: round2(percentile(sorted, 99.9)),
    }
}

/// Percentile of a sorted slice by linear interpolation between order
/// statistics (inclusive method; matches numpy's default)
///
/// `q` is a rank in [0, 100]. The slice must be sorted ascending and
/// non-empty.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}

/// Write the summary artifact as pretty-printed JSON, replacing any
/// previous version
pub fn write_summary(path: impl AsRef<Path>, report: &SummaryReport) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let data = serde_json::to_string_pretty(report)?;
    fs::write(path, data)?;
    Ok(())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcscope_core::MetricRecord;

    fn row(sample_id: u64, ts: &str, decoded_rate: f64, rtt: f64) -> StoredRecord {
        let mut record = MetricRecord::new(ts);
        record.frames_decoded_per_second = decoded_rate;
        record.round_trip_time = rtt;
        StoredRecord { sample_id, record }
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&values, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&values, 0.0) - 1.0).abs() < 1e-12);
        assert!((percentile(&values, 100.0) - 4.0).abs() < 1e-12);
        assert!((percentile(&values, 25.0) - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_of_identical_values() {
        let values = [7.0; 13];
        for q in [0.0, 50.0, 75.0, 99.0, 99.9, 100.0] {
            assert_eq!(percentile(&values, q), 7.0);
        }
    }

    #[test]
    fn test_zero_values_excluded_and_all_zero_metric_omitted() {
        let rows = vec![
            row(0, "2025-03-01T12:00:00.000Z", 0.0, 0.0),
            row(1, "2025-03-01T12:00:01.000Z", 50.0, 0.0),
            row(2, "2025-03-01T12:00:02.000Z", 70.0, 0.0),
        ];
        let report = summarize_rows(&rows);

        assert_eq!(report.num_samples, 3);
        let stats = &report.metrics["frames_decoded_per_second"];
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, 60.0);
        // round_trip_time never rose above 0, so it is absent.
        assert!(!report.metrics.contains_key("round_trip_time"));
    }

    #[test]
    fn test_single_value_has_zero_std() {
        let rows = vec![row(0, "2025-03-01T12:00:00.000Z", 30.0, 0.0)];
        let stats = &summarize_rows(&rows).metrics["frames_decoded_per_second"];
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.min, 30.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.p99_9, 30.0);
    }

    #[test]
    fn test_sample_std() {
        let rows = vec![
            row(0, "2025-03-01T12:00:00.000Z", 50.0, 0.0),
            row(1, "2025-03-01T12:00:01.000Z", 70.0, 0.0),
        ];
        let stats = &summarize_rows(&rows).metrics["frames_decoded_per_second"];
        // Sample std of {50, 70} is sqrt(200) = 14.14...
        assert_eq!(stats.std, 14.14);
    }

    #[test]
    fn test_timestamp_range() {
        let rows = vec![
            row(0, "2025-03-01T12:00:00.000Z", 1.0, 0.0),
            row(1, "2025-03-01T12:00:05.000Z", 2.0, 0.0),
        ];
        let report = summarize_rows(&rows);
        assert_eq!(
            report.first_timestamp.as_deref(),
            Some("2025-03-01T12:00:00.000Z")
        );
        assert_eq!(
            report.latest_timestamp.as_deref(),
            Some("2025-03-01T12:00:05.000Z")
        );
        assert!(report.error.is_none());
    }

    #[test]
    fn test_empty_store_yields_no_data_marker() {
        let report = summarize_rows(&[]);
        assert_eq!(report.num_samples, 0);
        assert!(report.error.is_some());
        assert!(report.metrics.is_empty());
    }

    #[test]
    fn test_artifact_shape() {
        let rows = vec![
            row(0, "2025-03-01T12:00:00.000Z", 50.0, 45.0),
            row(1, "2025-03-01T12:00:01.000Z", 70.0, 48.0),
        ];
        let report = summarize_rows(&rows);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["num_samples"], 2);
        assert_eq!(json["frames_decoded_per_second"]["mean"], 60.0);
        assert_eq!(json["round_trip_time"]["count"], 2);
        assert!(json["frames_decoded_per_second"]["p99_9"].is_number());
        // Omitted metrics leave no key behind.
        assert!(json.get("fps").is_none());
    }
}
