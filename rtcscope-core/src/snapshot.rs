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

//! Raw snapshot batch decoding
//!
//! A snapshot batch is a JSON array of entries, each carrying an
//! ISO-8601 `timestamp` and a `rawStats` object mapping opaque report
//! ids to `getStats()` report objects. Report objects are kept as raw
//! JSON maps on purpose: a report field of the wrong type must degrade
//! to "value absent" during normalization, not fail the whole batch.

use crate::error::{Result, RtcscopeError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// One timestamped capture of connection statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// ISO-8601 capture time; entries without one are skipped later
    #[serde(default)]
    pub timestamp: String,

    /// Report-id -> report object, as emitted by `getStats()`
    #[serde(default, rename = "rawStats")]
    pub raw_stats: serde_json::Map<String, Value>,
}

impl SnapshotEntry {
    /// String field of a report, if present and actually a string
    pub fn report_str<'a>(report: &'a Value, field: &str) -> Option<&'a str> {
        report.get(field).and_then(Value::as_str)
    }

    /// Numeric field of a report, if present and actually a number.
    /// Anything else (missing, string, bool, ...) reads as `None`.
    pub fn report_num(report: &Value, field: &str) -> Option<f64> {
        report.get(field).and_then(Value::as_f64)
    }
}

/// Decode a snapshot batch from a JSON value
///
/// A top-level value that is not an array is a fatal input error.
/// Individual entries that are not objects are dropped with a debug
/// note; they carry nothing the normalizer could use.
pub fn parse_snapshot_batch(value: Value) -> Result<Vec<SnapshotEntry>> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(RtcscopeError::InvalidShape(format!(
                "expected a top-level JSON array, got {}",
                json_type_name(&other)
            )))
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<SnapshotEntry>(item) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::debug!("dropping non-object snapshot entry: {e}");
            }
        }
    }
    Ok(entries)
}

/// Read and decode a snapshot batch file
pub fn load_snapshot_batch(path: impl AsRef<Path>) -> Result<Vec<SnapshotEntry>> {
    let raw = fs::read_to_string(path.as_ref())?;
    let value: Value = serde_json::from_str(&raw)?;
    parse_snapshot_batch(value)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
