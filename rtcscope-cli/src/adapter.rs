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

//! Extension-log adapter
//!
//! The browser-extension logger writes one flat JSON array of
//! heterogeneous entries tagged by `type`. Entries tagged `"stats"`
//! carry a `pcId` (peer-connection identifier) and a `rawStats`
//! mapping. This adapter reshapes that layout into the snapshot-batch
//! form the normalizer expects: one batch per connection, each entry
//! keyed by its timestamp or, when the logger omitted one, a generated
//! placeholder key. Pure reshaping; no derived computation happens
//! here.

use rtcscope_core::{Result, RtcscopeError, SnapshotEntry};
use serde_json::Value;
use std::collections::BTreeMap;

/// Per-connection snapshot batches, keyed by `pcId`
pub type ConnectionBatches = BTreeMap<String, Vec<SnapshotEntry>>;

/// Fallback connection id for stats entries missing a `pcId`
const UNKNOWN_CONNECTION: &str = "unknown";

/// Reshape an extension log into per-connection snapshot batches
///
/// Non-`stats` entries (console lines, ice events, ...) are ignored.
/// A non-array top level is a fatal input error, same as for the
/// primary input format.
pub fn group_stats_entries(value: Value) -> Result<ConnectionBatches> {
    let items = match value {
        Value::Array(items) => items,
        _ => {
            return Err(RtcscopeError::InvalidShape(
                "expected a top-level JSON array of log entries".to_string(),
            ))
        }
    };

    let mut batches = ConnectionBatches::new();
    for item in items {
        let Some(entry) = item.as_object() else {
            continue;
        };
        if entry.get("type").and_then(Value::as_str) != Some("stats") {
            continue;
        }

        let pc_id = match entry.get("pcId") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => UNKNOWN_CONNECTION.to_string(),
        };

        let raw_stats = entry
            .get("rawStats")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let batch = batches.entry(pc_id).or_default();
        let timestamp = match entry.get("timestamp").and_then(Value::as_str) {
            Some(ts) if !ts.is_empty() => ts.to_string(),
            // Placeholder keys keep the record but leave every
            // time-derived field at 0 downstream.
            _ => format!("entry-{}", batch.len()),
        };

        batch.push(SnapshotEntry {
            timestamp,
            raw_stats,
        });
    }

    Ok(batches)
}
