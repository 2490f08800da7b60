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

//! Batch Deduplicator
//!
//! A single browser sampling tick may emit several partial snapshots
//! for the same timestamp. Collapsing them keeps the union of the
//! information observed for that tick: a field is overwritten only
//! when the incoming value is non-zero and differs, so zero ("no
//! information") never clobbers a known value.

use crate::record::{Metric, MetricRecord};
use std::collections::BTreeMap;

/// Collapse record candidates to one record per distinct timestamp
///
/// Output is sorted by timestamp; ISO-8601 strings order
/// chronologically under lexicographic comparison.
pub fn dedup_records(candidates: Vec<MetricRecord>) -> Vec<MetricRecord> {
    let mut by_timestamp: BTreeMap<String, MetricRecord> = BTreeMap::new();

    for candidate in candidates {
        match by_timestamp.entry(candidate.timestamp.clone()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                merge_into(slot.get_mut(), &candidate);
            }
        }
    }

    by_timestamp.into_values().collect()
}

fn merge_into(existing: &mut MetricRecord, incoming: &MetricRecord) {
    for metric in Metric::ALL {
        let value = incoming.get(metric);
        if value != 0.0 && value != existing.get(metric) {
            existing.set(metric, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2025-03-01T12:00:00.000Z";

    #[test]
    fn test_union_of_partial_snapshots() {
        let mut a = MetricRecord::new(TS);
        a.fps = 30.0;
        let mut b = MetricRecord::new(TS);
        b.round_trip_time = 45.0;

        let merged = dedup_records(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].fps, 30.0);
        assert_eq!(merged[0].round_trip_time, 45.0);
    }

    #[test]
    fn test_zero_never_overwrites_known_value() {
        let mut a = MetricRecord::new(TS);
        a.frames_decoded = 120.0;
        let b = MetricRecord::new(TS);

        let merged = dedup_records(vec![a, b]);
        assert_eq!(merged[0].frames_decoded, 120.0);
    }

    #[test]
    fn test_newer_nonzero_value_wins() {
        let mut a = MetricRecord::new(TS);
        a.fps = 24.0;
        let mut b = MetricRecord::new(TS);
        b.fps = 30.0;

        let merged = dedup_records(vec![a, b]);
        assert_eq!(merged[0].fps, 30.0);
    }

    #[test]
    fn test_distinct_timestamps_kept_sorted() {
        let a = MetricRecord::new("2025-03-01T12:00:02.000Z");
        let b = MetricRecord::new("2025-03-01T12:00:01.000Z");

        let merged = dedup_records(vec![a, b]);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].timestamp < merged[1].timestamp);
    }
}
