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

//! Snapshot Normalizer
//!
//! Turns a raw snapshot batch into one `MetricRecord` candidate per
//! entry, in timestamp order. Rates are derived from consecutive
//! cumulative counters against a batch-local [`CarryState`]; nothing
//! here survives across invocations, so the first record of every
//! batch has no rate reference and reports 0 for all derived rates.
//!
//! Rate invariants:
//! - the elapsed-time denominator must be strictly positive
//! - a negative counter delta (counter reset) yields 0, never a
//!   negative rate
//! - an unparseable timestamp disables the time-derived fields of that
//!   record only; the record itself is kept

use crate::record::MetricRecord;
use crate::snapshot::SnapshotEntry;
use chrono::{DateTime, Utc};
use serde_json::Value;

const BITS_PER_BYTE: f64 = 8.0;
const MEGABIT: f64 = 1_000_000.0;

/// Previous-value tracking threaded through one normalization pass
///
/// Holds the last cumulative counters and capture time seen in the
/// current batch. Any field may be `None`: before the first video
/// inbound report, after an entry whose report dropped the counter,
/// or after an entry whose timestamp failed to parse.
#[derive(Debug, Clone, Default)]
pub struct CarryState {
    pub prev_time: Option<DateTime<Utc>>,
    pub prev_bytes: Option<f64>,
    pub prev_frames_received: Option<f64>,
    pub prev_frames_decoded: Option<f64>,
}

impl CarryState {
    /// Seconds elapsed since the previous capture, if both ends are
    /// known and the clock moved forward
    fn elapsed_secs(&self, now: Option<DateTime<Utc>>) -> Option<f64> {
        let now = now?;
        let prev = self.prev_time?;
        let secs = (now - prev).num_milliseconds() as f64 / 1000.0;
        (secs > 0.0).then_some(secs)
    }
}

/// Rate from a cumulative counter delta, guarding against resets
fn counter_rate(current: f64, previous: Option<f64>, elapsed: Option<f64>) -> f64 {
    match (previous, elapsed) {
        (Some(prev), Some(secs)) => {
            let delta = current - prev;
            if delta >= 0.0 {
                delta / secs
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Normalize one snapshot batch into record candidates
///
/// Entries are sorted by timestamp before the pass so that counter
/// deltas are taken between chronologically adjacent captures.
/// Entries without a timestamp are skipped silently. The output is
/// pre-deduplication: one candidate per surviving entry.
pub fn normalize_batch(entries: &[SnapshotEntry]) -> Vec<MetricRecord> {
    let mut sorted: Vec<&SnapshotEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let mut carry = CarryState::default();
    let mut records = Vec::with_capacity(sorted.len());
    for entry in sorted {
        if let Some(record) = normalize_entry(entry, &mut carry) {
            records.push(record);
        }
    }
    records
}

/// Normalize a single entry against the running carry state
///
/// Returns `None` for entries lacking a timestamp. Public so the
/// carry-state handling can be exercised directly in tests.
pub fn normalize_entry(entry: &SnapshotEntry, carry: &mut CarryState) -> Option<MetricRecord> {
    if entry.timestamp.is_empty() {
        return None;
    }

    let now = parse_timestamp(&entry.timestamp);
    if now.is_none() {
        tracing::debug!(
            timestamp = %entry.timestamp,
            "unparseable timestamp; time-derived fields disabled for this record"
        );
    }

    let mut record = MetricRecord::new(entry.timestamp.clone());

    for report in entry.raw_stats.values() {
        match SnapshotEntry::report_str(report, "type") {
            Some("inbound-rtp") => {
                if SnapshotEntry::report_str(report, "kind") == Some("video") {
                    apply_video_inbound(report, &mut record, carry, now);
                }
            }
            Some("candidate-pair") => {
                if let Some(rtt_secs) = SnapshotEntry::report_num(report, "currentRoundTripTime") {
                    record.round_trip_time = rtt_secs * 1000.0;
                }
            }
            _ => {}
        }
    }

    Some(record)
}

/// Fold one video inbound-rtp report into the record and advance the
/// carry state
fn apply_video_inbound(
    report: &Value,
    record: &mut MetricRecord,
    carry: &mut CarryState,
    now: Option<DateTime<Utc>>,
) {
    let elapsed = carry.elapsed_secs(now);

    if let Some(fps) = SnapshotEntry::report_num(report, "framesPerSecond") {
        record.fps = fps;
    }

    let frames_received = SnapshotEntry::report_num(report, "framesReceived");
    if let Some(frames) = frames_received {
        record.frames_received = frames;
        record.frames_received_per_second =
            counter_rate(frames, carry.prev_frames_received, elapsed);
    }

    let frames_decoded = SnapshotEntry::report_num(report, "framesDecoded");
    if let Some(frames) = frames_decoded {
        record.frames_decoded = frames;
        record.frames_decoded_per_second = counter_rate(frames, carry.prev_frames_decoded, elapsed);
    }

    if let Some(dropped) = SnapshotEntry::report_num(report, "framesDropped") {
        record.frames_dropped = dropped;
    }

    if let Some(total_decode) = SnapshotEntry::report_num(report, "totalDecodeTime") {
        if let Some(decoded) = frames_decoded.filter(|d| *d > 0.0) {
            record.decode_time = total_decode / decoded;
        }
    }

    if let Some(bytes) = SnapshotEntry::report_num(report, "bytesReceived") {
        if let (Some(prev), Some(secs)) = (carry.prev_bytes, elapsed) {
            // Clamp at 0 so a byte-counter reset never yields a
            // negative bitrate.
            let delta = (bytes - prev).max(0.0);
            record.bitrate_received = delta * BITS_PER_BYTE / (secs * MEGABIT);
        }
        carry.prev_bytes = Some(bytes);
    }

    // Carry fields take whatever this report had, including absence:
    // a dropped counter breaks the delta chain rather than pairing
    // non-adjacent samples.
    carry.prev_frames_received = frames_received;
    carry.prev_frames_decoded = frames_decoded;
    carry.prev_time = now;
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
