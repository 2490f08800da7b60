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

//! Integration tests for the full ingestion pipeline:
//! normalize -> deduplicate -> store merge -> summary.

use rtcscope_core::{dedup_records, normalize_batch, parse_snapshot_batch, SnapshotEntry};
use rtcscope_query::{summarize_store, write_summary};
use rtcscope_storage::SampleStore;
use serde_json::json;
use tempfile::TempDir;

fn video_batch(frames_received: &[u64]) -> Vec<SnapshotEntry> {
    let entries: Vec<serde_json::Value> = frames_received
        .iter()
        .enumerate()
        .map(|(i, frames)| {
            json!({
                "timestamp": format!("2025-03-01T12:00:{i:02}.000Z"),
                "rawStats": {
                    "RTCInboundRTPVideoStream_1": {
                        "type": "inbound-rtp",
                        "kind": "video",
                        "framesReceived": frames
                    }
                }
            })
        })
        .collect();
    parse_snapshot_batch(json!(entries)).unwrap()
}

fn ingest(store: &SampleStore, batch: &[SnapshotEntry]) -> usize {
    let records = dedup_records(normalize_batch(batch));
    store.append(&records).unwrap()
}

/// Spec scenario: framesReceived 0, 50, 120 one second apart yields
/// per-second rates 0, 50, 70 and a zero-excluded mean of 60.00.
#[test]
fn test_end_to_end_rates_and_summary() {
    let dir = TempDir::new().unwrap();
    let store = SampleStore::new(dir.path().join("webrtc_data.csv"));

    let appended = ingest(&store, &video_batch(&[0, 50, 120]));
    assert_eq!(appended, 3);

    let rows = store.read_all().unwrap();
    assert_eq!(rows.len(), 3);
    let rates: Vec<f64> = rows
        .iter()
        .map(|r| r.record.frames_received_per_second)
        .collect();
    assert_eq!(rates, vec![0.0, 50.0, 70.0]);

    let report = summarize_store(&store).unwrap();
    assert_eq!(report.num_samples, 3);
    assert_eq!(report.metrics["frames_received_per_second"].mean, 60.0);
    assert_eq!(report.metrics["frames_received_per_second"].count, 2);
}

/// Re-ingesting the identical batch appends nothing and leaves the
/// summary byte-for-byte unchanged.
#[test]
fn test_idempotent_reingestion() {
    let dir = TempDir::new().unwrap();
    let store = SampleStore::new(dir.path().join("webrtc_data.csv"));
    let summary_path = dir.path().join("webrtc_summary.json");
    let batch = video_batch(&[0, 50, 120]);

    assert_eq!(ingest(&store, &batch), 3);
    write_summary(&summary_path, &summarize_store(&store).unwrap()).unwrap();
    let first = std::fs::read_to_string(&summary_path).unwrap();

    assert_eq!(ingest(&store, &batch), 0);
    write_summary(&summary_path, &summarize_store(&store).unwrap()).unwrap();
    let second = std::fs::read_to_string(&summary_path).unwrap();

    assert_eq!(first, second);
    assert_eq!(store.read_all().unwrap().len(), 3);
}

/// Overlapping batches across invocations: only the genuinely new
/// timestamps land, and the summary spans the whole accumulated store.
#[test]
fn test_aggregation_across_invocations() {
    let dir = TempDir::new().unwrap();
    let store = SampleStore::new(dir.path().join("webrtc_data.csv"));

    assert_eq!(ingest(&store, &video_batch(&[0, 50])), 2);

    // Second capture overlaps the first two ticks and adds two more.
    assert_eq!(ingest(&store, &video_batch(&[0, 50, 120, 180])), 2);

    let rows = store.read_all().unwrap();
    assert_eq!(rows.len(), 4);
    let ids: Vec<u64> = rows.iter().map(|r| r.sample_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);

    let report = summarize_store(&store).unwrap();
    assert_eq!(report.num_samples, 4);
    assert_eq!(
        report.first_timestamp.as_deref(),
        Some("2025-03-01T12:00:00.000Z")
    );
    assert_eq!(
        report.latest_timestamp.as_deref(),
        Some("2025-03-01T12:00:03.000Z")
    );
}

/// Dedup union inside one batch survives all the way into the store.
#[test]
fn test_partial_snapshots_merge_before_persisting() {
    let dir = TempDir::new().unwrap();
    let store = SampleStore::new(dir.path().join("webrtc_data.csv"));

    let batch = parse_snapshot_batch(json!([
        {
            "timestamp": "2025-03-01T12:00:00.000Z",
            "rawStats": {
                "v1": {"type": "inbound-rtp", "kind": "video", "framesPerSecond": 30}
            }
        },
        {
            "timestamp": "2025-03-01T12:00:00.000Z",
            "rawStats": {
                "cp1": {"type": "candidate-pair", "currentRoundTripTime": 0.045}
            }
        }
    ]))
    .unwrap();

    assert_eq!(ingest(&store, &batch), 1);
    let rows = store.read_all().unwrap();
    assert_eq!(rows[0].record.fps, 30.0);
    assert_eq!(rows[0].record.round_trip_time, 45.0);
}

/// An empty store still produces a parseable summary artifact.
#[test]
fn test_empty_store_summary_artifact() {
    let dir = TempDir::new().unwrap();
    let store = SampleStore::new(dir.path().join("webrtc_data.csv"));
    let summary_path = dir.path().join("webrtc_summary.json");

    let report = summarize_store(&store).unwrap();
    write_summary(&summary_path, &report).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(value["num_samples"], 0);
    assert!(value["error"].is_string());
}
