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

//! Canonical per-timestamp metric record
//!
//! One `MetricRecord` is produced per snapshot timestamp. Counters and
//! rates that were absent from the snapshot are held as 0; downstream
//! consumers treat 0 as "no information".

use serde::{Deserialize, Serialize};

/// The tracked metrics, in store-column order
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Metric {
    Fps,
    FramesReceived,
    FramesDecoded,
    FramesDropped,
    DecodeTime,
    BitrateReceived,
    RoundTripTime,
    FramesReceivedPerSecond,
    FramesDecodedPerSecond,
}

impl Metric {
    /// Every tracked metric, in the order columns appear in the store
    pub const ALL: [Metric; 9] = [
        Metric::Fps,
        Metric::FramesReceived,
        Metric::FramesDecoded,
        Metric::FramesDropped,
        Metric::DecodeTime,
        Metric::BitrateReceived,
        Metric::RoundTripTime,
        Metric::FramesReceivedPerSecond,
        Metric::FramesDecodedPerSecond,
    ];

    /// Store column / summary key for this metric
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Fps => "fps",
            Metric::FramesReceived => "frames_received",
            Metric::FramesDecoded => "frames_decoded",
            Metric::FramesDropped => "frames_dropped",
            Metric::DecodeTime => "decode_time",
            Metric::BitrateReceived => "bitrate_received",
            Metric::RoundTripTime => "round_trip_time",
            Metric::FramesReceivedPerSecond => "frames_received_per_second",
            Metric::FramesDecodedPerSecond => "frames_decoded_per_second",
        }
    }

    /// Reverse of [`Metric::as_str`], used when reading older store
    /// files whose column set may differ
    pub fn from_column(name: &str) -> Option<Metric> {
        Metric::ALL.iter().copied().find(|m| m.as_str() == name)
    }
}

/// Flat per-timestamp record of everything observed in one snapshot
///
/// Instances are created once by the normalizer and never mutated
/// after they have been appended to the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// ISO-8601 timestamp, the unique key within a store
    pub timestamp: String,
    pub fps: f64,
    pub frames_received: f64,
    pub frames_decoded: f64,
    pub frames_dropped: f64,
    /// Mean per-frame decode duration (totalDecodeTime / framesDecoded)
    pub decode_time: f64,
    /// Received bitrate in Mbit/s, derived from the bytes delta
    pub bitrate_received: f64,
    /// Current round-trip time in milliseconds
    pub round_trip_time: f64,
    pub frames_received_per_second: f64,
    pub frames_decoded_per_second: f64,
}

impl MetricRecord {
    /// Empty record for a timestamp; all metrics start at 0
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            ..Default::default()
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Fps => self.fps,
            Metric::FramesReceived => self.frames_received,
            Metric::FramesDecoded => self.frames_decoded,
            Metric::FramesDropped => self.frames_dropped,
            Metric::DecodeTime => self.decode_time,
            Metric::BitrateReceived => self.bitrate_received,
            Metric::RoundTripTime => self.round_trip_time,
            Metric::FramesReceivedPerSecond => self.frames_received_per_second,
            Metric::FramesDecodedPerSecond => self.frames_decoded_per_second,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::Fps => self.fps = value,
            Metric::FramesReceived => self.frames_received = value,
            Metric::FramesDecoded => self.frames_decoded = value,
            Metric::FramesDropped => self.frames_dropped = value,
            Metric::DecodeTime => self.decode_time = value,
            Metric::BitrateReceived => self.bitrate_received = value,
            Metric::RoundTripTime => self.round_trip_time = value,
            Metric::FramesReceivedPerSecond => self.frames_received_per_second = value,
            Metric::FramesDecodedPerSecond => self.frames_decoded_per_second = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_roundtrip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_column(metric.as_str()), Some(metric));
        }
        assert_eq!(Metric::from_column("sample_id"), None);
    }

    #[test]
    fn test_get_set_cover_all_fields() {
        let mut record = MetricRecord::new("2025-01-01T00:00:00Z");
        for (i, metric) in Metric::ALL.iter().enumerate() {
            record.set(*metric, (i + 1) as f64);
        }
        for (i, metric) in Metric::ALL.iter().enumerate() {
            assert_eq!(record.get(*metric), (i + 1) as f64);
        }
    }
}
