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

//! Rtcscope Core
//!
//! Data model and normalization pipeline for WebRTC `getStats()`
//! snapshots: raw snapshot decoding, per-timestamp metric records,
//! rate derivation from cumulative counters, and in-batch
//! deduplication.

pub mod dedup;
pub mod error;
pub mod normalize;
pub mod record;
pub mod snapshot;

pub use dedup::dedup_records;
pub use error::{Result, RtcscopeError};
pub use normalize::{normalize_batch, CarryState};
pub use record::{Metric, MetricRecord};
pub use snapshot::{load_snapshot_batch, parse_snapshot_batch, SnapshotEntry};
