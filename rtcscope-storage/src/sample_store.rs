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

//! Persistent sample store
//!
//! One CSV file per monitoring session, append-only and
//! timestamp-unique. Each row carries a `sample_id` assigned at append
//! time from the store's current row count, so ids stay monotonically
//! increasing and contiguous across independent process invocations.
//!
//! Precondition: single writer, non-overlapping invocations. There is
//! no file locking; concurrent appends against the same store are out
//! of contract and may race on duplicate detection and id assignment.

use rtcscope_core::{Metric, MetricRecord, Result, RtcscopeError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One persisted row: a metric record plus its assigned id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub sample_id: u64,
    pub record: MetricRecord,
}

/// Append-only CSV store of metric records for one session
#[derive(Debug, Clone)]
pub struct SampleStore {
    path: PathBuf,
}

impl SampleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the store file exists on disk yet
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Store header: `sample_id`, `timestamp`, then the metric columns
    fn header() -> String {
        let mut columns = vec!["sample_id", "timestamp"];
        columns.extend(Metric::ALL.iter().map(|m| m.as_str()));
        columns.join(",")
    }

    /// Read every row of the store
    ///
    /// A missing file reads as an empty store. Columns are resolved by
    /// name from the header row, so a store written by an older
    /// version with fewer columns still reads cleanly: absent columns
    /// and malformed numeric cells both default to 0.
    pub fn read_all(&self) -> Result<Vec<StoredRecord>> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.path)?;
        let mut lines = raw.lines();
        let header = match lines.next() {
            Some(line) => line,
            None => return Ok(Vec::new()),
        };
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        let timestamp_idx = columns
            .iter()
            .position(|c| *c == "timestamp")
            .ok_or_else(|| {
                RtcscopeError::Store(format!(
                    "store {} has no timestamp column",
                    self.path.display()
                ))
            })?;
        let sample_id_idx = columns.iter().position(|c| *c == "sample_id");

        let mut rows = Vec::new();
        for (row_idx, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let cells: Vec<&str> = line.split(',').collect();

            let mut record =
                MetricRecord::new(cell(&cells, timestamp_idx).unwrap_or_default());
            for (col_idx, name) in columns.iter().enumerate() {
                if let Some(metric) = Metric::from_column(name) {
                    record.set(metric, numeric_cell(&cells, col_idx));
                }
            }

            let sample_id = sample_id_idx
                .and_then(|idx| cell(&cells, idx))
                .and_then(|c| c.parse::<u64>().ok())
                .unwrap_or(row_idx as u64);

            rows.push(StoredRecord { sample_id, record });
        }
        Ok(rows)
    }

    /// Append records whose timestamps are not yet in the store
    ///
    /// Incoming records keep their given order; each appended row gets
    /// the next contiguous `sample_id` starting at the current row
    /// count. Returns the number of rows actually appended, which is 0
    /// when the whole batch was already persisted (idempotent
    /// re-ingestion).
    pub fn append(&self, records: &[MetricRecord]) -> Result<usize> {
        let existing = self.read_all()?;
        let known: HashSet<&str> = existing
            .iter()
            .map(|row| row.record.timestamp.as_str())
            .collect();

        let new_records: Vec<&MetricRecord> = records
            .iter()
            .filter(|r| !known.contains(r.timestamp.as_str()))
            .collect();
        if new_records.is_empty() {
            tracing::debug!("no new data points to append");
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // A zero-length file (interrupted first run) needs its header
        // rewritten too.
        let is_new = !self.exists() || fs::metadata(&self.path)?.len() == 0;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if is_new {
            writeln!(file, "{}", Self::header())?;
        }

        let base_id = existing.len() as u64;
        for (offset, record) in new_records.iter().enumerate() {
            writeln!(file, "{}", format_row(base_id + offset as u64, record))?;
        }

        Ok(new_records.len())
    }
}

/// Serialize one row; numeric cells at fixed 2-decimal precision
fn format_row(sample_id: u64, record: &MetricRecord) -> String {
    let mut cells = vec![sample_id.to_string(), record.timestamp.clone()];
    cells.extend(
        Metric::ALL
            .iter()
            .map(|m| format!("{:.2}", record.get(*m))),
    );
    cells.join(",")
}

fn cell<'a>(cells: &[&'a str], idx: usize) -> Option<&'a str> {
    cells.get(idx).copied()
}

/// Numeric cell value; absent or malformed cells read as 0
fn numeric_cell(cells: &[&str], idx: usize) -> f64 {
    cell(cells, idx)
        .and_then(|c| c.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}
