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

//! Error types for the snapshot pipeline

use thiserror::Error;

/// Result type for rtcscope operations
pub type Result<T> = std::result::Result<T, RtcscopeError>;

/// Errors that can occur while ingesting and persisting snapshots
///
/// Only whole-input failures surface here. Field-level problems inside
/// a report (missing field, wrong type) are recovered locally by
/// defaulting the derived value to 0 and never become errors.
#[derive(Debug, Error)]
pub enum RtcscopeError {
    /// Input file unreadable or the store file could not be touched
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input was not parseable as JSON
    #[error("Malformed JSON input: {0}")]
    MalformedInput(String),

    /// Input parsed, but the top-level value has the wrong shape
    #[error("Invalid input shape: {0}")]
    InvalidShape(String),

    /// Store file exists but its header row is unusable
    #[error("Store error: {0}")]
    Store(String),
}

impl From<serde_json::Error> for RtcscopeError {
    fn from(e: serde_json::Error) -> Self {
        RtcscopeError::MalformedInput(e.to_string())
    }
}
