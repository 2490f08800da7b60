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

//! Session-scoped output paths
//!
//! Artifacts for a session land under `<output-root>/<session-id>/`.
//! The capture side sometimes hands over `sessionId/timestampFolder`
//! style identifiers; only the leading session component is used so
//! all invocations of one session share a single store. If the
//! directory cannot be created the bare default filenames in the
//! working directory are used instead, matching the capture tooling's
//! fallback behavior.

use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_NAME: &str = "webrtc_data.csv";
pub const DEFAULT_SUMMARY_NAME: &str = "webrtc_summary.json";

/// Resolved locations of the store and summary artifacts
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub store: PathBuf,
    pub summary: PathBuf,
}

impl OutputPaths {
    /// Resolve output locations for an optional session identifier
    pub fn resolve(output_root: &Path, session: Option<&str>) -> Self {
        let Some(session) = session.map(leading_component).filter(|s| !s.is_empty()) else {
            return Self::bare();
        };

        let dir = output_root.join(session);
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!(
                dir = %dir.display(),
                "could not create output directory ({e}); falling back to working directory"
            );
            return Self::bare();
        }

        Self {
            store: dir.join(DEFAULT_STORE_NAME),
            summary: dir.join(DEFAULT_SUMMARY_NAME),
        }
    }

    /// Default filenames in the working directory
    fn bare() -> Self {
        Self {
            store: PathBuf::from(DEFAULT_STORE_NAME),
            summary: PathBuf::from(DEFAULT_SUMMARY_NAME),
        }
    }

    /// Variant of these paths for one connection of a multi-connection
    /// extension log, suffixing the file stems with the connection id
    pub fn for_connection(&self, pc_id: &str) -> Self {
        let suffix = sanitize(pc_id);
        Self {
            store: with_stem_suffix(&self.store, &suffix),
            summary: with_stem_suffix(&self.summary, &suffix),
        }
    }
}

/// `sessionId/2025-03-01T12-00` -> `sessionId`
fn leading_component(session: &str) -> &str {
    session.split('/').next().unwrap_or(session)
}

/// Connection ids come from browser-side JS and may hold arbitrary
/// characters; keep only filename-safe ones
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let name = if ext.is_empty() {
        format!("{stem}_{suffix}")
    } else {
        format!("{stem}_{suffix}.{ext}")
    };
    path.with_file_name(name)
}
