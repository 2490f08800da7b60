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

//! Rtcscope CLI
//!
//! Ingests a WebRTC `getStats()` snapshot dump, merges it into the
//! session's durable sample store and rewrites the summary artifact.
//! stdout carries exactly one JSON document per invocation — an
//! acknowledgment on success, `{"error": ...}` on fatal input errors —
//! so a calling process can always parse it. Diagnostics go to stderr.

mod adapter;
mod paths;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use paths::OutputPaths;
use rtcscope_core::{dedup_records, load_snapshot_batch, normalize_batch, SnapshotEntry};
use rtcscope_query::{summarize_store, write_summary};
use rtcscope_storage::SampleStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "rtcscope")]
#[command(about = "WebRTC getStats() session analyzer", long_about = None)]
struct Cli {
    /// Snapshot dump file (JSON array)
    input: PathBuf,

    /// Session identifier; artifacts land under <output-root>/<session>
    #[arg(short, long)]
    session: Option<String>,

    /// Root directory for session-scoped artifacts
    #[arg(long, default_value = "logs/logs_analyzed")]
    output_root: PathBuf,

    /// Layout of the input file
    #[arg(long, value_enum, default_value_t = InputFormat::Snapshot)]
    format: InputFormat,

    /// Verbose diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Array of {timestamp, rawStats} snapshot entries
    Snapshot,
    /// Browser-extension log with heterogeneous typed entries
    ExtensionLog,
}

/// Minimal machine-readable result for the calling process
#[derive(Debug, Serialize)]
struct Acknowledgment {
    appended_rows: usize,
    total_samples: usize,
    store_file: String,
    summary_file: String,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        // The caller still gets a well-formed document on the normal
        // output channel.
        println!("{}", serde_json::json!({ "error": format!("{e:#}") }));
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let paths = OutputPaths::resolve(&cli.output_root, cli.session.as_deref());
    info!("store path: {}", paths.store.display());
    info!("summary path: {}", paths.summary.display());

    match cli.format {
        InputFormat::Snapshot => {
            let batch = load_snapshot_batch(&cli.input)
                .with_context(|| format!("could not read {}", cli.input.display()))?;
            let ack = process_batch(&batch, &paths)?;
            println!("{}", serde_json::to_string(&ack)?);
        }
        InputFormat::ExtensionLog => {
            let raw = fs::read_to_string(&cli.input)
                .with_context(|| format!("could not read {}", cli.input.display()))?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("malformed JSON in {}", cli.input.display()))?;
            let batches = adapter::group_stats_entries(value)?;
            info!("extension log holds {} connection(s)", batches.len());

            if batches.len() == 1 {
                // Single connection shares the plain session filenames.
                let batch = batches.into_values().next().unwrap_or_default();
                let ack = process_batch(&batch, &paths)?;
                println!("{}", serde_json::to_string(&ack)?);
            } else {
                let mut connections = BTreeMap::new();
                for (pc_id, batch) in batches {
                    let ack = process_batch(&batch, &paths.for_connection(&pc_id))?;
                    connections.insert(pc_id, ack);
                }
                println!(
                    "{}",
                    serde_json::to_string(&serde_json::json!({ "connections": connections }))?
                );
            }
        }
    }

    Ok(())
}

/// Run one batch through the full pipeline: normalize, deduplicate,
/// merge into the store, recompute the summary
fn process_batch(entries: &[SnapshotEntry], paths: &OutputPaths) -> Result<Acknowledgment> {
    let candidates = normalize_batch(entries);
    let records = dedup_records(candidates);
    debug!(
        "parsed {} unique data points from current batch",
        records.len()
    );

    let store = SampleStore::new(&paths.store);
    let appended = store.append(&records).context("could not update store")?;
    info!("appended {appended} new rows");

    let report = summarize_store(&store).context("could not summarize store")?;
    write_summary(&paths.summary, &report).context("could not write summary")?;

    Ok(Acknowledgment {
        appended_rows: appended,
        total_samples: report.num_samples,
        store_file: paths.store.display().to_string(),
        summary_file: paths.summary.display().to_string(),
    })
}
