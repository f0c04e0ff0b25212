//! Run summary export
//!
//! Serializes the outcome of a generation run to JSON for external
//! consumption. The summary lives beside the feed, never inside it.

use crate::config::GeneratorConfig;
use crate::metrics::FeedMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome of one completed feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub version: String,
    pub exchange: String,
    pub seed: u64,
    pub config: GeneratorConfig,
    /// Lines written, snapshot included.
    pub events_written: u64,
    pub final_mid: f64,
    pub active_remaining: usize,
    /// SHA-256 of the exact NDJSON bytes, lowercase hex.
    pub sha256: String,
    pub metrics: FeedMetrics,
    pub generated_at: DateTime<Utc>,
}

impl RunSummary {
    /// Two summaries describe the same feed bytes.
    pub fn same_feed(&self, other: &RunSummary) -> bool {
        self.sha256 == other.sha256 && self.events_written == other.events_written
    }
}

/// Export a summary as pretty JSON.
pub fn export_json(summary: &RunSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_default()
}

/// Export a batch of summaries as a pretty JSON array.
pub fn export_batch_json(summaries: &[RunSummary]) -> String {
    serde_json::to_string_pretty(summaries).unwrap_or_default()
}

/// Write a summary to a file path.
pub fn write_to_file(summary: &RunSummary, path: impl AsRef<Path>) -> std::io::Result<()> {
    let json = export_json(summary);
    std::fs::write(path, json)
}
