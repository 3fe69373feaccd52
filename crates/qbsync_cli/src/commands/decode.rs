//! Decode command implementation.

use qbsync_protocol::{DecodeResult, Delta};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Summary of one decoded delta.
#[derive(Debug, Serialize)]
pub struct DeltaSummary {
    /// Revision after merging.
    pub revision: u64,
    /// Whether the delta replaces the cache.
    pub full_update: bool,
    /// Number of individual changes.
    pub changes: usize,
    /// Upserted torrents as hash to name.
    pub torrents_upserted: BTreeMap<String, String>,
    /// Removed torrent hashes.
    pub torrents_removed: Vec<String>,
    /// Upserted categories as name to save path.
    pub categories_upserted: BTreeMap<String, String>,
    /// Removed category names.
    pub categories_removed: Vec<String>,
    /// Added tags.
    pub tags_added: Vec<String>,
    /// Removed tags.
    pub tags_removed: Vec<String>,
    /// Hashes whose tracker list was replaced.
    pub trackers_upserted: Vec<String>,
    /// Hashes whose tracker list was dropped.
    pub trackers_removed: Vec<String>,
    /// Metrics present in the payload.
    pub metrics: BTreeMap<String, Value>,
}

impl From<Delta> for DeltaSummary {
    fn from(delta: Delta) -> Self {
        Self {
            revision: delta.revision,
            full_update: delta.is_full,
            changes: delta.change_count(),
            torrents_upserted: delta
                .torrents_upserted
                .into_iter()
                .map(|(hash, torrent)| (hash, torrent.name))
                .collect(),
            torrents_removed: delta.torrents_removed.into_iter().collect(),
            categories_upserted: delta
                .categories_upserted
                .into_iter()
                .map(|(name, category)| (name, category.save_path))
                .collect(),
            categories_removed: delta.categories_removed.into_iter().collect(),
            tags_added: delta.tags_added,
            tags_removed: delta.tags_removed.into_iter().collect(),
            trackers_upserted: delta.trackers_upserted.into_keys().collect(),
            trackers_removed: delta.trackers_removed.into_iter().collect(),
            metrics: delta.server_metrics_patch.metrics(),
        }
    }
}

/// Decodes `payload` as the answer to a request made with `prior`.
pub fn summarize(payload: &[u8], prior: u64) -> DecodeResult<DeltaSummary> {
    Delta::decode(payload, prior).map(DeltaSummary::from)
}

/// Runs the decode command.
pub fn run(path: &Path, prior: u64, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let payload =
        std::fs::read(path).map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    let summary = summarize(&payload, prior)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            print_text_output(&summary);
        }
    }

    Ok(())
}

fn print_text_output(summary: &DeltaSummary) {
    let kind = if summary.full_update {
        "full"
    } else {
        "incremental"
    };
    println!("Revision: {} ({})", summary.revision, kind);
    println!("Changes:  {}", summary.changes);

    if !summary.torrents_upserted.is_empty() {
        println!();
        println!("Torrents upserted:");
        for (hash, name) in &summary.torrents_upserted {
            println!("  {}  {}", hash, name);
        }
    }
    print_list("Torrents removed", &summary.torrents_removed);

    if !summary.categories_upserted.is_empty() {
        println!();
        println!("Categories upserted:");
        for (name, save_path) in &summary.categories_upserted {
            println!("  {}  {}", name, save_path);
        }
    }
    print_list("Categories removed", &summary.categories_removed);
    print_list("Tags added", &summary.tags_added);
    print_list("Tags removed", &summary.tags_removed);
    print_list("Trackers upserted", &summary.trackers_upserted);
    print_list("Trackers removed", &summary.trackers_removed);

    if !summary.metrics.is_empty() {
        println!();
        println!("Metrics:");
        for (name, value) in &summary.metrics {
            println!("  {:<24} {}", name, value);
        }
    }
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}:", title);
    for item in items {
        println!("  {}", item);
    }
}
