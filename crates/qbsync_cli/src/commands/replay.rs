//! Replay command implementation.
//!
//! Feeds recorded payloads through a [`SyncEngine`] in order, one poll per
//! file, as if a WebUI had answered them.

use parking_lot::Mutex;
use qbsync_engine::{
    ClientConfig, Snapshot, SyncEngine, SyncError, SyncResult, SyncStats, SyncTransport,
};
use qbsync_protocol::MainDataRequest;
use serde::Serialize;
use std::collections::VecDeque;
use std::path::PathBuf;

/// Transport that answers each fetch with the next recorded payload file.
pub struct FileTransport {
    files: Mutex<VecDeque<PathBuf>>,
}

impl FileTransport {
    /// Creates a transport serving `files` in order.
    pub fn new(files: &[PathBuf]) -> Self {
        Self {
            files: Mutex::new(files.iter().cloned().collect()),
        }
    }
}

impl SyncTransport for FileTransport {
    fn fetch_main_data(&self, request: &MainDataRequest) -> SyncResult<Vec<u8>> {
        let path = self
            .files
            .lock()
            .pop_front()
            .ok_or_else(|| SyncError::transport_fatal("no more recorded payloads"))?;

        tracing::debug!(rid = request.rid, file = %path.display(), "replaying payload");
        std::fs::read(&path)
            .map_err(|e| SyncError::transport_fatal(format!("{}: {}", path.display(), e)))
    }

    fn is_connected(&self) -> bool {
        !self.files.lock().is_empty()
    }

    fn close(&self) -> SyncResult<()> {
        self.files.lock().clear();
        Ok(())
    }
}

/// Result of a replay.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    /// Cursor after the last payload.
    pub revision: u64,
    /// Payloads merged.
    pub polls: u64,
    /// Payloads that were full updates.
    pub full_updates: u64,
    /// The merged snapshot.
    pub snapshot: Snapshot,
}

/// Merges every file in order and returns the final state.
pub fn replay(files: &[PathBuf]) -> SyncResult<ReplayReport> {
    let engine = SyncEngine::new(ClientConfig::default(), FileTransport::new(files));

    for (index, path) in files.iter().enumerate() {
        engine.poll().map_err(|e| {
            tracing::error!(file = %path.display(), index, error = %e, "replay stopped");
            e
        })?;
    }

    let (revision, snapshot) = engine.view();
    let SyncStats {
        polls_completed,
        full_updates,
        ..
    } = engine.stats();

    Ok(ReplayReport {
        revision,
        polls: polls_completed,
        full_updates,
        snapshot: Snapshot::clone(&snapshot),
    })
}

/// Runs the replay command.
pub fn run(files: &[PathBuf], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = replay(files)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            print_text_output(&report);
        }
    }

    Ok(())
}

fn print_text_output(report: &ReplayReport) {
    let snapshot = &report.snapshot;

    println!("Revision:     {}", report.revision);
    println!(
        "Polls:        {} ({} full)",
        report.polls, report.full_updates
    );
    println!("Torrents:     {}", snapshot.torrents().len());
    println!("Categories:   {}", snapshot.categories().len());
    println!("Tags:         {}", snapshot.tags().len());

    if !snapshot.torrents().is_empty() {
        println!();
        println!("{:<42} {:<14} {:>7}  Name", "Hash", "State", "Done");
        for (hash, torrent) in snapshot.torrents() {
            println!(
                "{:<42} {:<14} {:>6.1}%  {}",
                hash,
                torrent.state,
                torrent.progress * 100.0,
                torrent.name
            );
        }
    }

    if !snapshot.categories().is_empty() {
        println!();
        println!("Categories:");
        for (name, category) in snapshot.categories() {
            let count = snapshot.torrents_in_category(name).count();
            println!("  {:<20} {:<30} {} torrents", name, category.save_path, count);
        }
    }

    if !snapshot.tags().is_empty() {
        println!();
        println!("Tags:");
        for tag in snapshot.tags() {
            let count = snapshot.torrents_with_tag(tag).count();
            println!("  {:<20} {} torrents", tag, count);
        }
    }

    let metrics = snapshot.server_state().metrics();
    if !metrics.is_empty() {
        println!();
        println!("Server state:");
        for (name, value) in &metrics {
            println!("  {:<24} {}", name, value);
        }
    }
}
