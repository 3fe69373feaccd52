//! Watch command implementation.
//!
//! Logs in to a live WebUI and prints one status line per merged poll.

use qbsync_engine::{
    ClientConfig, HttpTransport, ReqwestClient, Session, Snapshot, SyncEngine, SyncResult,
    SyncTransport,
};
use std::sync::Arc;
use std::time::Duration;

/// Runs the watch command.
pub fn run(
    url: &str,
    username: &str,
    password: &str,
    polls: Option<u64>,
    interval_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ClientConfig::new(url);
    if let Some(ms) = interval_ms {
        config = config.with_poll_interval(Duration::from_millis(ms));
    }

    let transport = HttpTransport::new(
        config.clone(),
        ReqwestClient::new()?,
        Arc::new(Session::new()),
    );
    transport.login(username, password)?;

    let engine = SyncEngine::new(config, transport);
    let revision = watch(&engine, polls, |line| println!("{}", line))?;
    tracing::info!(rid = revision, "watch finished");

    Ok(())
}

/// Polls until `polls` updates were merged (or forever), handing one status
/// line per update to `emit`. Returns the final revision.
pub fn watch<T, F>(engine: &SyncEngine<T>, polls: Option<u64>, mut emit: F) -> SyncResult<u64>
where
    T: SyncTransport,
    F: FnMut(String),
{
    let mut seen = 0u64;
    engine.run(|revision, snapshot| {
        emit(status_line(revision, snapshot));
        seen += 1;
        polls.map_or(true, |limit| seen < limit)
    })
}

/// One-line summary of a snapshot.
pub fn status_line(revision: u64, snapshot: &Snapshot) -> String {
    let state = snapshot.server_state();
    let downloading = snapshot
        .torrents()
        .values()
        .filter(|torrent| torrent.progress < 1.0)
        .count();

    format!(
        "rid={} torrents={} downloading={} dl={}B/s up={}B/s status={}",
        revision,
        snapshot.torrents().len(),
        downloading,
        state.dl_info_speed.unwrap_or(0),
        state.up_info_speed.unwrap_or(0),
        state.connection_status.as_deref().unwrap_or("unknown"),
    )
}
