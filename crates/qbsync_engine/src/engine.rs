//! Merge engine: polls the sync endpoint and folds deltas into the snapshot.

use crate::config::ClientConfig;
use crate::error::SyncResult;
use crate::snapshot::Snapshot;
use crate::transport::SyncTransport;
use parking_lot::{Mutex, RwLock};
use qbsync_protocol::{Category, Delta, MainDataRequest, ServerState, Torrent};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Statistics about polling.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Polls whose delta was merged.
    pub polls_completed: u64,
    /// Merged deltas that were full updates.
    pub full_updates: u64,
    /// Polls that failed and left the snapshot untouched.
    pub polls_failed: u64,
    /// Individual changes merged by incremental deltas.
    pub changes_applied: u64,
    /// Time of the last successful poll.
    pub last_poll_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Cursor and snapshot are swapped together under one lock.
struct Published {
    revision: u64,
    snapshot: Arc<Snapshot>,
}

/// The sync engine keeps a local mirror of one WebUI's state.
///
/// Each [`poll`](SyncEngine::poll) merges into a private copy of the current
/// snapshot and then publishes copy and cursor in a single swap. Readers get
/// either the state before or after a merge, and never wait on the network.
pub struct SyncEngine<T: SyncTransport> {
    config: ClientConfig,
    transport: Arc<T>,
    published: RwLock<Published>,
    stats: RwLock<SyncStats>,
    poll_lock: Mutex<()>,
    cancelled: AtomicBool,
}

impl<T: SyncTransport> SyncEngine<T> {
    /// Creates an engine at revision 0 with an empty snapshot.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            published: RwLock::new(Published {
                revision: 0,
                snapshot: Arc::new(Snapshot::new()),
            }),
            stats: RwLock::new(SyncStats::default()),
            poll_lock: Mutex::new(()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Revision of the last merged delta, `0` before the first poll.
    pub fn revision(&self) -> u64 {
        self.published.read().revision
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.published.read().snapshot)
    }

    /// Revision and snapshot read together.
    pub fn view(&self) -> (u64, Arc<Snapshot>) {
        let published = self.published.read();
        (published.revision, Arc::clone(&published.snapshot))
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Fetches the changes since the current revision and merges them.
    ///
    /// Returns the revision now in effect. On error nothing is changed and
    /// the next call asks for the same revision again.
    pub fn poll(&self) -> SyncResult<u64> {
        let _polling = self.poll_lock.lock();
        let (prior, current) = self.view();

        let delta = match self.fetch(prior) {
            Ok(delta) => delta,
            Err(e) => {
                tracing::warn!(rid = prior, error = %e, "poll failed");
                let mut stats = self.stats.write();
                stats.polls_failed += 1;
                stats.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let revision = delta.revision;
        let is_full = delta.is_full;
        let changes = delta.change_count() as u64;

        let next = if is_full {
            tracing::info!(rid = revision, torrents = delta.torrents_upserted.len(), "full update");
            Arc::new(Snapshot::from_full(delta))
        } else if delta.is_empty() {
            current
        } else {
            let mut next = Snapshot::clone(&current);
            next.apply(delta);
            Arc::new(next)
        };

        {
            let mut published = self.published.write();
            published.revision = revision;
            published.snapshot = next;
        }

        {
            let mut stats = self.stats.write();
            stats.polls_completed += 1;
            if is_full {
                stats.full_updates += 1;
            } else {
                stats.changes_applied += changes;
            }
            stats.last_poll_time = Some(Instant::now());
            stats.last_error = None;
        }

        tracing::debug!(from = prior, to = revision, changes, "merged delta");
        Ok(revision)
    }

    fn fetch(&self, prior: u64) -> SyncResult<Delta> {
        let body = self
            .transport
            .fetch_main_data(&MainDataRequest::new(prior))?;
        Ok(Delta::decode(&body, prior)?)
    }

    /// Polls every `poll_interval` until cancelled, until `on_update`
    /// returns false, or until a poll fails.
    ///
    /// Errors are returned as-is; retrying is up to the caller.
    pub fn run<F>(&self, mut on_update: F) -> SyncResult<u64>
    where
        F: FnMut(u64, &Snapshot) -> bool,
    {
        self.reset_cancel();

        loop {
            if self.is_cancelled() {
                return Ok(self.revision());
            }

            let revision = self.poll()?;
            if !on_update(revision, &self.snapshot()) {
                return Ok(revision);
            }

            std::thread::sleep(self.config.poll_interval);
        }
    }

    /// Stops a running [`run`](SyncEngine::run) loop after its current poll.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Resets the cancelled flag.
    pub fn reset_cancel(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Last known server metrics.
    pub fn server_state(&self) -> ServerState {
        self.snapshot().server_state().clone()
    }

    /// All torrents keyed by hash.
    pub fn torrents(&self) -> BTreeMap<String, Torrent> {
        self.snapshot().torrents().clone()
    }

    /// One torrent, or [`SyncError::NotFound`](crate::SyncError::NotFound).
    pub fn torrent(&self, hash: &str) -> SyncResult<Torrent> {
        self.snapshot().torrent(hash).cloned()
    }

    /// All categories keyed by name.
    pub fn categories(&self) -> BTreeMap<String, Category> {
        self.snapshot().categories().clone()
    }

    /// All tags.
    pub fn tags(&self) -> BTreeSet<String> {
        self.snapshot().tags().clone()
    }

    /// Tracker URLs of a torrent; empty when none are recorded.
    pub fn trackers(&self, hash: &str) -> Vec<String> {
        self.snapshot().trackers(hash).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::transport::MockTransport;
    use qbsync_protocol::DecodeError;

    fn engine() -> SyncEngine<MockTransport> {
        SyncEngine::new(ClientConfig::default(), MockTransport::new())
    }

    #[test]
    fn engine_initial_state() {
        let engine = engine();
        assert_eq!(engine.revision(), 0);
        assert!(engine.snapshot().is_empty());
        assert_eq!(engine.stats().polls_completed, 0);
    }

    #[test]
    fn first_poll_requests_rid_zero() {
        let engine = engine();
        engine
            .transport()
            .push_response(r#"{"rid":1,"full_update":true,"torrents":{"h1":{"name":"A"}},"tags":["x"]}"#);

        assert_eq!(engine.poll().unwrap(), 1);
        assert_eq!(engine.transport().requested_revisions(), vec![0]);
        assert_eq!(engine.torrent("h1").unwrap().name, "A");
        assert!(engine.tags().contains("x"));

        let stats = engine.stats();
        assert_eq!(stats.polls_completed, 1);
        assert_eq!(stats.full_updates, 1);
        assert!(stats.last_poll_time.is_some());
    }

    #[test]
    fn second_poll_uses_returned_rid() {
        let engine = engine();
        engine.transport().push_response(r#"{"rid":7,"full_update":true}"#);
        engine.transport().push_response(r#"{"rid":8}"#);

        engine.poll().unwrap();
        engine.poll().unwrap();

        assert_eq!(engine.transport().requested_revisions(), vec![0, 7]);
        assert_eq!(engine.revision(), 8);
    }

    #[test]
    fn decode_failure_leaves_state_untouched() {
        let engine = engine();
        engine
            .transport()
            .push_response(r#"{"rid":1,"full_update":true,"tags":["x"]}"#);
        engine.poll().unwrap();
        let before = engine.snapshot();

        engine.transport().push_response("Forbidden");
        let err = engine.poll().unwrap_err();

        assert!(matches!(err, SyncError::Decode(DecodeError::Json(_))));
        assert_eq!(engine.revision(), 1);
        assert_eq!(*engine.snapshot(), *before);
        assert_eq!(engine.stats().polls_failed, 1);
        assert!(engine.stats().last_error.is_some());
    }

    #[test]
    fn transport_errors_propagate_unchanged() {
        let engine = engine();
        engine.transport().push_error(SyncError::AuthenticationExpired);
        engine
            .transport()
            .push_error(SyncError::UnexpectedStatus { status: 502 });

        assert!(matches!(engine.poll(), Err(SyncError::AuthenticationExpired)));
        assert!(matches!(
            engine.poll(),
            Err(SyncError::UnexpectedStatus { status: 502 })
        ));
        assert_eq!(engine.revision(), 0);
        assert_eq!(engine.transport().requested_revisions(), vec![0, 0]);
    }

    #[test]
    fn empty_delta_keeps_snapshot_and_advances_cursor() {
        let engine = engine();
        engine
            .transport()
            .push_response(r#"{"rid":1,"full_update":true,"torrents":{"h1":{"name":"A"}}}"#);
        engine.transport().push_response(r#"{"rid":2}"#);

        engine.poll().unwrap();
        let before = engine.snapshot();
        engine.poll().unwrap();

        assert_eq!(engine.revision(), 2);
        assert!(Arc::ptr_eq(&before, &engine.snapshot()));
    }

    #[test]
    fn readers_keep_their_view_across_merges() {
        let engine = engine();
        engine
            .transport()
            .push_response(r#"{"rid":1,"full_update":true,"torrents":{"h1":{"name":"A"}}}"#);
        engine
            .transport()
            .push_response(r#"{"rid":2,"torrents_removed":["h1"]}"#);

        engine.poll().unwrap();
        let (revision, held) = engine.view();
        engine.poll().unwrap();

        assert_eq!(revision, 1);
        assert!(held.torrent("h1").is_ok());
        assert!(matches!(engine.torrent("h1"), Err(SyncError::NotFound(_))));
    }

    #[test]
    fn trackers_default_to_empty() {
        let engine = engine();
        assert!(engine.trackers("unknown").is_empty());
    }

    #[test]
    fn run_stops_when_callback_declines() {
        let engine = SyncEngine::new(
            ClientConfig::default().with_poll_interval(std::time::Duration::ZERO),
            MockTransport::new(),
        );
        engine.transport().push_response(r#"{"rid":1,"full_update":true}"#);
        engine.transport().push_response(r#"{"rid":2}"#);
        engine.transport().push_response(r#"{"rid":3}"#);

        let mut seen = Vec::new();
        let last = engine
            .run(|revision, _| {
                seen.push(revision);
                revision < 2
            })
            .unwrap();

        assert_eq!(last, 2);
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(engine.transport().pending(), 1);
    }

    #[test]
    fn run_returns_first_error() {
        let engine = SyncEngine::new(
            ClientConfig::default().with_poll_interval(std::time::Duration::ZERO),
            MockTransport::new(),
        );
        engine.transport().push_response(r#"{"rid":1,"full_update":true}"#);
        engine.transport().push_error(SyncError::transport_retryable("reset"));

        let result = engine.run(|_, _| true);

        assert!(matches!(result, Err(SyncError::Transport { .. })));
        assert_eq!(engine.revision(), 1);
    }

    #[test]
    fn run_stops_on_cancel() {
        let engine = SyncEngine::new(
            ClientConfig::default().with_poll_interval(std::time::Duration::ZERO),
            MockTransport::new(),
        );
        engine.transport().push_response(r#"{"rid":1,"full_update":true}"#);

        let last = engine
            .run(|_, _| {
                engine.cancel();
                true
            })
            .unwrap();

        assert_eq!(last, 1);
        assert_eq!(engine.transport().requested_revisions(), vec![0]);
    }
}
