//! Transport layer abstraction for the sync endpoint.

use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use qbsync_protocol::MainDataRequest;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// A sync transport performs the authenticated `sync/maindata` exchange.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, recorded payloads, mock for testing, etc.).
/// Implementations own timeouts and report them as errors; they never retry.
pub trait SyncTransport: Send + Sync {
    /// Fetches the raw response body for `request`.
    fn fetch_main_data(&self, request: &MainDataRequest) -> SyncResult<Vec<u8>>;

    /// Checks if the transport is connected.
    fn is_connected(&self) -> bool;

    /// Closes the transport connection.
    fn close(&self) -> SyncResult<()>;
}

/// A mock transport for testing.
///
/// Responses are scripted in order; every request's cursor is recorded.
#[derive(Debug)]
pub struct MockTransport {
    connected: AtomicBool,
    responses: Mutex<VecDeque<SyncResult<Vec<u8>>>>,
    requests: Mutex<Vec<u64>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues a response body.
    pub fn push_response(&self, body: impl Into<Vec<u8>>) {
        self.responses.lock().push_back(Ok(body.into()));
    }

    /// Queues an error.
    pub fn push_error(&self, error: SyncError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Number of scripted responses not yet consumed.
    pub fn pending(&self) -> usize {
        self.responses.lock().len()
    }

    /// Cursors of all requests seen so far.
    pub fn requested_revisions(&self) -> Vec<u64> {
        self.requests.lock().clone()
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTransport for MockTransport {
    fn fetch_main_data(&self, request: &MainDataRequest) -> SyncResult<Vec<u8>> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }
        self.requests.lock().push(request.rid);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::transport_fatal("no mock response queued")))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&self) -> SyncResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl<T: SyncTransport + ?Sized> SyncTransport for std::sync::Arc<T> {
    fn fetch_main_data(&self, request: &MainDataRequest) -> SyncResult<Vec<u8>> {
        (**self).fetch_main_data(request)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn close(&self) -> SyncResult<()> {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_transport_connection() {
        let transport = MockTransport::new();
        assert!(transport.is_connected());

        transport.set_connected(false);
        assert!(!transport.is_connected());

        transport.set_connected(true);
        transport.close().unwrap();
        assert!(!transport.is_connected());
    }

    #[test]
    fn mock_transport_not_connected_error() {
        let transport = MockTransport::new();
        transport.set_connected(false);

        let result = transport.fetch_main_data(&MainDataRequest::new(0));
        assert!(matches!(result, Err(SyncError::NotConnected)));
        assert!(transport.requested_revisions().is_empty());
    }

    #[test]
    fn mock_transport_replays_in_order() {
        let transport = MockTransport::new();
        transport.push_response(r#"{"rid":1}"#);
        transport.push_error(SyncError::AuthenticationExpired);
        assert_eq!(transport.pending(), 2);

        let body = transport.fetch_main_data(&MainDataRequest::new(0)).unwrap();
        assert_eq!(body, br#"{"rid":1}"#.to_vec());

        let result = transport.fetch_main_data(&MainDataRequest::new(1));
        assert!(matches!(result, Err(SyncError::AuthenticationExpired)));

        let result = transport.fetch_main_data(&MainDataRequest::new(1));
        assert!(matches!(result, Err(SyncError::Transport { .. })));

        assert_eq!(transport.requested_revisions(), vec![0, 1, 1]);
    }
}
