//! HTTP transport implementation.
//!
//! This module provides an HTTP-based transport for the sync engine.
//! The actual HTTP client is abstracted via a trait to allow different
//! implementations (reqwest, ureq, hyper, etc.). Authentication state lives
//! in an explicit [`Session`] that callers create and may share.

use crate::config::ClientConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::SyncTransport;
use parking_lot::RwLock;
use qbsync_protocol::{MainDataRequest, LOGIN_ENDPOINT, LOGIN_OK_BODY, MAINDATA_ENDPOINT};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const SESSION_COOKIE: &str = "SID";

/// A response as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw `Set-Cookie` header values.
    pub set_cookie: Vec<String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with no cookies.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            set_cookie: Vec::new(),
            body: body.into(),
        }
    }

    /// Adds a `Set-Cookie` header value.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.set_cookie.push(cookie.into());
        self
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport.
pub trait HttpClient: Send + Sync {
    /// Sends an `application/x-www-form-urlencoded` POST, attaching `cookie`
    /// as the `Cookie` header when present. The request must fail once
    /// `timeout` has elapsed.
    fn post_form(
        &self,
        url: &str,
        form: &[(&str, String)],
        cookie: Option<&str>,
        timeout: Duration,
    ) -> Result<HttpResponse, String>;

    /// Checks if the client is connected/healthy.
    fn is_healthy(&self) -> bool;
}

/// Authentication state for one WebUI login.
///
/// Holds the `SID` cookie. Credentials are never kept.
#[derive(Debug, Default)]
pub struct Session {
    sid: RwLock<Option<String>>,
}

impl Session {
    /// Creates an unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session from a known `SID`.
    pub fn with_sid(sid: impl Into<String>) -> Self {
        Self {
            sid: RwLock::new(Some(sid.into())),
        }
    }

    /// Current `SID`, if any.
    pub fn sid(&self) -> Option<String> {
        self.sid.read().clone()
    }

    /// Returns true if a `SID` is held.
    pub fn is_authenticated(&self) -> bool {
        self.sid.read().is_some()
    }

    /// Value for the `Cookie` request header.
    pub fn cookie_header(&self) -> Option<String> {
        self.sid
            .read()
            .as_ref()
            .map(|sid| format!("{}={}", SESSION_COOKIE, sid))
    }

    /// Forgets the `SID`.
    pub fn clear(&self) {
        *self.sid.write() = None;
    }

    /// Stores the `SID` from `Set-Cookie` headers. Returns true if one was found.
    fn absorb(&self, set_cookie: &[String]) -> bool {
        let sid = set_cookie.iter().find_map(|header| {
            let pair = header.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            (name.trim() == SESSION_COOKIE).then(|| value.trim().to_string())
        });

        match sid {
            Some(sid) => {
                *self.sid.write() = Some(sid);
                true
            }
            None => false,
        }
    }
}

/// HTTP-based sync transport.
///
/// Uses form-encoded request bodies and JSON responses.
pub struct HttpTransport<C: HttpClient> {
    config: ClientConfig,
    client: C,
    session: Arc<Session>,
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport bound to `session`.
    pub fn new(config: ClientConfig, client: C, session: Arc<Session>) -> Self {
        Self {
            config,
            client,
            session,
            connected: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the session.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Logs in and stores the returned `SID` in the session.
    pub fn login(&self, username: &str, password: &str) -> SyncResult<()> {
        let form = [
            ("username", username.to_string()),
            ("password", password.to_string()),
        ];
        let response = self.post(LOGIN_ENDPOINT, &form, None)?;

        match response.status {
            200 => {}
            401 | 403 => {
                return Err(SyncError::AuthenticationFailed(format!(
                    "login rejected with status {}",
                    response.status
                )))
            }
            status => return Err(SyncError::UnexpectedStatus { status }),
        }

        let body = String::from_utf8_lossy(&response.body);
        if body.trim() != LOGIN_OK_BODY {
            return Err(SyncError::AuthenticationFailed(body.into_owned()));
        }

        if !self.session.absorb(&response.set_cookie) {
            // WebUI instances with authentication bypass answer without a cookie.
            tracing::debug!("login accepted without a session cookie");
        }
        tracing::info!(url = %self.config.base_url, "logged in to WebUI");
        Ok(())
    }

    fn post(
        &self,
        endpoint: &str,
        form: &[(&str, String)],
        cookie: Option<&str>,
    ) -> SyncResult<HttpResponse> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }

        let url = self.config.endpoint_url(endpoint);
        let response = self
            .client
            .post_form(&url, form, cookie, self.config.timeout)
            .map_err(|e| {
                *self.last_error.write() = Some(e.clone());
                SyncError::transport_retryable(e)
            })?;

        *self.last_error.write() = None;
        Ok(response)
    }
}

impl<C: HttpClient> SyncTransport for HttpTransport<C> {
    fn fetch_main_data(&self, request: &MainDataRequest) -> SyncResult<Vec<u8>> {
        let cookie = self.session.cookie_header();
        let response = self.post(MAINDATA_ENDPOINT, &request.form_fields(), cookie.as_deref())?;

        match response.status {
            _ if response.is_success() => Ok(response.body),
            401 | 403 => {
                self.session.clear();
                Err(SyncError::AuthenticationExpired)
            }
            status => Err(SyncError::UnexpectedStatus { status }),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.client.is_healthy()
    }

    fn close(&self) -> SyncResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// A loopback HTTP client that routes requests directly to an in-process
/// WebUI stand-in.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Returns the server.
    pub fn server(&self) -> &S {
        &self.server
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer: Send + Sync {
    /// Handles a POST to `path` (relative to `api/v2/`).
    fn handle_post(
        &self,
        path: &str,
        form: &[(&str, String)],
        cookie: Option<&str>,
    ) -> HttpResponse;
}

impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    fn post_form(
        &self,
        url: &str,
        form: &[(&str, String)],
        cookie: Option<&str>,
        _timeout: Duration,
    ) -> Result<HttpResponse, String> {
        let path = url
            .find("/api/v2/")
            .map(|i| &url[i + "/api/v2/".len()..])
            .unwrap_or(url);

        Ok(self.server.handle_post(path, form, cookie))
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestClient {
        response: RwLock<Option<HttpResponse>>,
        seen: RwLock<Vec<(String, Vec<(String, String)>, Option<String>)>>,
        timeouts: RwLock<Vec<Duration>>,
        healthy: AtomicBool,
    }

    impl TestClient {
        fn new() -> Self {
            Self {
                response: RwLock::new(None),
                seen: RwLock::new(Vec::new()),
                timeouts: RwLock::new(Vec::new()),
                healthy: AtomicBool::new(true),
            }
        }

        fn set_response(&self, response: HttpResponse) {
            *self.response.write() = Some(response);
        }
    }

    impl HttpClient for TestClient {
        fn post_form(
            &self,
            url: &str,
            form: &[(&str, String)],
            cookie: Option<&str>,
            timeout: Duration,
        ) -> Result<HttpResponse, String> {
            self.timeouts.write().push(timeout);
            self.seen.write().push((
                url.to_string(),
                form.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                cookie.map(str::to_string),
            ));
            self.response
                .read()
                .clone()
                .ok_or_else(|| "connection refused".into())
        }

        fn is_healthy(&self) -> bool {
            self.healthy.load(Ordering::SeqCst)
        }
    }

    fn transport(client: TestClient) -> HttpTransport<TestClient> {
        HttpTransport::new(
            ClientConfig::new("http://qbt.local:8080"),
            client,
            Arc::new(Session::new()),
        )
    }

    #[test]
    fn transport_creation() {
        let transport = transport(TestClient::new());
        assert_eq!(transport.config().api_url(), "http://qbt.local:8080/api/v2/");
        assert!(transport.is_connected());
        assert!(!transport.session().is_authenticated());
    }

    #[test]
    fn transport_disconnect() {
        let transport = transport(TestClient::new());
        transport.close().unwrap();
        assert!(!transport.is_connected());

        let result = transport.fetch_main_data(&MainDataRequest::new(0));
        assert!(matches!(result, Err(SyncError::NotConnected)));
    }

    #[test]
    fn transport_unhealthy_client() {
        let client = TestClient::new();
        client.healthy.store(false, Ordering::SeqCst);
        assert!(!transport(client).is_connected());
    }

    #[test]
    fn login_stores_sid() {
        let client = TestClient::new();
        client.set_response(
            HttpResponse::new(200, "Ok.").with_cookie("SID=abc123; HttpOnly; path=/"),
        );
        let transport = transport(client);

        transport.login("admin", "adminadmin").unwrap();

        assert_eq!(transport.session().sid().as_deref(), Some("abc123"));
        let seen = transport.client.seen.read();
        assert_eq!(seen[0].0, "http://qbt.local:8080/api/v2/auth/login");
        assert_eq!(seen[0].1[0], ("username".to_string(), "admin".to_string()));
        assert_eq!(seen[0].2, None);
    }

    #[test]
    fn login_rejects_fails_body() {
        let client = TestClient::new();
        client.set_response(HttpResponse::new(200, "Fails."));
        let transport = transport(client);

        let err = transport.login("admin", "wrong").unwrap_err();
        assert!(matches!(err, SyncError::AuthenticationFailed(ref body) if body == "Fails."));
        assert!(!transport.session().is_authenticated());
    }

    #[test]
    fn login_banned_status() {
        let client = TestClient::new();
        client.set_response(HttpResponse::new(403, "Your IP address has been banned"));
        let err = transport(client).login("admin", "x").unwrap_err();
        assert!(matches!(err, SyncError::AuthenticationFailed(_)));
    }

    #[test]
    fn fetch_sends_rid_and_cookie() {
        let client = TestClient::new();
        client.set_response(HttpResponse::new(200, r#"{"rid":5}"#));
        let transport = HttpTransport::new(
            ClientConfig::new("http://qbt.local:8080/"),
            client,
            Arc::new(Session::with_sid("s1")),
        );

        let body = transport.fetch_main_data(&MainDataRequest::new(4)).unwrap();
        assert_eq!(body, br#"{"rid":5}"#.to_vec());

        let seen = transport.client.seen.read();
        assert_eq!(seen[0].0, "http://qbt.local:8080/api/v2/sync/maindata");
        assert_eq!(seen[0].1, vec![("rid".to_string(), "4".to_string())]);
        assert_eq!(seen[0].2.as_deref(), Some("SID=s1"));
    }

    #[test]
    fn forbidden_expires_session() {
        let client = TestClient::new();
        client.set_response(HttpResponse::new(403, "Forbidden"));
        let session = Arc::new(Session::with_sid("stale"));
        let transport = HttpTransport::new(ClientConfig::default(), client, Arc::clone(&session));

        let result = transport.fetch_main_data(&MainDataRequest::new(1));
        assert!(matches!(result, Err(SyncError::AuthenticationExpired)));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn other_status_is_unexpected() {
        let client = TestClient::new();
        client.set_response(HttpResponse::new(500, ""));
        let result = transport(client).fetch_main_data(&MainDataRequest::new(1));
        assert!(matches!(result, Err(SyncError::UnexpectedStatus { status: 500 })));
    }

    #[test]
    fn client_failure_is_retryable_transport_error() {
        let transport = transport(TestClient::new());
        let err = transport.fetch_main_data(&MainDataRequest::new(0)).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(transport.last_error().as_deref(), Some("connection refused"));
        assert!(transport.is_connected());
    }

    #[test]
    fn requests_carry_configured_timeout() {
        let client = TestClient::new();
        client.set_response(HttpResponse::new(200, "Ok.").with_cookie("SID=t"));
        let transport = HttpTransport::new(
            ClientConfig::default().with_timeout(Duration::from_secs(7)),
            client,
            Arc::new(Session::new()),
        );

        transport.login("admin", "adminadmin").unwrap();
        transport.fetch_main_data(&MainDataRequest::new(0)).unwrap();

        assert_eq!(
            *transport.client.timeouts.read(),
            vec![Duration::from_secs(7), Duration::from_secs(7)]
        );
    }

    #[test]
    fn session_ignores_other_cookies() {
        let session = Session::new();
        assert!(!session.absorb(&["lang=en; path=/".to_string()]));
        assert!(session.absorb(&["lang=en".to_string(), "SID=xyz".to_string()]));
        assert_eq!(session.cookie_header().as_deref(), Some("SID=xyz"));
        session.clear();
        assert_eq!(session.cookie_header(), None);
    }
}
