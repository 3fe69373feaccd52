//! Blocking `reqwest` implementation of [`HttpClient`].

use crate::error::{SyncError, SyncResult};
use crate::http::{HttpClient, HttpResponse};
use reqwest::blocking::Client;
use reqwest::header::{COOKIE, SET_COOKIE};
use std::time::Duration;

/// HTTP client backed by `reqwest::blocking`.
///
/// No cookie jar is kept. The [`crate::Session`] owns the `SID` and the
/// transport hands it over per request, so `Set-Cookie` values are returned
/// raw in [`HttpResponse::set_cookie`].
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Builds a client with reqwest's defaults.
    pub fn new() -> SyncResult<Self> {
        let client = Client::builder().build().map_err(|e| {
            SyncError::transport_fatal(format!("failed to build HTTP client: {}", e))
        })?;
        Ok(Self { client })
    }

    /// Wraps an already configured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpClient for ReqwestClient {
    fn post_form(
        &self,
        url: &str,
        form: &[(&str, String)],
        cookie: Option<&str>,
        timeout: Duration,
    ) -> Result<HttpResponse, String> {
        let mut request = self.client.post(url).form(form).timeout(timeout);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let set_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = response.bytes().map_err(|e| e.to_string())?.to_vec();

        tracing::trace!(url, status, bytes = body.len(), "http response");
        Ok(HttpResponse {
            status,
            set_cookie,
            body,
        })
    }

    fn is_healthy(&self) -> bool {
        true
    }
}
