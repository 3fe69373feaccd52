//! Request side of the sync endpoint.

/// Path of the sync endpoint, relative to the `api/v2/` root.
pub const MAINDATA_ENDPOINT: &str = "sync/maindata";

/// Path of the login endpoint, relative to the `api/v2/` root.
pub const LOGIN_ENDPOINT: &str = "auth/login";

/// Body the server returns for an accepted login.
pub const LOGIN_OK_BODY: &str = "Ok.";

/// A `sync/maindata` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainDataRequest {
    /// Last revision the client has merged. `0` asks for a full snapshot.
    pub rid: u64,
}

impl MainDataRequest {
    /// Creates a request for changes since `rid`.
    pub fn new(rid: u64) -> Self {
        Self { rid }
    }

    /// Returns true if this request asks for a full snapshot.
    pub fn is_initial(&self) -> bool {
        self.rid == 0
    }

    /// Form fields for an `application/x-www-form-urlencoded` body.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![("rid", self.rid.to_string())]
    }
}
