//! Raw `sync/maindata` response body.

use crate::records::{Category, Torrent};
use crate::server_state::ServerState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The response body exactly as the server shapes it.
///
/// Collections the server omits decode as empty. `rid` and `full_update`
/// stay optional so the decoder can tell "absent" from a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainData {
    /// Revision of this response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rid: Option<u64>,
    /// Whether this response is a complete snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_update: Option<bool>,
    /// Changed server metrics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_state: Option<ServerState>,
    /// Added or changed torrents keyed by hash.
    #[serde(
        deserialize_with = "crate::de::null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub torrents: BTreeMap<String, Torrent>,
    /// Hashes of removed torrents.
    #[serde(
        deserialize_with = "crate::de::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub torrents_removed: Vec<String>,
    /// Added or changed categories keyed by name.
    #[serde(
        deserialize_with = "crate::de::null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub categories: BTreeMap<String, Category>,
    /// Names of removed categories.
    #[serde(
        deserialize_with = "crate::de::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub categories_removed: Vec<String>,
    /// Added tags.
    #[serde(
        deserialize_with = "crate::de::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
    /// Removed tags.
    #[serde(
        deserialize_with = "crate::de::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags_removed: Vec<String>,
    /// Tracker URLs keyed by torrent hash.
    #[serde(
        deserialize_with = "crate::de::null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub trackers: BTreeMap<String, Vec<String>>,
    /// Hashes whose tracker lists were dropped.
    #[serde(
        deserialize_with = "crate::de::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub trackers_removed: Vec<String>,
}

impl MainData {
    /// Parses a response body.
    ///
    /// The body must be a JSON object.
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        crate::de::object_from_slice(payload)
    }

    /// Serializes to a response body.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
