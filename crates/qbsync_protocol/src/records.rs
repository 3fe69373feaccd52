//! Torrent and category records mirrored from the server.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A torrent as listed by `sync/maindata`.
///
/// Every field defaults when absent. Keys without a dedicated field are kept
/// in `extra` so nothing the server sent is lost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Torrent {
    /// Display name.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub name: String,
    /// Info hash.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub hash: String,
    /// Torrent state, e.g. `downloading` or `stalledUP`.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub state: String,
    /// Progress in `0.0..=1.0`.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub progress: f64,
    /// Size of the selected files in bytes.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub size: i64,
    /// Size of all files in bytes.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub total_size: i64,
    /// Download speed in bytes/s.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub dlspeed: i64,
    /// Upload speed in bytes/s.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub upspeed: i64,
    /// Downloaded bytes.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub downloaded: i64,
    /// Uploaded bytes.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub uploaded: i64,
    /// Bytes left to download.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub amount_left: i64,
    /// Category name, empty if none.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub category: String,
    /// Comma-separated tag list.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub tags: String,
    /// Save path.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub save_path: String,
    /// Content path.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub content_path: String,
    /// Magnet URI.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub magnet_uri: String,
    /// Current tracker.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub tracker: String,
    /// Unix time the torrent was added.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub added_on: i64,
    /// Unix time the torrent completed.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub completion_on: i64,
    /// Estimated seconds to completion.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub eta: i64,
    /// Share ratio.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub ratio: f64,
    /// Connected seeds.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub num_seeds: i64,
    /// Connected leechers.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub num_leechs: i64,
    /// Queue position, `0` or negative when not queued.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub priority: i64,
    /// Fields without a dedicated member, keyed by wire name.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Torrent {
    /// Creates a record with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Splits the comma-separated `tags` field.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    /// Returns true if the torrent carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_list().contains(&tag)
    }
}

/// A category definition.
///
/// Unknown keys are kept in `extra`, as for [`Torrent`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    /// Category name.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub name: String,
    /// Default save path for torrents in this category.
    #[serde(deserialize_with = "crate::de::null_as_default")]
    #[serde(rename = "savePath")]
    pub save_path: String,
    /// Fields without a dedicated member, keyed by wire name.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Category {
    /// Creates a category.
    pub fn new(name: impl Into<String>, save_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            save_path: save_path.into(),
            extra: BTreeMap::new(),
        }
    }
}
