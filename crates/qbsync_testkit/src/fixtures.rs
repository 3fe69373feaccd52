//! Response body builders.
//!
//! Builds `sync/maindata` bodies the way the server shapes them, so tests
//! exercise the real decoder instead of constructing deltas by hand.

use qbsync_protocol::{Category, MainData, ServerState, Torrent};
use serde_json::{Map, Value};

/// Builder for one `sync/maindata` response.
#[derive(Debug, Clone, Default)]
pub struct MainDataBuilder {
    data: MainData,
    metrics: Map<String, Value>,
}

impl MainDataBuilder {
    /// A full update at `rid`.
    pub fn full(rid: u64) -> Self {
        let mut builder = Self::default();
        builder.data.rid = Some(rid);
        builder.data.full_update = Some(true);
        builder
    }

    /// An incremental update at `rid`. Like the server, it omits
    /// `full_update`.
    pub fn incremental(rid: u64) -> Self {
        let mut builder = Self::default();
        builder.data.rid = Some(rid);
        builder
    }

    /// Adds or replaces a torrent.
    pub fn torrent(mut self, hash: &str, torrent: Torrent) -> Self {
        self.data.torrents.insert(hash.to_string(), torrent);
        self
    }

    /// Adds or replaces a torrent that only has a name.
    pub fn named_torrent(self, hash: &str, name: &str) -> Self {
        self.torrent(hash, Torrent::named(name))
    }

    /// Lists a torrent as removed.
    pub fn remove_torrent(mut self, hash: &str) -> Self {
        self.data.torrents_removed.push(hash.to_string());
        self
    }

    /// Adds or replaces a category.
    pub fn category(mut self, name: &str, save_path: &str) -> Self {
        self.data
            .categories
            .insert(name.to_string(), Category::new(name, save_path));
        self
    }

    /// Lists a category as removed.
    pub fn remove_category(mut self, name: &str) -> Self {
        self.data.categories_removed.push(name.to_string());
        self
    }

    /// Adds a tag.
    pub fn tag(mut self, tag: &str) -> Self {
        self.data.tags.push(tag.to_string());
        self
    }

    /// Lists a tag as removed.
    pub fn remove_tag(mut self, tag: &str) -> Self {
        self.data.tags_removed.push(tag.to_string());
        self
    }

    /// Sets the tracker list of a torrent.
    pub fn trackers(mut self, hash: &str, urls: &[&str]) -> Self {
        self.data.trackers.insert(
            hash.to_string(),
            urls.iter().map(|url| url.to_string()).collect(),
        );
        self
    }

    /// Lists a torrent's trackers as removed.
    pub fn remove_trackers(mut self, hash: &str) -> Self {
        self.data.trackers_removed.push(hash.to_string());
        self
    }

    /// Sets a `server_state` metric.
    pub fn metric(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.metrics.insert(name.to_string(), value.into());
        self
    }

    /// Finishes the body.
    pub fn build(mut self) -> MainData {
        if !self.metrics.is_empty() {
            let state: ServerState = serde_json::from_value(Value::Object(self.metrics))
                .expect("metric values must match their field types");
            self.data.server_state = Some(state);
        }
        self.data
    }

    /// Finishes the body as JSON bytes.
    pub fn to_json(self) -> Vec<u8> {
        self.build().to_vec().expect("Failed to serialize maindata")
    }
}
