//! Cached mirror of server state.

use crate::error::{SyncError, SyncResult};
use qbsync_protocol::{Category, Delta, ServerState, Torrent};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// The client-local mirror kept current by merging deltas.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    server_state: ServerState,
    torrents: BTreeMap<String, Torrent>,
    categories: BTreeMap<String, Category>,
    tags: BTreeSet<String>,
    trackers: BTreeMap<String, Vec<String>>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot holding exactly the collections of a full delta.
    pub fn from_full(delta: Delta) -> Self {
        Self {
            server_state: delta.server_metrics_patch,
            torrents: delta.torrents_upserted,
            categories: delta.categories_upserted,
            tags: delta.tags_added.into_iter().collect(),
            trackers: delta.trackers_upserted,
        }
    }

    /// Merges `delta` into this snapshot.
    ///
    /// A full delta replaces everything. An incremental delta applies each
    /// collection's removals before its upserts, so a key listed in both ends
    /// up holding the upserted value.
    pub fn apply(&mut self, delta: Delta) {
        if delta.is_full {
            *self = Self::from_full(delta);
            return;
        }

        for hash in &delta.torrents_removed {
            self.torrents.remove(hash);
        }
        self.torrents.extend(delta.torrents_upserted);

        for name in &delta.categories_removed {
            self.categories.remove(name);
        }
        self.categories.extend(delta.categories_upserted);

        for hash in &delta.trackers_removed {
            self.trackers.remove(hash);
        }
        self.trackers.extend(delta.trackers_upserted);

        for tag in &delta.tags_removed {
            self.tags.remove(tag);
        }
        self.tags.extend(delta.tags_added);

        self.server_state.apply_patch(&delta.server_metrics_patch);
    }

    /// Last known server metrics.
    pub fn server_state(&self) -> &ServerState {
        &self.server_state
    }

    /// All torrents keyed by hash.
    pub fn torrents(&self) -> &BTreeMap<String, Torrent> {
        &self.torrents
    }

    /// Looks up one torrent.
    pub fn torrent(&self, hash: &str) -> SyncResult<&Torrent> {
        self.torrents
            .get(hash)
            .ok_or_else(|| SyncError::NotFound(format!("torrent {}", hash)))
    }

    /// All categories keyed by name.
    pub fn categories(&self) -> &BTreeMap<String, Category> {
        &self.categories
    }

    /// Looks up one category.
    pub fn category(&self, name: &str) -> SyncResult<&Category> {
        self.categories
            .get(name)
            .ok_or_else(|| SyncError::NotFound(format!("category {}", name)))
    }

    /// All tags.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Tracker URLs of a torrent; empty when none are recorded.
    pub fn trackers(&self, hash: &str) -> &[String] {
        self.trackers.get(hash).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All tracker lists keyed by torrent hash.
    pub fn all_trackers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.trackers
    }

    /// Torrents assigned to `category`.
    pub fn torrents_in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Torrent)> + 'a {
        self.torrents
            .iter()
            .filter(move |(_, torrent)| torrent.category == category)
    }

    /// Torrents carrying `tag`.
    pub fn torrents_with_tag<'a>(
        &'a self,
        tag: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Torrent)> + 'a {
        self.torrents
            .iter()
            .filter(move |(_, torrent)| torrent.has_tag(tag))
    }

    /// Returns true if nothing has been merged yet.
    pub fn is_empty(&self) -> bool {
        self.server_state.is_empty()
            && self.torrents.is_empty()
            && self.categories.is_empty()
            && self.tags.is_empty()
            && self.trackers.is_empty()
    }
}
