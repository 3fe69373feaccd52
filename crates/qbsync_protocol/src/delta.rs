//! Decoded delta for one polling step.

use crate::error::{DecodeError, DecodeResult};
use crate::main_data::MainData;
use crate::records::{Category, Torrent};
use crate::request::MainDataRequest;
use crate::server_state::ServerState;
use std::collections::{BTreeMap, BTreeSet};

/// Changes between the client's revision and `revision`.
///
/// A full delta carries complete collections and empty removal sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    /// Cursor value after this delta is merged.
    pub revision: u64,
    /// Whether the cache must be replaced rather than patched.
    pub is_full: bool,
    /// Metrics present in this payload.
    pub server_metrics_patch: ServerState,
    /// Torrents to insert or replace, keyed by hash.
    pub torrents_upserted: BTreeMap<String, Torrent>,
    /// Torrent hashes to drop.
    pub torrents_removed: BTreeSet<String>,
    /// Categories to insert or replace, keyed by name.
    pub categories_upserted: BTreeMap<String, Category>,
    /// Category names to drop.
    pub categories_removed: BTreeSet<String>,
    /// Tags to add.
    pub tags_added: Vec<String>,
    /// Tags to drop.
    pub tags_removed: BTreeSet<String>,
    /// Tracker lists to replace, keyed by torrent hash.
    pub trackers_upserted: BTreeMap<String, Vec<String>>,
    /// Torrent hashes whose tracker list is dropped.
    pub trackers_removed: BTreeSet<String>,
}

impl Delta {
    /// Decodes a raw `sync/maindata` body that answered a request made with
    /// `prior_revision`.
    pub fn decode(payload: &[u8], prior_revision: u64) -> DecodeResult<Self> {
        let data = MainData::from_slice(payload)?;
        Self::from_main_data(data, prior_revision)
    }

    /// Builds a delta from an already parsed body.
    pub fn from_main_data(data: MainData, prior_revision: u64) -> DecodeResult<Self> {
        let revision = data.rid.ok_or(DecodeError::MissingRevision)?;
        if revision < prior_revision {
            return Err(DecodeError::RevisionRegression {
                prior: prior_revision,
                received: revision,
            });
        }

        // The first response is always complete, whether or not it says so.
        let is_full = data
            .full_update
            .unwrap_or_else(|| MainDataRequest::new(prior_revision).is_initial());

        let mut delta = Delta {
            revision,
            is_full,
            server_metrics_patch: data.server_state.unwrap_or_default().without_nulls(),
            torrents_upserted: data.torrents,
            categories_upserted: data.categories,
            tags_added: data.tags,
            trackers_upserted: data.trackers,
            ..Delta::default()
        };

        if is_full {
            let dropped = data.torrents_removed.len()
                + data.categories_removed.len()
                + data.tags_removed.len()
                + data.trackers_removed.len();
            if dropped > 0 {
                tracing::debug!(revision, dropped, "ignoring removals in full update");
            }
        } else {
            delta.torrents_removed = data.torrents_removed.into_iter().collect();
            delta.categories_removed = data.categories_removed.into_iter().collect();
            delta.tags_removed = data.tags_removed.into_iter().collect();
            delta.trackers_removed = data.trackers_removed.into_iter().collect();
        }

        Ok(delta)
    }

    /// Returns true if merging this delta changes nothing but the cursor.
    pub fn is_empty(&self) -> bool {
        !self.is_full && self.change_count() == 0
    }

    /// Number of individual changes carried.
    pub fn change_count(&self) -> usize {
        self.server_metrics_patch.len()
            + self.torrents_upserted.len()
            + self.torrents_removed.len()
            + self.categories_upserted.len()
            + self.categories_removed.len()
            + self.tags_added.len()
            + self.tags_removed.len()
            + self.trackers_upserted.len()
            + self.trackers_removed.len()
    }
}
