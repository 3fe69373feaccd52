//! Property-based test generators using proptest.
//!
//! Keys are drawn from small pools so generated deltas upsert, remove and
//! re-add the same torrents, categories and tags across a sequence.

use proptest::prelude::*;
use qbsync_protocol::{Category, MainData, ServerState, Torrent};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Numeric metric names, typed and open-ended.
pub const METRIC_NAMES: &[&str] = &[
    "dht_nodes",
    "dl_info_speed",
    "up_info_speed",
    "alltime_dl",
    "total_peer_connections",
    "custom_a",
    "custom_b",
];

/// Strategy for torrent hashes from a pool of six.
pub fn hash_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("h[0-5]").expect("Invalid regex")
}

/// Strategy for tags from a pool of five.
pub fn tag_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("t[0-4]").expect("Invalid regex")
}

/// Strategy for category names from a pool of three.
pub fn category_name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["tv", "movies", "music"]).prop_map(str::to_string)
}

/// Strategy for torrent records.
pub fn torrent_strategy() -> impl Strategy<Value = Torrent> {
    (
        prop::string::string_regex("[A-Z][a-z]{0,6}").expect("Invalid regex"),
        prop::sample::select(vec!["downloading", "stalledUP", "pausedDL", "queuedDL"]),
        prop::sample::select(vec![0.0, 0.25, 0.5, 0.75, 1.0]),
        0i64..1_000_000,
    )
        .prop_map(|(name, state, progress, size)| Torrent {
            name,
            state: state.to_string(),
            progress,
            size,
            ..Torrent::default()
        })
}

/// Strategy for a sparse metrics patch.
pub fn server_state_strategy() -> impl Strategy<Value = ServerState> {
    prop::collection::btree_map(prop::sample::select(METRIC_NAMES), 0i64..10_000, 0..5).prop_map(
        |metrics| {
            let map: Map<String, Value> = metrics
                .into_iter()
                .map(|(name, value)| (name.to_string(), Value::from(value)))
                .collect();
            serde_json::from_value(Value::Object(map)).expect("numeric metrics always decode")
        },
    )
}

fn body_strategy() -> impl Strategy<Value = MainData> {
    (
        prop::option::of(server_state_strategy()),
        prop::collection::btree_map(hash_strategy(), torrent_strategy(), 0..4),
        prop::collection::vec(hash_strategy(), 0..3),
        prop::collection::btree_map(category_name_strategy(), "/[a-z]{1,6}", 0..2),
        prop::collection::vec(category_name_strategy(), 0..2),
        prop::collection::vec(tag_strategy(), 0..3),
        prop::collection::vec(tag_strategy(), 0..3),
        prop::collection::btree_map(
            hash_strategy(),
            prop::collection::vec("udp://[a-z]{1,5}", 0..3),
            0..3,
        ),
        prop::collection::vec(hash_strategy(), 0..2),
    )
        .prop_map(
            |(
                server_state,
                torrents,
                torrents_removed,
                categories,
                categories_removed,
                tags,
                tags_removed,
                trackers,
                trackers_removed,
            )| MainData {
                rid: None,
                full_update: None,
                server_state,
                torrents,
                torrents_removed,
                categories: categories
                    .into_iter()
                    .map(|(name, path): (String, String)| {
                        let category = Category::new(name.clone(), path);
                        (name, category)
                    })
                    .collect::<BTreeMap<_, _>>(),
                categories_removed,
                tags,
                tags_removed,
                trackers,
                trackers_removed,
            },
        )
}

fn into_full(mut data: MainData, rid: u64) -> MainData {
    data.rid = Some(rid);
    data.full_update = Some(true);
    data.torrents_removed.clear();
    data.categories_removed.clear();
    data.tags_removed.clear();
    data.trackers_removed.clear();
    data
}

/// Strategy for a full update at `rid`, with no removal lists.
pub fn full_main_data_strategy(rid: u64) -> impl Strategy<Value = MainData> {
    body_strategy().prop_map(move |data| into_full(data, rid))
}

/// Strategy for a polling session: a full update followed by incremental
/// updates with non-decreasing revisions.
pub fn main_data_sequence_strategy(
    min_incremental: usize,
    max_incremental: usize,
) -> impl Strategy<Value = Vec<MainData>> {
    (
        1u64..5,
        body_strategy(),
        prop::collection::vec((0u64..3, body_strategy()), min_incremental..max_incremental),
    )
        .prop_map(|(first_rid, first, rest)| {
            let mut sequence = Vec::with_capacity(rest.len() + 1);
            sequence.push(into_full(first, first_rid));

            let mut rid = first_rid;
            for (step, mut data) in rest {
                rid += step;
                data.rid = Some(rid);
                sequence.push(data);
            }
            sequence
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
