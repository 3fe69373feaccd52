//! Server-wide metrics.
//!
//! The server only sends the metrics that changed since the requested
//! revision. Every field is therefore an `Option`: `None` means "not in this
//! payload", never "zero". Merging a patch only overwrites fields that are
//! present in it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Global transfer metrics reported under `server_state`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerState {
    /// `connected`, `firewalled` or `disconnected`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_status: Option<String>,
    /// Number of DHT nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dht_nodes: Option<i64>,
    /// Bytes downloaded this session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dl_info_data: Option<i64>,
    /// Current download speed in bytes/s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dl_info_speed: Option<i64>,
    /// Download rate limit in bytes/s, `0` for unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dl_rate_limit: Option<i64>,
    /// Bytes uploaded this session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_info_data: Option<i64>,
    /// Current upload speed in bytes/s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_info_speed: Option<i64>,
    /// Upload rate limit in bytes/s, `0` for unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_rate_limit: Option<i64>,
    /// Whether torrent queueing is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queueing: Option<bool>,
    /// Whether alternative speed limits are active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_alt_speed_limits: Option<bool>,
    /// Suggested WebUI refresh interval in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<i64>,
    /// Free space in the default save path, in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_space_on_disk: Option<i64>,
    /// All-time downloaded bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alltime_dl: Option<i64>,
    /// All-time uploaded bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alltime_ul: Option<i64>,
    /// Open peer connections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_peer_connections: Option<i64>,
    /// Metrics without a dedicated field, keyed by wire name.
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

macro_rules! patch_fields {
    ($target:expr, $patch:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$patch.$field {
                $target.$field = Some(value.clone());
            }
        )+
    };
}

impl ServerState {
    /// Overwrites every metric present in `patch`. Absent metrics keep
    /// their current value.
    pub fn apply_patch(&mut self, patch: &ServerState) {
        patch_fields!(
            self,
            patch,
            connection_status,
            dht_nodes,
            dl_info_data,
            dl_info_speed,
            dl_rate_limit,
            up_info_data,
            up_info_speed,
            up_rate_limit,
            queueing,
            use_alt_speed_limits,
            refresh_interval,
            free_space_on_disk,
            alltime_dl,
            alltime_ul,
            total_peer_connections,
        );

        for (name, value) in &patch.other {
            if !value.is_null() {
                self.other.insert(name.clone(), value.clone());
            }
        }
    }

    /// Drops open-ended metrics whose value is JSON `null`.
    pub(crate) fn without_nulls(mut self) -> Self {
        self.other.retain(|_, value| !value.is_null());
        self
    }

    /// All present metrics keyed by wire name.
    pub fn metrics(&self) -> BTreeMap<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        }
    }

    /// Looks up a single metric by wire name.
    pub fn metric(&self, name: &str) -> Option<Value> {
        self.metrics().remove(name)
    }

    /// Number of metrics present.
    pub fn len(&self) -> usize {
        self.metrics().len()
    }

    /// Returns true if no metric is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> ServerState {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn absent_fields_decode_as_none() {
        let state = parse(json!({ "dl_info_speed": 1024 }));
        assert_eq!(state.dl_info_speed, Some(1024));
        assert_eq!(state.up_info_speed, None);
        assert_eq!(state.queueing, None);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn zero_is_not_absent() {
        let state = parse(json!({ "dl_rate_limit": 0, "queueing": false }));
        assert_eq!(state.dl_rate_limit, Some(0));
        assert_eq!(state.queueing, Some(false));
    }

    #[test]
    fn patch_keeps_untouched_metrics() {
        let mut cached = parse(json!({ "dht_nodes": 1, "dl_info_speed": 2 }));
        let patch = parse(json!({ "dl_info_speed": 3 }));

        cached.apply_patch(&patch);

        assert_eq!(cached.dht_nodes, Some(1));
        assert_eq!(cached.dl_info_speed, Some(3));
    }

    #[test]
    fn unknown_metrics_are_kept_and_patched() {
        let mut cached = parse(json!({ "a": 1, "b": 2 }));
        let patch = parse(json!({ "b": 3 }));

        cached.apply_patch(&patch);

        assert_eq!(cached.metric("a"), Some(json!(1)));
        assert_eq!(cached.metric("b"), Some(json!(3)));
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn null_does_not_clobber() {
        let mut cached = parse(json!({ "connection_status": "connected", "extra": 5 }));
        let patch = parse(json!({ "connection_status": null, "extra": null })).without_nulls();

        cached.apply_patch(&patch);

        assert_eq!(cached.connection_status.as_deref(), Some("connected"));
        assert_eq!(cached.metric("extra"), Some(json!(5)));
    }

    #[test]
    fn metrics_lists_only_present_fields() {
        let state = parse(json!({ "connection_status": "firewalled", "alltime_ul": 10 }));
        let metrics = state.metrics();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics["connection_status"], json!("firewalled"));
        assert!(ServerState::default().is_empty());
    }
}
