//! # qbsync Engine
//!
//! Incremental sync engine for the qBittorrent WebUI `sync/maindata`
//! endpoint.
//!
//! This crate provides:
//! - Revision cursor management
//! - Merging of full and incremental deltas into a cached [`Snapshot`]
//! - Read-only snapshot access that never observes a half-merged state
//! - Transport abstraction with an HTTP implementation and explicit session
//! - A blocking `reqwest` client behind the `reqwest` feature
//!
//! ## Architecture
//!
//! One poll is one round trip:
//! 1. Request changes since the current revision
//! 2. Decode the payload into a `Delta`
//! 3. Merge it into a copy of the snapshot
//! 4. Publish the copy and the new revision together
//!
//! ## Key Invariants
//!
//! - The cursor equals the revision of the last merged delta
//! - A failed poll changes nothing
//! - Metrics missing from an incremental delta keep their cached value
//! - Within one delta, removals are applied before upserts
//! - The engine never retries; callers decide

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod http;
#[cfg(feature = "reqwest")]
mod reqwest_client;
mod snapshot;
mod transport;

pub use config::ClientConfig;
pub use engine::{SyncEngine, SyncStats};
pub use error::{SyncError, SyncResult};
pub use http::{HttpClient, HttpResponse, HttpTransport, LoopbackClient, LoopbackServer, Session};
#[cfg(feature = "reqwest")]
pub use reqwest_client::ReqwestClient;
pub use snapshot::Snapshot;
pub use transport::{MockTransport, SyncTransport};
