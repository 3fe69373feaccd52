//! # qbsync Testkit
//!
//! Test utilities for qbsync.
//!
//! This crate provides:
//! - Builders for `sync/maindata` response bodies
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qbsync_testkit::prelude::*;
//!
//! let body = MainDataBuilder::full(1).named_torrent("h1", "A").tag("x").to_json();
//! transport.push_response(body);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
