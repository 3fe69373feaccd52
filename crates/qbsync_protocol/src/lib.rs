//! # qbsync Protocol
//!
//! Wire types and delta decoding for the qBittorrent `sync/maindata`
//! endpoint.
//!
//! This crate provides:
//! - `MainData`, the raw response body as the server sends it
//! - `Delta`, the decoded form the sync engine merges
//! - `ServerState`, a sparse set of server metrics where every field is
//!   individually present or absent
//! - `Torrent` and `Category` records
//! - `MainDataRequest` and endpoint constants
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod de;
mod delta;
mod error;
mod main_data;
mod records;
mod request;
mod server_state;

pub use delta::Delta;
pub use error::{DecodeError, DecodeResult};
pub use main_data::MainData;
pub use records::{Category, Torrent};
pub use request::{MainDataRequest, LOGIN_ENDPOINT, LOGIN_OK_BODY, MAINDATA_ENDPOINT};
pub use server_state::ServerState;
