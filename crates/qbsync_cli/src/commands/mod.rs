//! CLI command implementations.

pub mod decode;
pub mod replay;
pub mod watch;
