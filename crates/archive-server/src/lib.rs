//! Archive Server - API bridge to the upstream tabular source
//!
//! Serves the catalog tables to the archive clients and runs the
//! server-side fallback search (exact formula pass, related-record
//! expansion, edit-distance rescue) against the upstream source.

pub mod config;
pub mod search;
pub mod server;
pub mod upstream;
