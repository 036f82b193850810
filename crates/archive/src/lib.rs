//! Archive - Catalog Search Core
//!
//! Client-side search for the Arochea archives: record
//! normalization, an in-memory fuzzy index, the query orchestrator
//! state machine, and the terminal presentation layer, plus the HTTP
//! client for the archive API.

pub mod client;
pub mod index;
pub mod orchestrator;
pub mod record;
pub mod render;
pub mod runtime;
pub mod similarity;
