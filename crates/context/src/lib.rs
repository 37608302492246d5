//! Context sources for the Sitara session runner.
//!
//! Two external writers feed a live session:
//! - a structured **memory snapshot** (one JSON object, read wholesale),
//! - an append-only **update queue** (NDJSON, read positionally).
//!
//! This crate reads both, tracks per-source watermarks so unchanged data
//! is never re-processed, and renders prompt templates from the
//! stringified snapshot.

pub mod queue;
pub mod renderer;
pub mod store;

pub use queue::UpdateQueue;
pub use renderer::render;
pub use store::{ContextStore, SnapshotWatermark};
