//! Session orchestration for Sitara.
//!
//! Ties the pieces together: build the initiation payload from config and
//! context, run the websocket session, and keep it supplied with fresh
//! context through the periodic synchronizer.

pub mod init;
pub mod runner;
pub mod sync;
pub mod transcript_log;

pub use init::build_initiation_payload;
pub use runner::SessionRunner;
pub use sync::ContextSynchronizer;
