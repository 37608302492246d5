//! CLI subcommand implementations.

pub mod enqueue;
pub mod onboard;
pub mod run;
